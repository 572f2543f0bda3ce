//! The post-response boundary decider.
//!
//! Runs once per completed agent response, fire-and-forget. Reads the
//! recent message window, consults the classification capability, and
//! drives the conversation graph: extend on the same topic, close-and-chain
//! on a shift. Every failure is caught, logged, and swallowed; the session
//! is left exactly as it was and the next response retries.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use continuity_graph::{CloseRequest, ConversationGraph, CreateRequest, SessionStore};
use continuity_types::{BoundaryConfig, ConversationRelation, Message};

use crate::classify::{BoundaryClassifier, ConversationSnapshot};
use crate::error::EngineError;

/// What a boundary decision did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryOutcome {
    /// Not enough signal, or the capability was unavailable; nothing changed
    Skipped,
    /// No active conversation existed; one was started
    Started { conversation_id: String },
    /// The active conversation absorbed the window
    Extended { conversation_id: String, end_seq: u64 },
    /// Topic shift: the active conversation closed and a successor started
    Split {
        closed_id: String,
        started_id: String,
    },
}

/// Decides conversation boundaries after each agent response.
pub struct BoundaryDecider {
    graph: Arc<ConversationGraph>,
    sessions: Arc<dyn SessionStore>,
    classifier: Arc<dyn BoundaryClassifier>,
    config: BoundaryConfig,
}

impl BoundaryDecider {
    pub fn new(
        graph: Arc<ConversationGraph>,
        sessions: Arc<dyn SessionStore>,
        classifier: Arc<dyn BoundaryClassifier>,
        config: BoundaryConfig,
    ) -> Self {
        Self {
            graph,
            sessions,
            classifier,
            config,
        }
    }

    /// Entry point invoked after each agent response.
    ///
    /// Never fails: errors are logged and the session is left unchanged.
    pub async fn on_response_completed(&self, session_id: &str, tenant_id: &str) {
        match self.decide(session_id, tenant_id).await {
            Ok(outcome) => {
                debug!(
                    session_id = %session_id,
                    tenant_id = %tenant_id,
                    outcome = ?outcome,
                    "Boundary decision"
                );
            }
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    tenant_id = %tenant_id,
                    error = %e,
                    "Boundary decision failed; session left unchanged"
                );
            }
        }
    }

    /// Spawn the decision as a detached task.
    pub fn spawn_on_response_completed(self: &Arc<Self>, session_id: String, tenant_id: String) {
        let decider = self.clone();
        tokio::spawn(async move {
            decider.on_response_completed(&session_id, &tenant_id).await;
        });
    }

    /// The decision itself, with its outcome surfaced for callers that want
    /// to observe it (tests, the facade).
    pub async fn decide(
        &self,
        session_id: &str,
        tenant_id: &str,
    ) -> Result<BoundaryOutcome, EngineError> {
        let window = self
            .sessions
            .recent_messages(session_id, self.config.window_size)
            .await
            .map_err(EngineError::Graph)?;

        // Fewer than two messages is not enough signal for a judgment.
        if window.len() < 2 {
            return Ok(BoundaryOutcome::Skipped);
        }
        let Some(latest_seq) = window.last().map(|m| m.seq) else {
            return Ok(BoundaryOutcome::Skipped);
        };

        let Some(active) = self.graph.active_conversation(tenant_id, session_id)? else {
            // First sighting of this session: open a conversation over the
            // whole window.
            let start_seq = window.first().map(|m| m.seq).unwrap_or(latest_seq);
            let created = self
                .graph
                .create(tenant_id, CreateRequest::new(session_id, start_seq))?;
            return Ok(BoundaryOutcome::Started {
                conversation_id: created.conversation_id,
            });
        };

        let snapshot = ConversationSnapshot::from(&active);
        let timeout = Duration::from_millis(self.config.classify_timeout_ms);
        let verdict =
            match tokio::time::timeout(timeout, self.classifier.classify(&window, &snapshot)).await
            {
                Ok(Ok(verdict)) => verdict,
                Ok(Err(e)) => {
                    warn!(session_id = %session_id, error = %e, "Classifier failed");
                    return Ok(BoundaryOutcome::Skipped);
                }
                Err(_) => {
                    warn!(session_id = %session_id, "Classifier timed out");
                    return Ok(BoundaryOutcome::Skipped);
                }
            };

        if verdict.same_topic {
            self.graph
                .advance_end(tenant_id, &active.conversation_id, latest_seq)?;
            return Ok(BoundaryOutcome::Extended {
                conversation_id: active.conversation_id,
                end_seq: latest_seq,
            });
        }

        // Topic shift: snapshot and close the active conversation, then
        // chain a successor starting at the instigating user message.
        let title = active
            .title
            .clone()
            .or(verdict.suggested_title)
            .unwrap_or_else(|| "Untitled".to_string());
        let tags = verdict.new_tags.unwrap_or_else(|| active.tags.clone());
        let summary = active
            .summary
            .clone()
            .unwrap_or_else(|| format!("Conversation about: {}", tags.join(", ")));

        let closed = self.graph.close(
            tenant_id,
            &active.conversation_id,
            CloseRequest {
                title: Some(title),
                summary: Some(summary),
                tags: Some(tags),
                end_seq: latest_seq.saturating_sub(1),
            },
        )?;

        let new_start = new_segment_start(&window, latest_seq);
        let created = self.graph.create(
            tenant_id,
            CreateRequest::new(session_id, new_start).with_relations(vec![
                ConversationRelation::continuation(closed.conversation_id.clone()),
            ]),
        )?;

        Ok(BoundaryOutcome::Split {
            closed_id: closed.conversation_id,
            started_id: created.conversation_id,
        })
    }
}

/// The new segment starts at the most recent user message in the window;
/// with none present, the latest message stands in.
fn new_segment_start(window: &[Message], latest_seq: u64) -> u64 {
    window
        .iter()
        .rev()
        .find(|m| m.is_user())
        .map(|m| m.seq)
        .unwrap_or(latest_seq)
}
