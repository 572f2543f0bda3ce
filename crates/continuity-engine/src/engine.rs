//! The in-process facade over the continuity core.
//!
//! Owns the wired-together stores and exposes the operations the
//! surrounding gateway calls: boundary decisions after responses, recall
//! blocks before prompts, activity recording on inbound messages, and the
//! periodic presence/decay evaluations the tick scheduler drives.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use continuity_graph::{ConversationGraph, SessionStore};
use continuity_presence::{EngagementPolicy, PresenceStore};
use continuity_retrieval::{ContextBuilder, RelevanceSearch};
use continuity_storage::Storage;
use continuity_topics::{DecayPolicy, TopicStore};
use continuity_types::{ContinuityConfig, PendingMessage, PresenceState};

use crate::boundary::{BoundaryDecider, BoundaryOutcome};
use crate::classify::BoundaryClassifier;
use crate::error::EngineError;

/// The wired continuity core.
pub struct ContinuityEngine {
    graph: Arc<ConversationGraph>,
    topics: Arc<TopicStore>,
    presence: Arc<PresenceStore>,
    policy: EngagementPolicy,
    context: ContextBuilder,
    decider: Arc<BoundaryDecider>,
    sessions: Arc<dyn SessionStore>,
    config: ContinuityConfig,
}

impl ContinuityEngine {
    /// Wire the core over an open storage handle and the three external
    /// capabilities.
    pub fn new(
        storage: Arc<Storage>,
        sessions: Arc<dyn SessionStore>,
        classifier: Arc<dyn BoundaryClassifier>,
        search: Arc<dyn RelevanceSearch>,
        config: ContinuityConfig,
    ) -> Self {
        let graph = Arc::new(ConversationGraph::new(storage.clone()));
        let topics = Arc::new(TopicStore::new(
            storage.clone(),
            DecayPolicy::new(config.topics.half_life_days),
        ));
        let presence = Arc::new(PresenceStore::new(storage));
        let policy = EngagementPolicy::from_config(
            config.presence.idle_threshold_hours,
            config.presence.engagement_threshold,
        );
        let context = ContextBuilder::new(search, config.retrieval.clone());
        let decider = Arc::new(BoundaryDecider::new(
            graph.clone(),
            sessions.clone(),
            classifier,
            config.boundary.clone(),
        ));

        Self {
            graph,
            topics,
            presence,
            policy,
            context,
            decider,
            sessions,
            config,
        }
    }

    /// Conversation graph operations.
    pub fn conversations(&self) -> &ConversationGraph {
        &self.graph
    }

    /// Topic store operations.
    pub fn topics(&self) -> &TopicStore {
        &self.topics
    }

    /// Presence state operations.
    pub fn presence(&self) -> &PresenceStore {
        &self.presence
    }

    /// The engagement policy in force.
    pub fn policy(&self) -> &EngagementPolicy {
        &self.policy
    }

    /// The session store the engine reads from.
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// The active configuration.
    pub fn config(&self) -> &ContinuityConfig {
        &self.config
    }

    /// Run the boundary decision for a completed response, inline.
    pub async fn on_response_completed(&self, session_id: &str, tenant_id: &str) {
        self.decider.on_response_completed(session_id, tenant_id).await;
    }

    /// Run the boundary decision as a detached task.
    pub fn spawn_response_completed(&self, session_id: String, tenant_id: String) {
        self.decider
            .spawn_on_response_completed(session_id, tenant_id);
    }

    /// Run the boundary decision and surface its outcome.
    pub async fn decide_boundary(
        &self,
        session_id: &str,
        tenant_id: &str,
    ) -> Result<BoundaryOutcome, EngineError> {
        self.decider.decide(session_id, tenant_id).await
    }

    /// Build the recall block injected ahead of the next prompt.
    pub async fn build_topic_context(&self, tenant_id: &str, user_message: &str) -> String {
        self.context.build_topic_context(tenant_id, user_message).await
    }

    /// Build a recall block under an explicit budget.
    pub async fn build_topic_context_with_budget(
        &self,
        tenant_id: &str,
        user_message: &str,
        token_budget: usize,
    ) -> String {
        self.context
            .build_topic_context_with_budget(tenant_id, user_message, token_budget)
            .await
    }

    /// Record tenant activity (called on every inbound message).
    pub fn record_activity(&self, tenant_id: &str) -> Result<PresenceState, EngineError> {
        Ok(self.presence.record_activity(tenant_id, Utc::now())?)
    }

    /// Evaluate one tenant for proactive contact.
    ///
    /// When the policy gates pass, a topic is drawn, a phrasing rendered,
    /// and the message queued on the tenant's pending list. Returns the
    /// queued message, if any.
    pub fn evaluate_presence(
        &self,
        tenant_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PendingMessage>, EngineError> {
        let Some(state) = self.presence.get(tenant_id)? else {
            return Ok(None);
        };

        let topics = self.topics.list(tenant_id)?;
        if !self.policy.should_initiate(&state, &topics, now) {
            return Ok(None);
        }

        let mut rng = rand::thread_rng();
        let Some(topic) = self.policy.select_topic(&topics, &mut rng) else {
            return Ok(None);
        };

        let message = PendingMessage {
            message: self.policy.format_initiation(topic, &mut rng),
            priority: 1,
            scheduled_for: now,
        };
        self.presence.push_pending(tenant_id, message.clone())?;
        info!(
            tenant_id = %tenant_id,
            topic = %topic.name,
            "Queued proactive message"
        );
        Ok(Some(message))
    }

    /// Evaluate every tenant with presence state. Per-tenant failures are
    /// logged and skipped; one broken tenant must not stall the tick.
    pub fn evaluate_all_tenants(&self, now: DateTime<Utc>) -> Result<u32, EngineError> {
        let mut initiated = 0;
        for tenant_id in self.presence.tenants()? {
            match self.evaluate_presence(&tenant_id, now) {
                Ok(Some(_)) => initiated += 1,
                Ok(None) => {}
                Err(e) => {
                    warn!(tenant_id = %tenant_id, error = %e, "Presence evaluation failed");
                }
            }
        }
        debug!(initiated = initiated, "Presence tick complete");
        Ok(initiated)
    }

    /// Apply frequency-weight decay across all tenants with topics.
    pub fn decay_all_topics(&self, now: DateTime<Utc>) -> Result<u32, EngineError> {
        let mut updated = 0;
        for tenant_id in self.topics.tenants()? {
            match self.topics.decay_frequency_weights(&tenant_id, now) {
                Ok(count) => updated += count,
                Err(e) => {
                    warn!(tenant_id = %tenant_id, error = %e, "Topic decay failed");
                }
            }
        }
        Ok(updated)
    }
}
