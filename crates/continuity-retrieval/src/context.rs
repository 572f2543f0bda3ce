//! Recall block rendering under a token budget.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use continuity_types::RetrievalConfig;

use crate::search::{RelatedConversation, RelevanceSearch};

/// Header line opening every non-empty recall block. Counted against the
/// budget like any entry.
const HEADER: &str = "Relevant past conversations:";

/// Estimate token cost of a string: one token per four characters,
/// rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Renders recall blocks from relevance search results.
pub struct ContextBuilder {
    search: Arc<dyn RelevanceSearch>,
    config: RetrievalConfig,
}

impl ContextBuilder {
    pub fn new(search: Arc<dyn RelevanceSearch>, config: RetrievalConfig) -> Self {
        Self { search, config }
    }

    /// Build a recall block with the configured default budget.
    pub async fn build_topic_context(&self, tenant_id: &str, user_message: &str) -> String {
        self.build_topic_context_with_budget(tenant_id, user_message, self.config.token_budget)
            .await
    }

    /// Build a recall block for prompt injection.
    ///
    /// Retrieves up to the configured number of relevant conversations,
    /// renders each as a recall line, and stops appending once the running
    /// token total would exceed `token_budget`. Returns an empty string when
    /// the input is blank, nothing relevant is found, or the search fails;
    /// this function never errors outward.
    pub async fn build_topic_context_with_budget(
        &self,
        tenant_id: &str,
        user_message: &str,
        token_budget: usize,
    ) -> String {
        if user_message.trim().is_empty() {
            return String::new();
        }

        let timeout = Duration::from_millis(self.config.search_timeout_ms);
        let related = match tokio::time::timeout(
            timeout,
            self.search
                .find_related(tenant_id, user_message, self.config.search_limit),
        )
        .await
        {
            Ok(Ok(related)) => related,
            Ok(Err(e)) => {
                warn!(tenant_id = %tenant_id, error = %e, "Relevance search failed");
                return String::new();
            }
            Err(_) => {
                warn!(tenant_id = %tenant_id, "Relevance search timed out");
                return String::new();
            }
        };

        render_block(&related, token_budget)
    }
}

/// Render a recall line for one conversation, or `None` when it carries
/// neither title nor summary.
fn render_entry(related: &RelatedConversation) -> Option<String> {
    let mut line = match (&related.title, &related.summary) {
        (Some(title), Some(summary)) => format!("- {}: {}", title, summary),
        (None, Some(summary)) => format!("- {}", summary),
        (Some(title), None) => format!("- {}", title),
        (None, None) => return None,
    };
    if !related.decisions.is_empty() {
        line.push_str(" Decisions: ");
        line.push_str(&related.decisions.join("; "));
    }
    Some(line)
}

fn render_block(related: &[RelatedConversation], token_budget: usize) -> String {
    let mut spent = estimate_tokens(HEADER);
    let mut lines = Vec::new();

    for entry in related {
        let Some(line) = render_entry(entry) else {
            continue;
        };
        let cost = estimate_tokens(&line);
        if spent + cost > token_budget {
            debug!(
                spent = spent,
                cost = cost,
                budget = token_budget,
                "Recall block budget exhausted"
            );
            break;
        }
        spent += cost;
        lines.push(line);
    }

    if lines.is_empty() {
        return String::new();
    }

    let mut block = String::from(HEADER);
    for line in lines {
        block.push('\n');
        block.push_str(&line);
    }
    block
}
