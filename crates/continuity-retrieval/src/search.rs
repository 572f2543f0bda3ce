//! Relevance search capability contract.
//!
//! Ranking lives outside this core; implementations return their best
//! matches first and this crate only renders them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// A closed conversation surfaced by the relevance search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelatedConversation {
    /// Conversation title, if one was recorded at close time
    pub title: Option<String>,
    /// Close-time summary
    pub summary: Option<String>,
    /// Decisions recorded during the conversation
    #[serde(default)]
    pub decisions: Vec<String>,
}

/// External relevance search over closed conversations.
#[async_trait]
pub trait RelevanceSearch: Send + Sync {
    /// Up to `limit` conversations relevant to `query`, best match first.
    async fn find_related(
        &self,
        tenant_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RelatedConversation>, RetrievalError>;
}

/// Search that never finds anything. Used when no relevance backend is
/// wired; the retriever then always produces an empty recall block.
pub struct NoRelevanceSearch;

#[async_trait]
impl RelevanceSearch for NoRelevanceSearch {
    async fn find_related(
        &self,
        _tenant_id: &str,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<RelatedConversation>, RetrievalError> {
        Ok(Vec::new())
    }
}
