//! Retrieval error types.

use thiserror::Error;

/// Errors that can occur during context retrieval.
///
/// These never escape `ContextBuilder::build_topic_context`; they exist so
/// capability implementations have something precise to return.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Relevance search capability failed
    #[error("Relevance search failed: {0}")]
    Search(String),

    /// Relevance search did not answer in time
    #[error("Relevance search timed out")]
    Timeout,
}
