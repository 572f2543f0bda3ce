//! Engine error types.

use thiserror::Error;

/// Errors that can occur in the continuity engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Conversation graph failure
    #[error("Graph error: {0}")]
    Graph(#[from] continuity_graph::GraphError),

    /// Topic store failure
    #[error("Topics error: {0}")]
    Topics(#[from] continuity_topics::TopicsError),

    /// Presence store or scheduler failure
    #[error("Presence error: {0}")]
    Presence(#[from] continuity_presence::PresenceError),

    /// Classification capability failed or timed out
    #[error("Classification failed: {0}")]
    Classify(String),
}
