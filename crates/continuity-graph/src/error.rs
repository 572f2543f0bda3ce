//! Conversation graph error types.

use thiserror::Error;

/// Errors that can occur during conversation graph operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] continuity_storage::StorageError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Conversation not found
    #[error("Conversation not found: {0}")]
    NotFound(String),

    /// Operation requires an active conversation
    #[error("Conversation is not active: {0}")]
    NotActive(String),

    /// A concurrent creator won the active-marker swap
    #[error("Session already has an active conversation: {0}")]
    Conflict(String),

    /// Session store failure
    #[error("Session store error: {0}")]
    Session(String),

    /// Caller-supplied input was invalid
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
