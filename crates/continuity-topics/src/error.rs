//! Topic store error types.

use thiserror::Error;

/// Errors that can occur during topic operations.
#[derive(Debug, Error)]
pub enum TopicsError {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] continuity_storage::StorageError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Topic not found
    #[error("Topic not found: {0}")]
    NotFound(String),

    /// Caller-supplied input was invalid
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
