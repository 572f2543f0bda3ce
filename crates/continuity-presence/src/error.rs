//! Presence and scheduler error types.

use thiserror::Error;

/// Errors that can occur in presence tracking and scheduling.
#[derive(Debug, Error)]
pub enum PresenceError {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] continuity_storage::StorageError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Cron expression was not valid
    #[error("Invalid cron expression: {0}")]
    InvalidCron(String),

    /// Timezone string was not a recognized IANA name
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Scheduler was already started
    #[error("Scheduler is already running")]
    AlreadyRunning,

    /// Scheduler was not started
    #[error("Scheduler is not running")]
    NotRunning,

    /// Underlying scheduler failure
    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

impl From<tokio_cron_scheduler::JobSchedulerError> for PresenceError {
    fn from(e: tokio_cron_scheduler::JobSchedulerError) -> Self {
        PresenceError::Scheduler(e.to_string())
    }
}
