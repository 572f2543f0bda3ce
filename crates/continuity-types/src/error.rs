//! Shared error types.

use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config sources could not be read
    #[error("Failed to load configuration: {0}")]
    Load(String),

    /// Config contents did not match the expected shape
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}
