//! Message type for session history.
//!
//! Messages are immutable records of conversation turns. Within a session
//! the `seq` field is unique and strictly increasing; it is the single
//! source of truth for ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of the message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// End-user input
    User,
    /// Agent response
    Assistant,
    /// System message
    System,
    /// Tool invocation or result
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// One turn in a session.
///
/// Immutable once written. `seq` is strictly increasing within the owning
/// session (gaps are allowed); conversations reference messages only by
/// `[start_seq, end_seq]` ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier (ULID string)
    pub message_id: String,

    /// Session this message belongs to
    pub session_id: String,

    /// Owning tenant
    pub tenant_id: String,

    /// Position within the session; strictly increasing
    pub seq: u64,

    /// Role of the author
    pub role: MessageRole,

    /// Message content
    pub text: String,

    /// When the message was produced
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message.
    pub fn new(
        message_id: String,
        session_id: String,
        tenant_id: String,
        seq: u64,
        role: MessageRole,
        text: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            message_id,
            session_id,
            tenant_id,
            seq,
            role,
            text,
            timestamp,
        }
    }

    /// Whether this message came from the end user.
    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }

    /// Serialize to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
