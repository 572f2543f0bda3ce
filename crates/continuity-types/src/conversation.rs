//! Conversation type: a topic-bounded segment of one session.
//!
//! A conversation covers the contiguous message range `[start_seq, end_seq]`
//! of exactly one session. At most one conversation per session is active at
//! any instant; the active marker itself lives in storage, this type only
//! carries the record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    /// Still accumulating messages
    Active,
    /// Closed with a final title/summary/tags snapshot
    Closed,
}

/// Kind of cross-conversation relation.
///
/// The set is open for growth; only `Continuation` is produced today, by the
/// boundary decider when a topic shift closes one conversation and starts
/// the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// The related conversation immediately preceded this one in the session
    Continuation,
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationType::Continuation => write!(f, "continuation"),
        }
    }
}

/// Append-only pointer from one conversation to another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRelation {
    /// Target conversation
    pub conversation_id: String,
    /// Kind of relation
    pub relation_type: RelationType,
}

impl ConversationRelation {
    /// A continuation pointer at the given conversation.
    pub fn continuation(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            relation_type: RelationType::Continuation,
        }
    }
}

/// A tenant-scoped segment of one session representing one coherent topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier (ULID string)
    pub conversation_id: String,

    /// Session this conversation segments; never spans sessions
    pub session_id: String,

    /// Owning tenant
    pub tenant_id: String,

    /// Lifecycle status
    pub status: ConversationStatus,

    /// First message seq covered by this conversation
    pub start_seq: u64,

    /// Last covered seq; present once advanced or closed
    pub end_seq: Option<u64>,

    /// Short label, set at close time or by explicit request
    pub title: Option<String>,

    /// Free-form recap, set at close time
    pub summary: Option<String>,

    /// Topic tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Chain depth: 1 for a root, parent depth + 1 when linked
    pub depth: u32,

    /// Explicit cross-conversation link followed by chain traversal
    pub previous_conversation_id: Option<String>,

    /// Append-only relations; entries are never removed or edited
    #[serde(default)]
    pub relations: Vec<ConversationRelation>,

    /// Creation timestamp
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    /// Close timestamp, once closed
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Create a new active root conversation.
    pub fn new(
        conversation_id: String,
        session_id: String,
        tenant_id: String,
        start_seq: u64,
    ) -> Self {
        Self {
            conversation_id,
            session_id,
            tenant_id,
            status: ConversationStatus::Active,
            start_seq,
            end_seq: None,
            title: None,
            summary: None,
            tags: Vec::new(),
            depth: 1,
            previous_conversation_id: None,
            relations: Vec::new(),
            created_at: Utc::now(),
            closed_at: None,
        }
    }

    /// Link to a previous conversation, taking `parent_depth + 1`.
    pub fn with_previous(mut self, previous_id: impl Into<String>, parent_depth: u32) -> Self {
        self.previous_conversation_id = Some(previous_id.into());
        self.depth = parent_depth + 1;
        self
    }

    /// Seed the relation list.
    pub fn with_relations(mut self, relations: Vec<ConversationRelation>) -> Self {
        self.relations = relations;
        self
    }

    /// Whether the conversation is still accumulating messages.
    pub fn is_active(&self) -> bool {
        self.status == ConversationStatus::Active
    }

    /// Append a relation. Relations only grow.
    pub fn push_relation(&mut self, relation: ConversationRelation) {
        self.relations.push(relation);
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
