//! Session/message store contract.
//!
//! The surrounding gateway owns sessions and messages; this core only reads
//! them, except for `branch`, which copies a prefix into a fresh session.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use continuity_types::{Message, MessageRole};

use crate::error::GraphError;

/// Access to session message history.
///
/// Implementations are expected to return messages ordered oldest to newest
/// and to keep `seq` strictly increasing within a session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a new empty session for the tenant, returning its id.
    async fn create_session(&self, tenant_id: &str) -> Result<String, GraphError>;

    /// Append a message verbatim, preserving its `seq`.
    async fn append_message(&self, message: Message) -> Result<(), GraphError>;

    /// The most recent `limit` messages, ordered oldest to newest.
    async fn recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, GraphError>;

    /// All messages up to and including `message_id`, oldest first.
    async fn messages_up_to(
        &self,
        session_id: &str,
        message_id: &str,
    ) -> Result<Vec<Message>, GraphError>;
}

/// In-memory session store for tests and local runs.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Vec<Message>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Append a new turn, assigning the next sequence number.
    pub async fn push(
        &self,
        session_id: &str,
        tenant_id: &str,
        role: MessageRole,
        text: impl Into<String>,
    ) -> Message {
        let mut sessions = self.sessions.write().await;
        let messages = sessions.entry(session_id.to_string()).or_default();
        let seq = messages.last().map(|m| m.seq + 1).unwrap_or(1);
        let message = Message::new(
            ulid::Ulid::new().to_string(),
            session_id.to_string(),
            tenant_id.to_string(),
            seq,
            role,
            text.into(),
            Utc::now(),
        );
        messages.push(message.clone());
        message
    }

    /// Number of messages in a session.
    pub async fn len(&self, session_id: &str) -> usize {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|m| m.len())
            .unwrap_or(0)
    }

    /// Whether the session holds no messages.
    pub async fn is_empty(&self, session_id: &str) -> bool {
        self.len(session_id).await == 0
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, _tenant_id: &str) -> Result<String, GraphError> {
        let session_id = ulid::Ulid::new().to_string();
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), Vec::new());
        Ok(session_id)
    }

    async fn append_message(&self, message: Message) -> Result<(), GraphError> {
        let mut sessions = self.sessions.write().await;
        let messages = sessions.entry(message.session_id.clone()).or_default();
        if let Some(last) = messages.last() {
            if message.seq <= last.seq {
                return Err(GraphError::Session(format!(
                    "seq {} not increasing in session {}",
                    message.seq, message.session_id
                )));
            }
        }
        messages.push(message);
        Ok(())
    }

    async fn recent_messages(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, GraphError> {
        let sessions = self.sessions.read().await;
        let messages = sessions.get(session_id).cloned().unwrap_or_default();
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }

    async fn messages_up_to(
        &self,
        session_id: &str,
        message_id: &str,
    ) -> Result<Vec<Message>, GraphError> {
        let sessions = self.sessions.read().await;
        let messages = sessions
            .get(session_id)
            .ok_or_else(|| GraphError::Session(format!("Unknown session: {}", session_id)))?;

        let cut = messages
            .iter()
            .position(|m| m.message_id == message_id)
            .ok_or_else(|| {
                GraphError::Session(format!(
                    "Message {} not found in session {}",
                    message_id, session_id
                ))
            })?;

        Ok(messages[..=cut].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_assigns_increasing_seq() {
        let store = InMemorySessionStore::new();
        let first = store.push("s1", "t1", MessageRole::User, "hi").await;
        let second = store.push("s1", "t1", MessageRole::Assistant, "hello").await;
        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);
    }

    #[tokio::test]
    async fn test_recent_messages_window() {
        let store = InMemorySessionStore::new();
        for i in 0..8 {
            store
                .push("s1", "t1", MessageRole::User, format!("m{}", i))
                .await;
        }

        let window = store.recent_messages("s1", 5).await.unwrap();
        assert_eq!(window.len(), 5);
        assert_eq!(window.first().unwrap().seq, 4);
        assert_eq!(window.last().unwrap().seq, 8);
    }

    #[tokio::test]
    async fn test_recent_messages_unknown_session_is_empty() {
        let store = InMemorySessionStore::new();
        assert!(store.recent_messages("nope", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_messages_up_to() {
        let store = InMemorySessionStore::new();
        store.push("s1", "t1", MessageRole::User, "a").await;
        let cut = store.push("s1", "t1", MessageRole::Assistant, "b").await;
        store.push("s1", "t1", MessageRole::User, "c").await;

        let prefix = store.messages_up_to("s1", &cut.message_id).await.unwrap();
        assert_eq!(prefix.len(), 2);
        assert_eq!(prefix.last().unwrap().message_id, cut.message_id);
    }

    #[tokio::test]
    async fn test_append_rejects_non_increasing_seq() {
        let store = InMemorySessionStore::new();
        let message = store.push("s1", "t1", MessageRole::User, "a").await;
        let result = store.append_message(message).await;
        assert!(matches!(result, Err(GraphError::Session(_))));
    }
}
