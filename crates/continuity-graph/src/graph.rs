//! Conversation graph operations.
//!
//! All mutations go through RocksDB; the per-session active marker is only
//! touched via the storage layer's compare-and-swap, so concurrent creators
//! cannot both install an active conversation for one session.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument, warn};

use continuity_storage::{keys, Storage, CF_CONVERSATIONS, CF_SESSION_INDEX};
use continuity_types::{Conversation, ConversationRelation, ConversationStatus};

use crate::error::GraphError;
use crate::session::SessionStore;

/// Parameters for creating a conversation.
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    /// Session the new conversation segments
    pub session_id: String,
    /// First covered message seq
    pub start_seq: u64,
    /// Optional chain link; depth becomes target depth + 1
    pub previous_conversation_id: Option<String>,
    /// Seed relations (e.g. a continuation pointer at a just-closed segment)
    pub relations: Vec<ConversationRelation>,
}

impl CreateRequest {
    pub fn new(session_id: impl Into<String>, start_seq: u64) -> Self {
        Self {
            session_id: session_id.into(),
            start_seq,
            previous_conversation_id: None,
            relations: Vec::new(),
        }
    }

    pub fn with_previous(mut self, previous: impl Into<String>) -> Self {
        self.previous_conversation_id = Some(previous.into());
        self
    }

    pub fn with_relations(mut self, relations: Vec<ConversationRelation>) -> Self {
        self.relations = relations;
        self
    }
}

/// Final snapshot applied when closing a conversation.
///
/// `None` fields keep whatever the conversation already carries.
#[derive(Debug, Clone, Default)]
pub struct CloseRequest {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub tags: Option<Vec<String>>,
    pub end_seq: u64,
}

/// Persistence and operations over conversation records.
pub struct ConversationGraph {
    storage: Arc<Storage>,
}

impl ConversationGraph {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Get a conversation by id.
    pub fn get(&self, tenant_id: &str, conversation_id: &str) -> Result<Option<Conversation>, GraphError> {
        let key = keys::conversation_key(tenant_id, conversation_id);
        match self.storage.get(CF_CONVERSATIONS, key.as_bytes())? {
            Some(bytes) => Ok(Some(Conversation::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn require(&self, tenant_id: &str, conversation_id: &str) -> Result<Conversation, GraphError> {
        self.get(tenant_id, conversation_id)?
            .ok_or_else(|| GraphError::NotFound(conversation_id.to_string()))
    }

    fn save(&self, conversation: &Conversation) -> Result<(), GraphError> {
        let key = keys::conversation_key(&conversation.tenant_id, &conversation.conversation_id);
        let bytes = conversation.to_bytes()?;
        self.storage.put(CF_CONVERSATIONS, key.as_bytes(), &bytes)?;
        Ok(())
    }

    /// The session's active conversation, if any.
    ///
    /// A marker pointing at a missing or already-closed record is a
    /// recoverable anomaly and reads as "no active conversation".
    pub fn active_conversation(
        &self,
        tenant_id: &str,
        session_id: &str,
    ) -> Result<Option<Conversation>, GraphError> {
        let marker_key = keys::active_key(tenant_id, session_id);
        let Some(conversation_id) = self.storage.get_active_marker(&marker_key)? else {
            return Ok(None);
        };

        match self.get(tenant_id, &conversation_id)? {
            Some(conversation) if conversation.is_active() => Ok(Some(conversation)),
            Some(_) => {
                warn!(
                    session_id = %session_id,
                    conversation_id = %conversation_id,
                    "Active marker points at a closed conversation"
                );
                Ok(None)
            }
            None => {
                warn!(
                    session_id = %session_id,
                    conversation_id = %conversation_id,
                    "Active marker points at a missing conversation"
                );
                Ok(None)
            }
        }
    }

    /// Create a conversation and make it the session's active one.
    ///
    /// If the session already has an active conversation it is closed first
    /// with its current fields as the snapshot. Losing the active-marker
    /// swap to a concurrent creator yields `GraphError::Conflict` and leaves
    /// no partial state behind.
    #[instrument(skip(self, request), fields(session_id = %request.session_id))]
    pub fn create(
        &self,
        tenant_id: &str,
        request: CreateRequest,
    ) -> Result<Conversation, GraphError> {
        if let Some(active) = self.active_conversation(tenant_id, &request.session_id)? {
            let end_seq = active.end_seq.unwrap_or(active.start_seq);
            self.close(
                tenant_id,
                &active.conversation_id,
                CloseRequest {
                    title: None,
                    summary: None,
                    tags: None,
                    end_seq,
                },
            )?;
        }

        let depth_parent = match &request.previous_conversation_id {
            Some(previous_id) => Some(self.require(tenant_id, previous_id)?.depth),
            None => None,
        };

        let mut conversation = Conversation::new(
            ulid::Ulid::new().to_string(),
            request.session_id.clone(),
            tenant_id.to_string(),
            request.start_seq,
        )
        .with_relations(request.relations);
        if let (Some(previous_id), Some(parent_depth)) =
            (&request.previous_conversation_id, depth_parent)
        {
            conversation = conversation.with_previous(previous_id.clone(), parent_depth);
        }

        self.save(&conversation)?;
        let index_key = keys::session_index_key(
            tenant_id,
            &request.session_id,
            &conversation.conversation_id,
        );
        self.storage
            .put(CF_SESSION_INDEX, index_key.as_bytes(), &[])?;

        let marker_key = keys::active_key(tenant_id, &request.session_id);
        if !self
            .storage
            .swap_active(&marker_key, None, Some(&conversation.conversation_id))?
        {
            // A concurrent creator won; withdraw the record we just wrote.
            let record_key =
                keys::conversation_key(tenant_id, &conversation.conversation_id);
            self.storage.delete(CF_CONVERSATIONS, record_key.as_bytes())?;
            self.storage.delete(CF_SESSION_INDEX, index_key.as_bytes())?;
            return Err(GraphError::Conflict(request.session_id));
        }

        debug!(
            conversation_id = %conversation.conversation_id,
            start_seq = conversation.start_seq,
            depth = conversation.depth,
            "Created conversation"
        );
        Ok(conversation)
    }

    /// Extend an active conversation's covered range.
    ///
    /// Last-write-wins; callers are expected to pass non-decreasing values.
    /// Fails with `NotActive` on a closed conversation.
    #[instrument(skip(self))]
    pub fn advance_end(
        &self,
        tenant_id: &str,
        conversation_id: &str,
        end_seq: u64,
    ) -> Result<Conversation, GraphError> {
        let mut conversation = self.require(tenant_id, conversation_id)?;
        if !conversation.is_active() {
            return Err(GraphError::NotActive(conversation_id.to_string()));
        }

        conversation.end_seq = Some(end_seq);
        self.save(&conversation)?;
        debug!(end_seq = end_seq, "Advanced conversation end");
        Ok(conversation)
    }

    /// Close a conversation with a final snapshot.
    ///
    /// Idempotent: closing an already-closed conversation returns it
    /// unchanged.
    #[instrument(skip(self, request))]
    pub fn close(
        &self,
        tenant_id: &str,
        conversation_id: &str,
        request: CloseRequest,
    ) -> Result<Conversation, GraphError> {
        let mut conversation = self.require(tenant_id, conversation_id)?;
        if !conversation.is_active() {
            debug!("Conversation already closed");
            return Ok(conversation);
        }

        if let Some(title) = request.title {
            conversation.title = Some(title);
        }
        if let Some(summary) = request.summary {
            conversation.summary = Some(summary);
        }
        if let Some(tags) = request.tags {
            conversation.tags = tags;
        }
        conversation.end_seq = Some(request.end_seq);
        conversation.status = ConversationStatus::Closed;
        conversation.closed_at = Some(Utc::now());
        self.save(&conversation)?;

        // Release the marker only if it still points at us.
        let marker_key = keys::active_key(tenant_id, &conversation.session_id);
        self.storage
            .swap_active(&marker_key, Some(conversation_id), None)?;

        debug!(end_seq = request.end_seq, "Closed conversation");
        Ok(conversation)
    }

    /// Point the session's active conversation at `target_conversation_id`.
    ///
    /// With no active conversation, a new one is created at `start_seq`
    /// linked to the target. Depth follows the target either way.
    #[instrument(skip(self))]
    pub fn link(
        &self,
        tenant_id: &str,
        session_id: &str,
        target_conversation_id: &str,
        start_seq: u64,
    ) -> Result<Conversation, GraphError> {
        let target = self.require(tenant_id, target_conversation_id)?;

        match self.active_conversation(tenant_id, session_id)? {
            Some(mut active) => {
                active.previous_conversation_id = Some(target.conversation_id.clone());
                active.depth = target.depth + 1;
                self.save(&active)?;
                debug!(
                    conversation_id = %active.conversation_id,
                    target = %target.conversation_id,
                    "Linked active conversation"
                );
                Ok(active)
            }
            None => self.create(
                tenant_id,
                CreateRequest::new(session_id, start_seq)
                    .with_previous(target.conversation_id.clone()),
            ),
        }
    }

    /// Follow `previous_conversation_id` links up to `max_depth` hops.
    ///
    /// Returns the ordered list from the queried conversation back to its
    /// oldest reachable ancestor. Traversal stops early on a missing link
    /// or a revisited id.
    pub fn get_chain(
        &self,
        tenant_id: &str,
        conversation_id: &str,
        max_depth: usize,
    ) -> Result<Vec<Conversation>, GraphError> {
        let mut chain = Vec::new();
        let mut visited = std::collections::HashSet::new();

        let mut current = self.require(tenant_id, conversation_id)?;
        visited.insert(current.conversation_id.clone());

        for _ in 0..max_depth {
            let Some(previous_id) = current.previous_conversation_id.clone() else {
                break;
            };
            if !visited.insert(previous_id.clone()) {
                warn!(
                    conversation_id = %conversation_id,
                    revisited = %previous_id,
                    "Cycle detected in conversation chain"
                );
                break;
            }
            let Some(previous) = self.get(tenant_id, &previous_id)? else {
                warn!(
                    conversation_id = %conversation_id,
                    missing = %previous_id,
                    "Dangling conversation link"
                );
                break;
            };
            chain.push(std::mem::replace(&mut current, previous));
        }
        chain.push(current);

        Ok(chain)
    }

    /// All conversations recorded for a session, oldest created first.
    pub fn list_for_session(
        &self,
        tenant_id: &str,
        session_id: &str,
    ) -> Result<Vec<Conversation>, GraphError> {
        let prefix = keys::session_index_prefix(tenant_id, session_id);
        let mut conversations = Vec::new();

        for (key, _) in self
            .storage
            .prefix_iterator(CF_SESSION_INDEX, prefix.as_bytes())?
        {
            let key_str = String::from_utf8_lossy(&key);
            let Some(conversation_id) = keys::conversation_id_from_index_key(&key_str) else {
                continue;
            };
            if let Some(conversation) = self.get(tenant_id, conversation_id)? {
                conversations.push(conversation);
            }
        }

        conversations.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(conversations)
    }

    /// Fork a session at a message: create a new session holding the prefix
    /// of the source up to and including `message_id`.
    ///
    /// The source session and its conversations are left untouched. Returns
    /// the new session id.
    #[instrument(skip(self, sessions))]
    pub async fn branch(
        &self,
        tenant_id: &str,
        session_id: &str,
        message_id: &str,
        sessions: &dyn SessionStore,
    ) -> Result<String, GraphError> {
        let prefix = sessions.messages_up_to(session_id, message_id).await?;
        if prefix.is_empty() {
            return Err(GraphError::InvalidInput(format!(
                "Message {} not found in session {}",
                message_id, session_id
            )));
        }

        let new_session_id = sessions.create_session(tenant_id).await?;
        for message in prefix {
            let mut copy = message;
            copy.message_id = ulid::Ulid::new().to_string();
            copy.session_id = new_session_id.clone();
            sessions.append_message(copy).await?;
        }

        debug!(new_session_id = %new_session_id, "Branched session");
        Ok(new_session_id)
    }
}
