//! Key encoding for the storage layer.
//!
//! All keys are tenant-prefixed format strings; no core operation reads or
//! writes across tenant boundaries. Prefix helpers end with the separator so
//! prefix iteration cannot leak into a neighboring tenant or session whose
//! id shares a prefix.

/// Key for a conversation record: `conv:{tenant_id}:{conversation_id}`
pub fn conversation_key(tenant_id: &str, conversation_id: &str) -> String {
    format!("conv:{}:{}", tenant_id, conversation_id)
}

/// Key for a session's active-conversation marker:
/// `active:{tenant_id}:{session_id}`
pub fn active_key(tenant_id: &str, session_id: &str) -> String {
    format!("active:{}:{}", tenant_id, session_id)
}

/// Key for a session-index entry:
/// `sess:{tenant_id}:{session_id}:{conversation_id}`
pub fn session_index_key(tenant_id: &str, session_id: &str, conversation_id: &str) -> String {
    format!("sess:{}:{}:{}", tenant_id, session_id, conversation_id)
}

/// Prefix covering all index entries of one session
pub fn session_index_prefix(tenant_id: &str, session_id: &str) -> String {
    format!("sess:{}:{}:", tenant_id, session_id)
}

/// Extract the conversation id from a session-index key.
///
/// Returns `None` if the key does not match the expected shape.
pub fn conversation_id_from_index_key(key: &str) -> Option<&str> {
    // sess:{tenant}:{session}:{conversation}
    key.splitn(4, ':').nth(3)
}

/// Key for a topic record: `topic:{tenant_id}:{name}`
pub fn topic_key(tenant_id: &str, name: &str) -> String {
    format!("topic:{}:{}", tenant_id, name)
}

/// Prefix covering all topics of one tenant
pub fn topic_prefix(tenant_id: &str) -> String {
    format!("topic:{}:", tenant_id)
}

/// Extract the tenant id from a topic key.
pub fn tenant_id_from_topic_key(key: &str) -> Option<&str> {
    // topic:{tenant}:{name}
    key.strip_prefix("topic:")?.split(':').next()
}

/// Key for a tenant's presence record: `presence:{tenant_id}`
pub fn presence_key(tenant_id: &str) -> String {
    format!("presence:{}", tenant_id)
}

/// Prefix covering all presence records
pub fn presence_prefix() -> &'static str {
    "presence:"
}

/// Extract the tenant id from a presence key.
pub fn tenant_id_from_presence_key(key: &str) -> Option<&str> {
    key.strip_prefix(presence_prefix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_key_format() {
        assert_eq!(conversation_key("t1", "c9"), "conv:t1:c9");
    }

    #[test]
    fn test_session_index_roundtrip() {
        let key = session_index_key("t1", "s2", "c3");
        assert!(key.starts_with(&session_index_prefix("t1", "s2")));
        assert_eq!(conversation_id_from_index_key(&key), Some("c3"));
    }

    #[test]
    fn test_session_prefix_does_not_leak() {
        // "s2" must not match entries of session "s20"
        let key = session_index_key("t1", "s20", "c3");
        assert!(!key.starts_with(&session_index_prefix("t1", "s2")));
    }

    #[test]
    fn test_index_key_malformed() {
        assert_eq!(conversation_id_from_index_key("sess:only:two"), None);
    }

    #[test]
    fn test_topic_keys() {
        assert_eq!(topic_key("t1", "rust"), "topic:t1:rust");
        assert!(topic_key("t1", "rust").starts_with(&topic_prefix("t1")));
        assert!(!topic_key("t10", "rust").starts_with(&topic_prefix("t1")));
    }

    #[test]
    fn test_tenant_from_topic_key() {
        assert_eq!(tenant_id_from_topic_key("topic:t1:rust"), Some("t1"));
        assert_eq!(tenant_id_from_topic_key("presence:t1"), None);
    }

    #[test]
    fn test_presence_key_roundtrip() {
        let key = presence_key("t1");
        assert_eq!(tenant_id_from_presence_key(&key), Some("t1"));
        assert_eq!(tenant_id_from_presence_key("conv:t1:x"), None);
    }
}
