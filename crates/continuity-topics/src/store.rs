//! Topic storage operations.
//!
//! Topics are keyed by `(tenant, name)`. An upsert on an existing topic is a
//! mention: it bumps the count, refreshes recency, and grows the frequency
//! weight; the personal weight and metadata are only overwritten when the
//! caller supplies them explicitly.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use continuity_storage::{keys, Storage, CF_TOPICS};
use continuity_types::Topic;

use crate::decay::DecayPolicy;
use crate::error::TopicsError;

/// Parameters for a topic upsert.
#[derive(Debug, Clone)]
pub struct UpsertTopic {
    /// Topic name, unique per tenant
    pub name: String,
    /// Grouping category
    pub category: String,
    /// Overwrites the declared importance when given
    pub personal_weight: Option<f64>,
    /// Overwrites the metadata when given
    pub metadata: Option<HashMap<String, String>>,
}

impl UpsertTopic {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            personal_weight: None,
            metadata: None,
        }
    }

    pub fn with_personal_weight(mut self, weight: f64) -> Self {
        self.personal_weight = Some(weight);
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Topic storage interface.
pub struct TopicStore {
    storage: Arc<Storage>,
    decay: DecayPolicy,
}

impl TopicStore {
    /// Create a topic store with the given decay policy.
    pub fn new(storage: Arc<Storage>, decay: DecayPolicy) -> Self {
        Self { storage, decay }
    }

    /// Get a topic by name.
    pub fn get(&self, tenant_id: &str, name: &str) -> Result<Option<Topic>, TopicsError> {
        let key = keys::topic_key(tenant_id, name);
        match self.storage.get(CF_TOPICS, key.as_bytes())? {
            Some(bytes) => Ok(Some(Topic::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save(&self, topic: &Topic) -> Result<(), TopicsError> {
        let key = keys::topic_key(&topic.tenant_id, &topic.name);
        let bytes = topic.to_bytes()?;
        self.storage.put(CF_TOPICS, key.as_bytes(), &bytes)?;
        Ok(())
    }

    /// Record a mention, creating the topic on first sight.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub fn upsert(&self, tenant_id: &str, request: UpsertTopic) -> Result<Topic, TopicsError> {
        if request.name.trim().is_empty() {
            return Err(TopicsError::InvalidInput("Topic name is empty".to_string()));
        }

        let now = Utc::now();
        let mut topic = match self.get(tenant_id, &request.name)? {
            Some(mut existing) => {
                existing.record_mention(now);
                existing.frequency_weight = self.decay.bumped(existing.frequency_weight);
                existing.category = request.category;
                existing
            }
            None => Topic::new(
                request.name.clone(),
                request.category,
                tenant_id.to_string(),
                now,
            ),
        };

        if let Some(weight) = request.personal_weight {
            topic.personal_weight = weight.clamp(0.0, 1.0);
        }
        if let Some(metadata) = request.metadata {
            topic.metadata = metadata;
        }

        self.save(&topic)?;
        debug!(mention_count = topic.mention_count, "Upserted topic");
        Ok(topic)
    }

    /// All topics of a tenant, unsorted.
    pub fn list(&self, tenant_id: &str) -> Result<Vec<Topic>, TopicsError> {
        let prefix = keys::topic_prefix(tenant_id);
        let mut topics = Vec::new();
        for (_, value) in self.storage.prefix_iterator(CF_TOPICS, prefix.as_bytes())? {
            topics.push(Topic::from_bytes(&value)?);
        }
        Ok(topics)
    }

    /// Topics whose activation score clears the threshold, best first.
    ///
    /// Score weighs declared importance over raw frequency:
    /// `personal * 0.6 + frequency * 0.4 > threshold`.
    pub fn get_active(&self, tenant_id: &str, threshold: f64) -> Result<Vec<Topic>, TopicsError> {
        let mut topics: Vec<Topic> = self
            .list(tenant_id)?
            .into_iter()
            .filter(|t| t.activation_score() > threshold)
            .collect();
        topics.sort_by(|a, b| {
            b.activation_score()
                .partial_cmp(&a.activation_score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(topics)
    }

    /// All tenants holding at least one topic.
    pub fn tenants(&self) -> Result<Vec<String>, TopicsError> {
        let mut tenants = Vec::new();
        for (key, _) in self.storage.prefix_iterator(CF_TOPICS, b"topic:")? {
            let key_str = String::from_utf8_lossy(&key);
            if let Some(tenant_id) = keys::tenant_id_from_topic_key(&key_str) {
                if tenants.last().map(String::as_str) != Some(tenant_id) {
                    tenants.push(tenant_id.to_string());
                }
            }
        }
        tenants.dedup();
        Ok(tenants)
    }

    /// Apply frequency-weight decay to every topic of a tenant.
    ///
    /// Run periodically by the scheduler. Returns the number of topics whose
    /// weight changed.
    #[instrument(skip(self))]
    pub fn decay_frequency_weights(
        &self,
        tenant_id: &str,
        now: DateTime<Utc>,
    ) -> Result<u32, TopicsError> {
        let mut updated = 0;
        for mut topic in self.list(tenant_id)? {
            let decayed = self
                .decay
                .decayed(topic.frequency_weight, topic.last_mentioned_at, now);
            if (decayed - topic.frequency_weight).abs() > 1e-6 {
                topic.frequency_weight = decayed;
                self.save(&topic)?;
                updated += 1;
            }
        }
        if updated > 0 {
            debug!(updated = updated, "Decayed topic frequency weights");
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_store() -> (TopicStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(temp_dir.path()).unwrap());
        (TopicStore::new(storage, DecayPolicy::new(14)), temp_dir)
    }

    #[test]
    fn test_upsert_creates_on_first_mention() {
        let (store, _temp) = create_store();

        let topic = store
            .upsert("t1", UpsertTopic::new("rust", "interest"))
            .unwrap();
        assert_eq!(topic.mention_count, 1);
        assert!((topic.frequency_weight - 0.1).abs() < f64::EPSILON);
        assert!(topic.personal_weight.abs() < f64::EPSILON);
    }

    #[test]
    fn test_upsert_mention_bumps_existing() {
        let (store, _temp) = create_store();

        store
            .upsert("t1", UpsertTopic::new("rust", "interest"))
            .unwrap();
        let topic = store
            .upsert("t1", UpsertTopic::new("rust", "interest"))
            .unwrap();

        assert_eq!(topic.mention_count, 2);
        assert!((topic.frequency_weight - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_upsert_preserves_sticky_fields() {
        let (store, _temp) = create_store();

        store
            .upsert(
                "t1",
                UpsertTopic::new("rust", "interest").with_personal_weight(0.9),
            )
            .unwrap();

        // Plain mention: declared weight untouched.
        let topic = store
            .upsert("t1", UpsertTopic::new("rust", "interest"))
            .unwrap();
        assert!((topic.personal_weight - 0.9).abs() < f64::EPSILON);

        // Explicit override applies.
        let topic = store
            .upsert(
                "t1",
                UpsertTopic::new("rust", "interest").with_personal_weight(0.2),
            )
            .unwrap();
        assert!((topic.personal_weight - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_upsert_rejects_blank_name() {
        let (store, _temp) = create_store();
        let result = store.upsert("t1", UpsertTopic::new("  ", "interest"));
        assert!(matches!(result, Err(TopicsError::InvalidInput(_))));
    }

    #[test]
    fn test_get_active_threshold_arithmetic() {
        let (store, _temp) = create_store();

        // 0.9 * 0.6 + 0.1 * 0.4 = 0.58 > 0.3 -> active
        store
            .upsert(
                "t1",
                UpsertTopic::new("declared", "interest").with_personal_weight(0.9),
            )
            .unwrap();

        // Frequency-only topic: freshly minted at 0.1 -> 0.04, inactive.
        store
            .upsert("t1", UpsertTopic::new("fresh", "interest"))
            .unwrap();

        // 0.4 * 0.6 + 0.1 * 0.4 = 0.28, still inactive at 0.3.
        store
            .upsert(
                "t1",
                UpsertTopic::new("mild", "interest").with_personal_weight(0.4),
            )
            .unwrap();

        // 0.0 * 0.6 + 0.9 * 0.4 = 0.36, active on frequency alone.
        let mut frequent = store
            .upsert("t1", UpsertTopic::new("frequent", "interest"))
            .unwrap();
        frequent.frequency_weight = 0.9;
        store.save(&frequent).unwrap();

        let active = store.get_active("t1", 0.3).unwrap();
        let names: Vec<_> = active.iter().map(|t| t.name.as_str()).collect();
        // Sorted by score: declared 0.58, frequent 0.36.
        assert_eq!(names, vec!["declared", "frequent"]);
    }

    #[test]
    fn test_get_active_is_tenant_scoped() {
        let (store, _temp) = create_store();

        store
            .upsert(
                "t1",
                UpsertTopic::new("rust", "interest").with_personal_weight(0.9),
            )
            .unwrap();

        assert!(store.get_active("t2", 0.3).unwrap().is_empty());
    }

    #[test]
    fn test_decay_reduces_stale_weights() {
        let (store, _temp) = create_store();

        let mut topic = store
            .upsert("t1", UpsertTopic::new("rust", "interest"))
            .unwrap();
        // Age the mention stamp by one half-life.
        topic.last_mentioned_at = Utc::now() - chrono::Duration::days(14);
        store.save(&topic).unwrap();

        let updated = store.decay_frequency_weights("t1", Utc::now()).unwrap();
        assert_eq!(updated, 1);

        let decayed = store.get("t1", "rust").unwrap().unwrap();
        assert!((decayed.frequency_weight - 0.05).abs() < 1e-4);
    }

    #[test]
    fn test_decay_skips_fresh_topics() {
        let (store, _temp) = create_store();
        store
            .upsert("t1", UpsertTopic::new("rust", "interest"))
            .unwrap();

        let updated = store.decay_frequency_weights("t1", Utc::now()).unwrap();
        assert_eq!(updated, 0);
    }
}
