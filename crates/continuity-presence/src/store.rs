//! Per-tenant presence records.
//!
//! One record per tenant, keyed by `tenant_id`, created on first write and
//! never deleted. All mutators follow the same load-modify-save shape;
//! records are small and per-tenant write contention is negligible.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use continuity_storage::{keys, Storage, CF_PRESENCE};
use continuity_types::{PendingMessage, PresenceState, QuietHours};

use crate::error::PresenceError;

/// Presence state storage interface.
pub struct PresenceStore {
    storage: Arc<Storage>,
}

impl PresenceStore {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Get a tenant's presence state, if any activity was ever recorded.
    pub fn get(&self, tenant_id: &str) -> Result<Option<PresenceState>, PresenceError> {
        let key = keys::presence_key(tenant_id);
        match self.storage.get(CF_PRESENCE, key.as_bytes())? {
            Some(bytes) => Ok(Some(PresenceState::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save(&self, state: &PresenceState) -> Result<(), PresenceError> {
        let key = keys::presence_key(&state.tenant_id);
        let bytes = state.to_bytes()?;
        self.storage.put(CF_PRESENCE, key.as_bytes(), &bytes)?;
        Ok(())
    }

    fn load_or_init(
        &self,
        tenant_id: &str,
        now: DateTime<Utc>,
    ) -> Result<PresenceState, PresenceError> {
        Ok(self
            .get(tenant_id)?
            .unwrap_or_else(|| PresenceState::new(tenant_id.to_string(), now)))
    }

    /// Record tenant activity, initializing state on first sight.
    #[instrument(skip(self))]
    pub fn record_activity(
        &self,
        tenant_id: &str,
        now: DateTime<Utc>,
    ) -> Result<PresenceState, PresenceError> {
        let mut state = self.load_or_init(tenant_id, now)?;
        state.touch(now);
        self.save(&state)?;
        Ok(state)
    }

    /// Set or clear a tenant's quiet hours, initializing state on first
    /// configuration.
    #[instrument(skip(self, quiet_hours))]
    pub fn configure_quiet_hours(
        &self,
        tenant_id: &str,
        quiet_hours: Option<QuietHours>,
    ) -> Result<PresenceState, PresenceError> {
        let mut state = self.load_or_init(tenant_id, Utc::now())?;
        state.quiet_hours = quiet_hours;
        self.save(&state)?;
        debug!("Configured quiet hours");
        Ok(state)
    }

    /// Queue a proactive message for later delivery.
    #[instrument(skip(self, message))]
    pub fn push_pending(
        &self,
        tenant_id: &str,
        message: PendingMessage,
    ) -> Result<(), PresenceError> {
        let mut state = self.load_or_init(tenant_id, Utc::now())?;
        state.push_pending(message);
        self.save(&state)?;
        Ok(())
    }

    /// Remove and return queued messages due at or before `now`.
    #[instrument(skip(self))]
    pub fn drain_due(
        &self,
        tenant_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<PendingMessage>, PresenceError> {
        let Some(mut state) = self.get(tenant_id)? else {
            return Ok(Vec::new());
        };
        let due = state.drain_due(now);
        if !due.is_empty() {
            self.save(&state)?;
        }
        Ok(due)
    }

    /// All tenants with presence state.
    pub fn tenants(&self) -> Result<Vec<String>, PresenceError> {
        let mut tenants = Vec::new();
        for (key, _) in self
            .storage
            .prefix_iterator(CF_PRESENCE, keys::presence_prefix().as_bytes())?
        {
            let key_str = String::from_utf8_lossy(&key);
            if let Some(tenant_id) = keys::tenant_id_from_presence_key(&key_str) {
                tenants.push(tenant_id.to_string());
            }
        }
        Ok(tenants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_store() -> (PresenceStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(temp_dir.path()).unwrap());
        (PresenceStore::new(storage), temp_dir)
    }

    #[test]
    fn test_record_activity_initializes() {
        let (store, _temp) = create_store();
        assert!(store.get("t1").unwrap().is_none());

        let now = Utc::now();
        let state = store.record_activity("t1", now).unwrap();
        assert_eq!(state.tenant_id, "t1");
        assert_eq!(state.last_activity_at, now);
        assert!(store.get("t1").unwrap().is_some());
    }

    #[test]
    fn test_configure_quiet_hours_initializes() {
        let (store, _temp) = create_store();
        let state = store
            .configure_quiet_hours(
                "t1",
                Some(QuietHours::new("22:00", "06:00", "America/New_York")),
            )
            .unwrap();
        assert!(state.quiet_hours.is_some());

        let cleared = store.configure_quiet_hours("t1", None).unwrap();
        assert!(cleared.quiet_hours.is_none());
    }

    #[test]
    fn test_push_and_drain_pending() {
        let (store, _temp) = create_store();
        let now = Utc::now();

        store
            .push_pending(
                "t1",
                PendingMessage {
                    message: "hello again".to_string(),
                    priority: 3,
                    scheduled_for: now,
                },
            )
            .unwrap();

        let due = store.drain_due("t1", now).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].message, "hello again");

        // Drained messages are gone.
        assert!(store.drain_due("t1", now).unwrap().is_empty());
    }

    #[test]
    fn test_drain_unknown_tenant_is_empty() {
        let (store, _temp) = create_store();
        assert!(store.drain_due("nobody", Utc::now()).unwrap().is_empty());
    }

    #[test]
    fn test_tenants_lists_all() {
        let (store, _temp) = create_store();
        store.record_activity("t1", Utc::now()).unwrap();
        store.record_activity("t2", Utc::now()).unwrap();

        let mut tenants = store.tenants().unwrap();
        tenants.sort();
        assert_eq!(tenants, vec!["t1".to_string(), "t2".to_string()]);
    }
}
