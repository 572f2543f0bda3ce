//! RocksDB wrapper for the continuity engine.
//!
//! Provides:
//! - Database open with column family setup
//! - Generic single-key and prefix reads used by the graph, topic, and
//!   presence stores
//! - `swap_active`, the compare-and-swap over the per-session active
//!   marker that serializes concurrent conversation creation

use rocksdb::{Direction, IteratorMode, Options, DB};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use dashmap::DashMap;

use crate::column_families::{build_cf_descriptors, ALL_CF_NAMES, CF_ACTIVE};
use crate::error::StorageError;

/// Main storage interface.
pub struct Storage {
    db: DB,
    /// Per-key locks serializing active-marker swaps. Keys are only ever
    /// inserted, never removed; the set is bounded by live sessions.
    active_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Storage {
    /// Open storage at the given path, creating if necessary.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        // Universal compaction suits the mostly-append workload
        db_opts.set_compaction_style(rocksdb::DBCompactionStyle::Universal);
        db_opts.set_max_background_jobs(4);

        let cf_descriptors = build_cf_descriptors();
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        Ok(Self {
            db,
            active_locks: DashMap::new(),
        })
    }

    /// Put a value into a specific column family.
    pub fn put(&self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(cf_name.to_string()))?;
        self.db.put_cf(&cf, key, value)?;
        Ok(())
    }

    /// Get a value from a specific column family.
    pub fn get(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(cf_name.to_string()))?;
        let result = self.db.get_cf(&cf, key)?;
        Ok(result)
    }

    /// Delete a value from a specific column family.
    pub fn delete(&self, cf_name: &str, key: &[u8]) -> Result<(), StorageError> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(cf_name.to_string()))?;
        self.db.delete_cf(&cf, key)?;
        Ok(())
    }

    /// Iterate over entries with a given prefix in a column family.
    ///
    /// Returns (key, value) pairs in key order.
    #[allow(clippy::type_complexity)]
    pub fn prefix_iterator(
        &self,
        cf_name: &str,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(cf_name.to_string()))?;

        let mut results = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));

        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }

        Ok(results)
    }

    // ==================== Active Marker ====================

    /// Read a session's active-conversation marker.
    pub fn get_active_marker(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.get(CF_ACTIVE, key.as_bytes())? {
            Some(bytes) => {
                let id = String::from_utf8(bytes)
                    .map_err(|e| StorageError::Key(format!("Invalid active marker: {}", e)))?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Compare-and-swap a session's active-conversation marker.
    ///
    /// Atomically replaces the marker with `new` (or clears it for `None`)
    /// only if the current value equals `expected`. Returns whether the swap
    /// was applied. Two concurrent boundary decisions for one session cannot
    /// both win an `expected = None` swap, which is what holds the single
    /// active-conversation invariant.
    pub fn swap_active(
        &self,
        key: &str,
        expected: Option<&str>,
        new: Option<&str>,
    ) -> Result<bool, StorageError> {
        let lock = self
            .active_locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        // A poisoned lock only means another swap panicked mid-flight; the
        // marker itself is still consistent, so take the lock anyway.
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let current = self.get_active_marker(key)?;
        if current.as_deref() != expected {
            debug!(
                key = %key,
                current = ?current,
                expected = ?expected,
                "Active marker swap rejected"
            );
            return Ok(false);
        }

        match new {
            Some(id) => self.put(CF_ACTIVE, key.as_bytes(), id.as_bytes())?,
            None => self.delete(CF_ACTIVE, key.as_bytes())?,
        }

        Ok(true)
    }

    // ==================== Admin ====================

    /// Flush all column families to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        for cf_name in ALL_CF_NAMES {
            if let Some(cf) = self.db.cf_handle(cf_name) {
                self.db.flush_cf(&cf)?;
            }
        }
        Ok(())
    }

    /// Trigger manual compaction on all column families.
    pub fn compact(&self) -> Result<(), StorageError> {
        info!("Starting full compaction...");
        self.db.compact_range::<&[u8], &[u8]>(None, None);
        for cf_name in ALL_CF_NAMES {
            if let Some(cf) = self.db.cf_handle(cf_name) {
                self.db.compact_range_cf::<&[u8], &[u8]>(&cf, None, None);
            }
        }
        info!("Compaction complete");
        Ok(())
    }

    /// Get entry counts per column family.
    pub fn get_stats(&self) -> Result<StorageStats, StorageError> {
        let mut stats = StorageStats::default();
        stats.conversation_count = self.count_cf_entries(crate::CF_CONVERSATIONS)?;
        stats.active_count = self.count_cf_entries(CF_ACTIVE)?;
        stats.topic_count = self.count_cf_entries(crate::CF_TOPICS)?;
        stats.presence_count = self.count_cf_entries(crate::CF_PRESENCE)?;
        Ok(stats)
    }

    fn count_cf_entries(&self, cf_name: &str) -> Result<u64, StorageError> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(cf_name.to_string()))?;
        let mut count = 0u64;
        let iter = self.db.iterator_cf(&cf, IteratorMode::Start);
        for item in iter {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

/// Entry counts per column family.
#[derive(Debug, Default)]
pub struct StorageStats {
    /// Number of conversation records
    pub conversation_count: u64,
    /// Number of sessions with an active conversation
    pub active_count: u64,
    /// Number of topics
    pub topic_count: u64,
    /// Number of tenants with presence state
    pub presence_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CF_CONVERSATIONS, CF_TOPICS};
    use tempfile::TempDir;

    fn create_test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::open(temp_dir.path()).unwrap();
        (storage, temp_dir)
    }

    #[test]
    fn test_open_creates_column_families() {
        let (storage, _temp) = create_test_storage();
        for cf_name in ALL_CF_NAMES {
            assert!(
                storage.db.cf_handle(cf_name).is_some(),
                "CF {} should exist",
                cf_name
            );
        }
    }

    #[test]
    fn test_put_get_delete() {
        let (storage, _temp) = create_test_storage();

        storage.put(CF_CONVERSATIONS, b"k1", b"v1").unwrap();
        assert_eq!(
            storage.get(CF_CONVERSATIONS, b"k1").unwrap(),
            Some(b"v1".to_vec())
        );

        storage.delete(CF_CONVERSATIONS, b"k1").unwrap();
        assert_eq!(storage.get(CF_CONVERSATIONS, b"k1").unwrap(), None);
    }

    #[test]
    fn test_prefix_iterator_stops_at_prefix_end() {
        let (storage, _temp) = create_test_storage();

        storage.put(CF_TOPICS, b"topic:t1:a", b"1").unwrap();
        storage.put(CF_TOPICS, b"topic:t1:b", b"2").unwrap();
        storage.put(CF_TOPICS, b"topic:t2:a", b"3").unwrap();

        let results = storage.prefix_iterator(CF_TOPICS, b"topic:t1:").unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, b"topic:t1:a".to_vec());
        assert_eq!(results[1].0, b"topic:t1:b".to_vec());
    }

    #[test]
    fn test_swap_active_from_empty() {
        let (storage, _temp) = create_test_storage();

        assert!(storage.swap_active("active:t:s", None, Some("c1")).unwrap());
        assert_eq!(
            storage.get_active_marker("active:t:s").unwrap(),
            Some("c1".to_string())
        );
    }

    #[test]
    fn test_swap_active_rejects_stale_expectation() {
        let (storage, _temp) = create_test_storage();

        assert!(storage.swap_active("active:t:s", None, Some("c1")).unwrap());
        // A second creator expecting an empty marker loses.
        assert!(!storage.swap_active("active:t:s", None, Some("c2")).unwrap());
        assert_eq!(
            storage.get_active_marker("active:t:s").unwrap(),
            Some("c1".to_string())
        );
    }

    #[test]
    fn test_swap_active_clear() {
        let (storage, _temp) = create_test_storage();

        storage.swap_active("active:t:s", None, Some("c1")).unwrap();
        assert!(storage.swap_active("active:t:s", Some("c1"), None).unwrap());
        assert_eq!(storage.get_active_marker("active:t:s").unwrap(), None);

        // Clearing an already-clear marker with a stale expectation is rejected
        assert!(!storage.swap_active("active:t:s", Some("c1"), None).unwrap());
    }

    #[test]
    fn test_swap_active_concurrent_single_winner() {
        let (storage, _temp) = create_test_storage();
        let storage = std::sync::Arc::new(storage);

        let mut handles = Vec::new();
        for i in 0..8 {
            let storage = storage.clone();
            handles.push(std::thread::spawn(move || {
                storage
                    .swap_active("active:t:s", None, Some(&format!("c{}", i)))
                    .unwrap()
            }));
        }

        let wins: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(wins, 1);
    }

    #[test]
    fn test_stats_counts() {
        let (storage, _temp) = create_test_storage();

        storage.put(CF_CONVERSATIONS, b"conv:t:c1", b"{}").unwrap();
        storage.put(CF_TOPICS, b"topic:t:rust", b"{}").unwrap();
        storage.swap_active("active:t:s", None, Some("c1")).unwrap();

        let stats = storage.get_stats().unwrap();
        assert_eq!(stats.conversation_count, 1);
        assert_eq!(stats.topic_count, 1);
        assert_eq!(stats.active_count, 1);
        assert_eq!(stats.presence_count, 0);
    }
}
