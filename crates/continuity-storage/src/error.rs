//! Storage error types.

use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying RocksDB error
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Column family missing from the open database
    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    /// Malformed key encountered during a scan
    #[error("Key error: {0}")]
    Key(String),

    /// Value could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}
