//! Column family definitions for RocksDB.
//!
//! Each column family isolates data with different access patterns:
//! - conversations: conversation records, written on every boundary decision
//! - active: per-session active-conversation markers, small and hot
//! - session_index: session -> conversation membership index
//! - topics: topic records, read by the presence tick and decay job
//! - presence: one record per tenant

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family for conversation records
pub const CF_CONVERSATIONS: &str = "conversations";

/// Column family for per-session active-conversation markers
pub const CF_ACTIVE: &str = "active";

/// Column family for the session -> conversations index
pub const CF_SESSION_INDEX: &str = "session_index";

/// Column family for topic records
pub const CF_TOPICS: &str = "topics";

/// Column family for per-tenant presence state
pub const CF_PRESENCE: &str = "presence";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[
    CF_CONVERSATIONS,
    CF_ACTIVE,
    CF_SESSION_INDEX,
    CF_TOPICS,
    CF_PRESENCE,
];

/// Create column family options for conversations (compressed)
fn conversations_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_CONVERSATIONS, conversations_options()),
        ColumnFamilyDescriptor::new(CF_ACTIVE, Options::default()),
        ColumnFamilyDescriptor::new(CF_SESSION_INDEX, Options::default()),
        ColumnFamilyDescriptor::new(CF_TOPICS, Options::default()),
        ColumnFamilyDescriptor::new(CF_PRESENCE, Options::default()),
    ]
}
