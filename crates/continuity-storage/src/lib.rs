//! # continuity-storage
//!
//! RocksDB-backed storage for the continuity engine.
//!
//! Provides:
//! - Database open with column family setup
//! - Generic single-key and prefix reads for the higher crates
//! - The compare-and-swap guarded `active` marker that keeps the
//!   one-active-conversation-per-session invariant under concurrent
//!   boundary decisions

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;

pub use column_families::{
    ALL_CF_NAMES, CF_ACTIVE, CF_CONVERSATIONS, CF_PRESENCE, CF_SESSION_INDEX, CF_TOPICS,
};
pub use db::{Storage, StorageStats};
pub use error::StorageError;
