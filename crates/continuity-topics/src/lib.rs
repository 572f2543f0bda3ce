//! # continuity-topics
//!
//! The topic store: tenant-scoped recurring subjects with two independently
//! tracked salience weights, plus the time-decay rule that erodes the
//! frequency weight between mentions.

pub mod decay;
pub mod error;
pub mod store;

pub use decay::DecayPolicy;
pub use error::TopicsError;
pub use store::{TopicStore, UpsertTopic};
