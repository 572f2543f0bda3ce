//! # continuity-engine
//!
//! The conversation continuity engine: the post-response boundary decider
//! and the in-process facade tying the conversation graph, topic store,
//! presence scheduler, and context retriever together behind one surface.
//!
//! The boundary decider runs fire-and-forget after every agent response and
//! never fails the response path: insufficient signal is a deliberate
//! no-op, and classification failures degrade to leaving the session
//! exactly as it was.

pub mod boundary;
pub mod classify;
pub mod engine;
pub mod error;

pub use boundary::{BoundaryDecider, BoundaryOutcome};
pub use classify::{
    BoundaryClassifier, BoundaryVerdict, ConversationSnapshot, KeywordOverlapClassifier,
};
pub use engine::ContinuityEngine;
pub use error::EngineError;
