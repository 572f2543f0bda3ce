//! # continuity-graph
//!
//! The conversation graph: persistence and operations over topic-bounded
//! conversation segments.
//!
//! Operations: create (with close-existing-first guard), advance_end,
//! idempotent close, link, depth-bounded chain traversal, and session
//! branching. Also defines the `SessionStore` trait through which the
//! surrounding system supplies message history, plus an in-memory
//! implementation for tests and local runs.

pub mod error;
pub mod graph;
pub mod session;

pub use error::GraphError;
pub use graph::{CloseRequest, ConversationGraph, CreateRequest};
pub use session::{InMemorySessionStore, SessionStore};
