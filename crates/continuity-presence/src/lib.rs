//! # continuity-presence
//!
//! Presence tracking and the engagement scheduler: decides whether, and
//! with what, the agent should proactively re-engage a dormant tenant.
//!
//! - `PresenceStore`: per-tenant presence records, created lazily
//! - `quiet`: quiet-hours membership in the tenant's local time
//! - `EngagementPolicy`: the idle/salience gate, weighted topic selection,
//!   and phrasing templates
//! - `TickScheduler`: cron-driven per-tenant evaluation with jitter and
//!   graceful shutdown

pub mod engagement;
pub mod error;
pub mod jitter;
pub mod quiet;
pub mod scheduler;
pub mod store;

pub use engagement::EngagementPolicy;
pub use error::PresenceError;
pub use jitter::JitterConfig;
pub use quiet::is_in_quiet_hours;
pub use scheduler::{validate_cron_expression, TickScheduler};
pub use store::PresenceStore;
