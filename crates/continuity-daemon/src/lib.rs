//! # continuity-daemon
//!
//! CLI binary wiring the continuity engine to the tick scheduler for
//! local runs: the presence/engagement evaluation and the topic decay
//! pass on their configured cron schedules.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{compact, run, status};
