//! CLI argument parsing for the continuity daemon.

use clap::{Parser, Subcommand};

/// Conversation Continuity Daemon
///
/// Runs the presence/engagement tick and topic decay jobs over a local
/// continuity database.
#[derive(Parser, Debug)]
#[command(name = "continuity-daemon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides ~/.config/continuity/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Daemon commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the daemon in the foreground
    Run {
        /// Override database path
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Show database statistics
    Status {
        /// Override database path
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Trigger manual compaction
    Compact {
        /// Override database path
        #[arg(long)]
        db_path: Option<String>,
    },
}
