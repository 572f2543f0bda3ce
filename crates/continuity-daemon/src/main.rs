//! Conversation Continuity Daemon
//!
//! # Usage
//!
//! ```bash
//! continuity-daemon run [--db-path PATH]
//! continuity-daemon status
//! continuity-daemon compact
//! ```
//!
//! # Configuration
//!
//! Loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/continuity/config.toml)
//! 3. Environment variables (CONTINUITY_*)

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use continuity_daemon::{compact, run, status, Cli, Commands};

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Commands::Run { db_path } => {
            run(cli.config.as_deref(), db_path.as_deref()).await?;
        }
        Commands::Status { db_path } => {
            status(cli.config.as_deref(), db_path.as_deref())?;
        }
        Commands::Compact { db_path } => {
            compact(cli.config.as_deref(), db_path.as_deref())?;
        }
    }

    Ok(())
}
