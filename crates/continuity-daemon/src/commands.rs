//! Daemon command implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use continuity_engine::{ContinuityEngine, KeywordOverlapClassifier};
use continuity_graph::InMemorySessionStore;
use continuity_presence::{JitterConfig, TickScheduler};
use continuity_retrieval::NoRelevanceSearch;
use continuity_storage::Storage;
use continuity_types::ContinuityConfig;

/// Load configuration, applying the optional db-path override.
fn load_config(config_path: Option<&str>, db_path: Option<&str>) -> Result<ContinuityConfig> {
    let mut config = ContinuityConfig::load(config_path).context("loading configuration")?;
    if let Some(path) = db_path {
        config.storage.db_path = PathBuf::from(path);
    }
    Ok(config)
}

fn open_storage(config: &ContinuityConfig) -> Result<Arc<Storage>> {
    let storage = Storage::open(&config.storage.db_path)
        .with_context(|| format!("opening storage at {:?}", config.storage.db_path))?;
    Ok(Arc::new(storage))
}

/// Run the daemon in the foreground until interrupted.
///
/// Wires the engine with the built-in fallback capabilities; a deployment
/// embeds the engine crate directly and supplies real classification and
/// relevance backends instead.
pub async fn run(config_path: Option<&str>, db_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path, db_path)?;
    let storage = open_storage(&config)?;

    let engine = Arc::new(ContinuityEngine::new(
        storage.clone(),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(KeywordOverlapClassifier),
        Arc::new(NoRelevanceSearch),
        config.clone(),
    ));

    let mut scheduler =
        TickScheduler::new(JitterConfig::new(config.presence.max_jitter_secs)).await?;

    let tick_engine = engine.clone();
    scheduler
        .add_cron_job("presence-tick", &config.presence.tick_cron, move |_token| {
            let engine = tick_engine.clone();
            async move {
                if let Err(e) = engine.evaluate_all_tenants(Utc::now()) {
                    warn!(error = %e, "Presence tick failed");
                }
            }
        })
        .await?;

    let decay_engine = engine.clone();
    scheduler
        .add_cron_job("topic-decay", &config.topics.decay_cron, move |_token| {
            let engine = decay_engine.clone();
            async move {
                match engine.decay_all_topics(Utc::now()) {
                    Ok(updated) => info!(updated = updated, "Topic decay pass complete"),
                    Err(e) => warn!(error = %e, "Topic decay failed"),
                }
            }
        })
        .await?;

    scheduler.start().await?;
    info!("Continuity daemon running; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    info!("Shutting down");
    scheduler.shutdown().await?;
    storage.flush()?;
    Ok(())
}

/// Print database statistics.
pub fn status(config_path: Option<&str>, db_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path, db_path)?;
    let storage = open_storage(&config)?;
    let stats = storage.get_stats()?;

    println!("Database: {:?}", config.storage.db_path);
    println!("  conversations: {}", stats.conversation_count);
    println!("  active sessions: {}", stats.active_count);
    println!("  topics: {}", stats.topic_count);
    println!("  tenants with presence: {}", stats.presence_count);
    Ok(())
}

/// Trigger manual compaction.
pub fn compact(config_path: Option<&str>, db_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path, db_path)?;
    let storage = open_storage(&config)?;
    storage.compact()?;
    println!("Compaction complete");
    Ok(())
}
