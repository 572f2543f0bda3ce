//! Configuration loading for the continuity engine.
//!
//! Layered: built-in defaults -> config file -> environment variables.
//! The config file lives at `~/.config/continuity/config.toml`; environment
//! variables use the `CONTINUITY_` prefix with `__` as section separator
//! (e.g. `CONTINUITY_PRESENCE__IDLE_THRESHOLD_HOURS=6`).

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// RocksDB database directory
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_db_path() -> PathBuf {
    ProjectDirs::from("", "", "continuity")
        .map(|dirs| dirs.data_dir().join("db"))
        .unwrap_or_else(|| PathBuf::from("./continuity-db"))
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Boundary decider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryConfig {
    /// How many recent messages to read per decision
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Timeout for the classification call (ms); on expiry the decision
    /// degrades to a no-op
    #[serde(default = "default_classify_timeout_ms")]
    pub classify_timeout_ms: u64,
}

fn default_window_size() -> usize {
    5
}

fn default_classify_timeout_ms() -> u64 {
    3_000
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            classify_timeout_ms: default_classify_timeout_ms(),
        }
    }
}

/// Topic store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsConfig {
    /// Activation threshold for `get_active`
    #[serde(default = "default_activation_threshold")]
    pub activation_threshold: f64,

    /// Half-life (days) for frequency-weight decay
    #[serde(default = "default_half_life_days")]
    pub half_life_days: u32,

    /// Cron expression for the decay job (6-field)
    #[serde(default = "default_decay_cron")]
    pub decay_cron: String,
}

fn default_activation_threshold() -> f64 {
    0.3
}

fn default_half_life_days() -> u32 {
    14
}

fn default_decay_cron() -> String {
    // Daily at 04:30
    "0 30 4 * * *".to_string()
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            activation_threshold: default_activation_threshold(),
            half_life_days: default_half_life_days(),
            decay_cron: default_decay_cron(),
        }
    }
}

/// Presence/engagement scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Idle time before proactive contact is considered (hours)
    #[serde(default = "default_idle_threshold_hours")]
    pub idle_threshold_hours: u64,

    /// Minimum engagement weight for a topic to justify contact
    #[serde(default = "default_engagement_threshold")]
    pub engagement_threshold: f64,

    /// Cron expression for the per-tenant evaluation tick (6-field)
    #[serde(default = "default_tick_cron")]
    pub tick_cron: String,

    /// Maximum random delay before each tick (seconds); 0 disables jitter
    #[serde(default)]
    pub max_jitter_secs: u64,
}

fn default_idle_threshold_hours() -> u64 {
    4
}

fn default_engagement_threshold() -> f64 {
    0.5
}

fn default_tick_cron() -> String {
    // Every 15 minutes
    "0 */15 * * * *".to_string()
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            idle_threshold_hours: default_idle_threshold_hours(),
            engagement_threshold: default_engagement_threshold(),
            tick_cron: default_tick_cron(),
            max_jitter_secs: 0,
        }
    }
}

/// Topic context retriever settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Token budget for the rendered recall block
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,

    /// Maximum conversations to retrieve per query
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Timeout for the relevance search call (ms); on expiry the block
    /// degrades to an empty string
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,
}

fn default_token_budget() -> usize {
    500
}

fn default_search_limit() -> usize {
    5
}

fn default_search_timeout_ms() -> u64 {
    2_000
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            token_budget: default_token_budget(),
            search_limit: default_search_limit(),
            search_timeout_ms: default_search_timeout_ms(),
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContinuityConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub boundary: BoundaryConfig,
    #[serde(default)]
    pub topics: TopicsConfig,
    #[serde(default)]
    pub presence: PresenceConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

impl ContinuityConfig {
    /// Load configuration from the default locations.
    ///
    /// `config_path` overrides the default file location when given. A
    /// missing file is not an error; defaults and environment still apply.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) => File::with_name(path).required(true),
            None => {
                let default_path = Self::default_config_path();
                File::from(default_path).required(false)
            }
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("CONTINUITY").separator("__"))
            .build()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Default config file path: `~/.config/continuity/config.toml`.
    pub fn default_config_path() -> PathBuf {
        ProjectDirs::from("", "", "continuity")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./continuity.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ContinuityConfig::default();
        assert_eq!(config.boundary.window_size, 5);
        assert_eq!(config.boundary.classify_timeout_ms, 3_000);
        assert!((config.topics.activation_threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.topics.half_life_days, 14);
        assert_eq!(config.presence.idle_threshold_hours, 4);
        assert!((config.presence.engagement_threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.retrieval.token_budget, 500);
        assert_eq!(config.retrieval.search_limit, 5);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = ContinuityConfig::load(None).unwrap();
        assert_eq!(config.boundary.window_size, 5);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[presence]\nidle_threshold_hours = 8\n\n[retrieval]\ntoken_budget = 250\n",
        )
        .unwrap();

        let config = ContinuityConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.presence.idle_threshold_hours, 8);
        assert_eq!(config.retrieval.token_budget, 250);
        // Untouched sections keep defaults
        assert_eq!(config.boundary.window_size, 5);
    }
}
