//! Topic type: a tenant-scoped label for a recurring subject.
//!
//! Two weights are tracked independently:
//! - `personal_weight`: operator/user-declared importance. Sticky; only an
//!   explicit upsert overwrites it.
//! - `frequency_weight`: derived from mention recency and frequency, decayed
//!   over time by the topic store's decay job.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Initial frequency weight for a newly minted topic.
pub const INITIAL_FREQUENCY_WEIGHT: f64 = 0.1;

/// A recurring subject for one tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    /// Topic name, unique per tenant
    pub name: String,

    /// Grouping category ("project", "interest", ...)
    pub category: String,

    /// Owning tenant
    pub tenant_id: String,

    /// Declared importance in [0, 1]
    pub personal_weight: f64,

    /// Mention-derived weight in [0, 1]
    pub frequency_weight: f64,

    /// Total number of mentions
    pub mention_count: u64,

    /// Most recent mention timestamp
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_mentioned_at: DateTime<Utc>,

    /// First occurrence timestamp
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    /// Additional metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Topic {
    /// Create a topic on first mention.
    pub fn new(name: String, category: String, tenant_id: String, now: DateTime<Utc>) -> Self {
        Self {
            name,
            category,
            tenant_id,
            personal_weight: 0.0,
            frequency_weight: INITIAL_FREQUENCY_WEIGHT,
            mention_count: 1,
            last_mentioned_at: now,
            created_at: now,
            metadata: HashMap::new(),
        }
    }

    /// Set the declared importance, clamped to [0, 1].
    pub fn with_personal_weight(mut self, weight: f64) -> Self {
        self.personal_weight = weight.clamp(0.0, 1.0);
        self
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Activation score: declared importance counts more than raw frequency.
    ///
    /// `personal_weight * 0.6 + frequency_weight * 0.4`
    pub fn activation_score(&self) -> f64 {
        self.personal_weight * 0.6 + self.frequency_weight * 0.4
    }

    /// Even blend of the two weights, used by the engagement scheduler.
    pub fn engagement_weight(&self) -> f64 {
        (self.personal_weight + self.frequency_weight) / 2.0
    }

    /// Record a mention: bump the count and refresh the recency stamp.
    pub fn record_mention(&mut self, now: DateTime<Utc>) {
        self.mention_count += 1;
        self.last_mentioned_at = now;
    }

    /// Serialize to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
