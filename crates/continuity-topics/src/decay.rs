//! Time decay for the frequency weight.
//!
//! Uses an exponential half-life model: a topic untouched for one half-life
//! keeps half of its frequency weight. Each mention bumps the weight by a
//! fixed step, clamped to 1.0. The weight never decays below a small floor
//! so a once-frequent topic stays addressable.

use chrono::{DateTime, Utc};

/// Weight floor; decay never goes below this.
const DEFAULT_MIN_WEIGHT: f64 = 0.01;

/// Weight added per mention.
const DEFAULT_MENTION_BUMP: f64 = 0.1;

/// Exponential half-life decay over the frequency weight.
#[derive(Debug, Clone)]
pub struct DecayPolicy {
    half_life_days: u32,
    min_weight: f64,
    mention_bump: f64,
}

impl DecayPolicy {
    /// Create a policy with the given half-life.
    pub fn new(half_life_days: u32) -> Self {
        Self {
            half_life_days,
            min_weight: DEFAULT_MIN_WEIGHT,
            mention_bump: DEFAULT_MENTION_BUMP,
        }
    }

    /// Override the weight floor.
    pub fn with_min_weight(mut self, min_weight: f64) -> Self {
        self.min_weight = min_weight;
        self
    }

    /// Get the configured half-life in days.
    pub fn half_life_days(&self) -> u32 {
        self.half_life_days
    }

    /// Decayed weight after the elapsed time since the last mention.
    ///
    /// `weight * 2^(-days_since / half_life)`, floored at the minimum.
    pub fn decayed(
        &self,
        weight: f64,
        last_mentioned_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> f64 {
        let days_since =
            (now - last_mentioned_at).num_milliseconds() as f64 / (24.0 * 3600.0 * 1000.0);
        if days_since <= 0.0 {
            return weight;
        }
        let factor = (-days_since / f64::from(self.half_life_days)).exp2();
        (weight * factor).max(self.min_weight)
    }

    /// Weight after one additional mention, clamped to 1.0.
    pub fn bumped(&self, weight: f64) -> f64 {
        (weight + self.mention_bump).min(1.0)
    }
}
