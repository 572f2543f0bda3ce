//! Tick jitter.
//!
//! Every tenant is evaluated on the same cron schedule; a random delay in
//! front of each tick spreads the resulting storage reads out instead of
//! firing them all on the same instant.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Random-delay configuration for scheduled ticks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JitterConfig {
    /// Maximum delay in seconds; 0 disables jitter.
    pub max_jitter_secs: u64,
}

impl JitterConfig {
    pub fn new(max_jitter_secs: u64) -> Self {
        Self { max_jitter_secs }
    }

    /// Draw a random delay in `[0, max_jitter_secs)`.
    pub fn delay(&self) -> Duration {
        if self.max_jitter_secs == 0 {
            return Duration::ZERO;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..self.max_jitter_secs * 1000);
        Duration::from_millis(jitter_ms)
    }

    /// Sleep for a freshly drawn delay.
    pub async fn apply(&self) {
        let delay = self.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
