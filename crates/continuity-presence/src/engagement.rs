//! Engagement policy: when and how to re-engage a dormant tenant.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::debug;

use continuity_types::{PresenceState, Topic};

use crate::quiet::is_in_quiet_hours;

/// Phrasing templates for proactive messages. `{topic}` is replaced with
/// the topic name.
const INITIATION_TEMPLATES: &[&str] = &[
    "I was thinking about {topic} earlier. Any updates on your end?",
    "How did things go with {topic}?",
    "Something reminded me of {topic} today. How is it coming along?",
    "It's been a while since we talked about {topic}. Want to pick that back up?",
    "Any news about {topic}?",
];

/// Decides whether proactive contact is appropriate and what to send.
#[derive(Debug, Clone)]
pub struct EngagementPolicy {
    idle_threshold: Duration,
    engagement_threshold: f64,
}

impl EngagementPolicy {
    pub fn new(idle_threshold: Duration, engagement_threshold: f64) -> Self {
        Self {
            idle_threshold,
            engagement_threshold,
        }
    }

    /// Policy from configured hours/threshold values.
    pub fn from_config(idle_threshold_hours: u64, engagement_threshold: f64) -> Self {
        Self::new(
            Duration::hours(idle_threshold_hours as i64),
            engagement_threshold,
        )
    }

    /// Whether to proactively contact the tenant right now.
    ///
    /// Requires all of: outside quiet hours, idle longer than the
    /// threshold, and at least one topic whose engagement weight clears
    /// the bar.
    pub fn should_initiate(
        &self,
        state: &PresenceState,
        topics: &[Topic],
        now: DateTime<Utc>,
    ) -> bool {
        if is_in_quiet_hours(state, now) {
            debug!(tenant_id = %state.tenant_id, "In quiet hours, not initiating");
            return false;
        }

        let idle_ms = state.idle_ms(now);
        if idle_ms <= self.idle_threshold.num_milliseconds() {
            return false;
        }

        topics
            .iter()
            .any(|t| t.engagement_weight() > self.engagement_threshold)
    }

    /// Weighted random topic selection, weight = engagement weight.
    ///
    /// With zero total weight the first topic is returned deterministically
    /// rather than drawing from nothing.
    pub fn select_topic<'a, R: Rng>(&self, topics: &'a [Topic], rng: &mut R) -> Option<&'a Topic> {
        if topics.is_empty() {
            return None;
        }

        let total: f64 = topics.iter().map(|t| t.engagement_weight()).sum();
        if total <= 0.0 {
            return topics.first();
        }

        let mut remaining = rng.gen_range(0.0..total);
        for topic in topics {
            remaining -= topic.engagement_weight();
            if remaining < 0.0 {
                return Some(topic);
            }
        }
        // Floating-point residue can carry the draw past the last weight.
        topics.last()
    }

    /// Render a proactive opener, choosing uniformly among the templates.
    pub fn format_initiation<R: Rng>(&self, topic: &Topic, rng: &mut R) -> String {
        let template = INITIATION_TEMPLATES[rng.gen_range(0..INITIATION_TEMPLATES.len())];
        template.replace("{topic}", &topic.name)
    }
}
