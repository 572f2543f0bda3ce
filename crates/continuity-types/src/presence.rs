//! Presence state: one record per tenant.
//!
//! Created lazily on first activity or first quiet-hours configuration,
//! updated continuously, never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quiet-hours window in the tenant's local time.
///
/// `start`/`end` are `HH:MM` strings; a window with `start > end` wraps past
/// midnight. Membership is checked over `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    /// Window start, e.g. "22:00"
    pub start: String,
    /// Window end (exclusive), e.g. "06:00"
    pub end: String,
    /// IANA timezone name, e.g. "America/New_York"
    pub timezone: String,
}

impl QuietHours {
    pub fn new(
        start: impl Into<String>,
        end: impl Into<String>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            timezone: timezone.into(),
        }
    }
}

/// A queued proactive message awaiting delivery by the outbound channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingMessage {
    /// Rendered message text
    pub message: String,
    /// Delivery priority; higher first
    pub priority: u8,
    /// Earliest delivery time
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub scheduled_for: DateTime<Utc>,
}

/// Per-tenant presence and engagement state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceState {
    /// Owning tenant
    pub tenant_id: String,

    /// Last inbound or outbound activity for this tenant
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_activity_at: DateTime<Utc>,

    /// Optional do-not-disturb window
    #[serde(default)]
    pub quiet_hours: Option<QuietHours>,

    /// Proactive messages queued for delivery
    #[serde(default)]
    pub pending: Vec<PendingMessage>,
}

impl PresenceState {
    /// Initialize state on first activity.
    pub fn new(tenant_id: String, now: DateTime<Utc>) -> Self {
        Self {
            tenant_id,
            last_activity_at: now,
            quiet_hours: None,
            pending: Vec::new(),
        }
    }

    /// Refresh the activity stamp.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
    }

    /// Milliseconds since the last recorded activity.
    pub fn idle_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_activity_at).num_milliseconds()
    }

    /// Queue a proactive message.
    pub fn push_pending(&mut self, message: PendingMessage) {
        self.pending.push(message);
    }

    /// Remove and return queued messages due at or before `now`,
    /// highest priority first.
    pub fn drain_due(&mut self, now: DateTime<Utc>) -> Vec<PendingMessage> {
        let mut due: Vec<PendingMessage> = Vec::new();
        let mut remaining: Vec<PendingMessage> = Vec::new();
        for entry in self.pending.drain(..) {
            if entry.scheduled_for <= now {
                due.push(entry);
            } else {
                remaining.push(entry);
            }
        }
        self.pending = remaining;
        due.sort_by(|a, b| b.priority.cmp(&a.priority));
        due
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_idle_ms() {
        let now = Utc::now();
        let state = PresenceState::new("tenant-1".to_string(), now - Duration::hours(5));
        assert_eq!(state.idle_ms(now), 5 * 3600 * 1000);
    }

    #[test]
    fn test_touch_refreshes_activity() {
        let start = Utc::now() - Duration::hours(2);
        let mut state = PresenceState::new("tenant-1".to_string(), start);
        let now = Utc::now();
        state.touch(now);
        assert_eq!(state.last_activity_at, now);
    }

    #[test]
    fn test_drain_due_filters_and_orders() {
        let now = Utc::now();
        let mut state = PresenceState::new("tenant-1".to_string(), now);
        state.push_pending(PendingMessage {
            message: "later".to_string(),
            priority: 9,
            scheduled_for: now + Duration::hours(1),
        });
        state.push_pending(PendingMessage {
            message: "low".to_string(),
            priority: 1,
            scheduled_for: now - Duration::minutes(1),
        });
        state.push_pending(PendingMessage {
            message: "high".to_string(),
            priority: 5,
            scheduled_for: now,
        });

        let due = state.drain_due(now);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].message, "high");
        assert_eq!(due[1].message, "low");
        assert_eq!(state.pending.len(), 1);
        assert_eq!(state.pending[0].message, "later");
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut state = PresenceState::new("tenant-1".to_string(), Utc::now());
        state.quiet_hours = Some(QuietHours::new("22:00", "06:00", "America/New_York"));

        let bytes = state.to_bytes().unwrap();
        let decoded = PresenceState::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.tenant_id, "tenant-1");
        assert_eq!(
            decoded.quiet_hours,
            Some(QuietHours::new("22:00", "06:00", "America/New_York"))
        );
    }
}
