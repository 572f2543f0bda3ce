//! Quiet-hours membership checks.
//!
//! "Now" is rendered as a zero-padded `HH:MM` string in the tenant's
//! configured timezone and compared lexically against the window bounds,
//! which is exact for fixed-width time-of-day strings. A window whose start
//! is later than its end wraps past midnight.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

use continuity_types::PresenceState;

/// Whether `now` falls inside the tenant's quiet hours.
///
/// Absent configuration means never quiet. An unparseable timezone is
/// logged and treated as not quiet; suppressing all proactive contact over
/// a config typo would be worse than the occasional off-hours ping.
pub fn is_in_quiet_hours(state: &PresenceState, now: DateTime<Utc>) -> bool {
    let Some(quiet) = &state.quiet_hours else {
        return false;
    };

    let tz: Tz = match quiet.timezone.parse() {
        Ok(tz) => tz,
        Err(_) => {
            warn!(
                tenant_id = %state.tenant_id,
                timezone = %quiet.timezone,
                "Unparseable quiet-hours timezone"
            );
            return false;
        }
    };

    let local_time = now.with_timezone(&tz).format("%H:%M").to_string();
    in_window(&local_time, &quiet.start, &quiet.end)
}

/// Membership of `time` in `[start, end)` over `HH:MM` strings, wrapping
/// past midnight when `start > end`.
fn in_window(time: &str, start: &str, end: &str) -> bool {
    if start <= end {
        time >= start && time < end
    } else {
        time >= start || time < end
    }
}
