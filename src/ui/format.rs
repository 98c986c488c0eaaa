//! Display formatting helpers shared by the dashboard views and the CLI.

use chrono::{DateTime, Duration, Utc};

/// Length of the mandatory DPB notification window.
pub const DPB_WINDOW_HOURS: i64 = 72;

/// Seconds left in the 72-hour DPB window, floored at zero once the
/// deadline has passed. `None` when the discovery timestamp is absent or
/// unparseable.
pub fn remaining_dpb_secs(discovery_time: &str, now: DateTime<Utc>) -> Option<i64> {
    let discovery = DateTime::parse_from_rfc3339(discovery_time).ok()?;
    let deadline = discovery.with_timezone(&Utc) + Duration::hours(DPB_WINDOW_HOURS);
    Some((deadline - now).num_seconds().max(0))
}

/// Render a second count as `HH:MM:SS`.
pub fn format_countdown(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Countdown string for the current moment, or `--:--:--` when no
/// discovery time is known.
pub fn dpb_countdown(discovery_time: Option<&str>) -> String {
    discovery_time
        .and_then(|t| remaining_dpb_secs(t, Utc::now()))
        .map(format_countdown)
        .unwrap_or_else(|| "--:--:--".to_string())
}

/// Truncate a string for table display, appending `...` when cut.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Shorten an ISO-8601 timestamp to its `HH:MM:SS` portion for timeline
/// rows; falls back to the raw string when it is too short.
pub fn short_time(ts: &str) -> &str {
    ts.get(11..19).unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_countdown_full_window_at_discovery() {
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 10, 0, 0).unwrap();
        let secs = remaining_dpb_secs("2026-08-30T10:00:00+00:00", now).unwrap();
        assert_eq!(format_countdown(secs), "72:00:00");
    }

    #[test]
    fn test_countdown_partially_elapsed() {
        let now = Utc.with_ymd_and_hms(2026, 8, 31, 11, 30, 15).unwrap();
        let secs = remaining_dpb_secs("2026-08-30T10:00:00+00:00", now).unwrap();
        assert_eq!(format_countdown(secs), "46:29:45");
    }

    #[test]
    fn test_countdown_floors_at_zero_after_deadline() {
        let now = Utc.with_ymd_and_hms(2026, 9, 10, 0, 0, 0).unwrap();
        let secs = remaining_dpb_secs("2026-08-30T10:00:00+00:00", now).unwrap();
        assert_eq!(secs, 0);
        assert_eq!(format_countdown(secs), "00:00:00");
    }

    #[test]
    fn test_unparseable_discovery_time() {
        assert!(remaining_dpb_secs("not a timestamp", Utc::now()).is_none());
        assert_eq!(dpb_countdown(None), "--:--:--");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer string", 10), "a much ...");
    }

    #[test]
    fn test_short_time() {
        assert_eq!(short_time("2026-08-30T10:15:42+00:00"), "10:15:42");
        assert_eq!(short_time("10:15"), "10:15");
    }
}
