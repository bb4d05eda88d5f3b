//! Time utilities: local rendering of timestamps, elapsed durations, etc.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Duration, Local, Utc};

pub fn local_hhmm(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M").to_string()
}

pub fn local_datetime(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Whole minutes from `since` to `now`, never negative.
pub fn elapsed_minutes(since: &DateTime<Utc>, now: &DateTime<Utc>) -> i64 {
    (*now - *since).num_minutes().max(0)
}

/// Render seconds as `1h 05m 12s` / `5m 12s` / `12s`.
pub fn format_seconds(secs: i64) -> String {
    let s = secs.max(0);
    let (h, m, s) = (s / 3600, (s % 3600) / 60, s % 60);
    if h > 0 {
        format!("{}h {:02}m {:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m {:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}

/// Minutes as a `Duration`, refusing values chrono cannot represent.
pub fn minutes(m: i64) -> AppResult<Duration> {
    Duration::try_minutes(m)
        .ok_or_else(|| AppError::Validation(format!("{} minutes is out of range", m)))
}
