//! Timestamp parsing
//!
//! The API reports times such as `located-at` as ISO 8601 strings with an
//! offset (`2008-02-19T14:11:44-08:00`). Plain Unix timestamps are accepted
//! as well (seconds, or milliseconds when the value is too large for seconds).

use chrono::{DateTime, FixedOffset, Utc};

/// Parse an API timestamp, keeping its original offset.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    raw.parse::<i64>()
        .ok()
        .and_then(parse_unix_timestamp)
        .map(|dt| dt.fixed_offset())
}

/// Parse a Unix timestamp (seconds or milliseconds).
fn parse_unix_timestamp(ts: i64) -> Option<DateTime<Utc>> {
    if ts > 100_000_000_000 {
        DateTime::from_timestamp_millis(ts)
    } else {
        DateTime::from_timestamp(ts, 0)
    }
}
