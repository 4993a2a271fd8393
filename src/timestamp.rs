//! Human-readable timestamps in the archive's fixed display zone (US Central).

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::America::Chicago;

/// `2024-03-07 2:15PM`: zero-padded minutes, unpadded 12-hour clock.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %-I:%M%p";

/// Parse an ISO-8601 timestamp. A trailing `Z` is UTC; a value without any
/// offset is also taken as UTC.
pub fn parse_iso(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(ts, fmt).ok())
        .map(|naive| naive.and_utc())
}

pub fn to_display(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Chicago).format(DISPLAY_FORMAT).to_string()
}

/// Format an API timestamp for display. Input that does not parse is logged
/// and passed through unchanged so a single odd value never drops a record.
pub fn format_timestamp(ts: &str) -> String {
    match parse_iso(ts) {
        Some(dt) => to_display(dt),
        None => {
            log::warn!("Could not parse timestamp {:?}; keeping it verbatim", ts);
            ts.to_string()
        }
    }
}

/// Timestamp stamped on every entry of one archive run.
pub fn run_timestamp() -> String {
    to_display(Utc::now())
}
