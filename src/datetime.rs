//! Date/time display helpers for Gator.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Default display format for timestamps.
pub const DEFAULT_FORMAT: &str = "%Y-%m-%d %H:%M %Z";

/// Format a DateTime<Utc> in the specified timezone.
///
/// Falls back to UTC when the timezone name is unknown.
pub fn format_utc_datetime(dt: &DateTime<Utc>, timezone: &str, format: &str) -> String {
    let tz: Tz = match timezone.parse() {
        Ok(tz) => tz,
        Err(_) => return dt.format(format).to_string(),
    };
    dt.with_timezone(&tz).format(format).to_string()
}

/// Format a DateTime<Utc> with the default format.
pub fn format_default(dt: &DateTime<Utc>, timezone: &str) -> String {
    format_utc_datetime(dt, timezone, DEFAULT_FORMAT)
}
