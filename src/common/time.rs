use std::fmt::Write;
use chrono::{DateTime, Utc};
use crate::common::types::Timestamp;
use crate::error::{ConvError, ConvResult};

pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Returns the time duration since UNIX_EPOCH in seconds.
pub fn current_time_seconds() -> i64 {
    Utc::now().timestamp()
}

/// Converts Prometheus API float seconds into a millisecond timestamp. Like Prometheus
/// `model.Time`, digits past the millisecond in the decimal form are dropped, not rounded.
pub fn seconds_to_timestamp(secs: f64) -> ConvResult<Timestamp> {
    let invalid = || ConvError::InvalidTimestamp(secs.to_string());
    if !secs.is_finite() {
        return Err(invalid());
    }
    // Display gives the shortest decimal text that reads back as `secs`
    let text = secs.abs().to_string();
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let whole: i64 = whole.parse().map_err(|_| invalid())?;
    let millis: String = frac.chars().chain(std::iter::repeat('0')).take(3).collect();
    let millis: i64 = millis.parse().map_err(|_| invalid())?;
    let ts = whole
        .checked_mul(1000)
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(invalid)?;
    Ok(if secs < 0.0 { -ts } else { ts })
}

fn to_date_time(secs: f64) -> ConvResult<DateTime<Utc>> {
    if !secs.is_finite() {
        return Err(ConvError::InvalidTimestamp(secs.to_string()));
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
        .ok_or_else(|| ConvError::InvalidTimestamp(secs.to_string()))
}

fn format_date_time(dt: &DateTime<Utc>, pattern: &str) -> ConvResult<String> {
    let mut out = String::new();
    // chrono reports unknown specifiers as a formatting error instead of a panic here
    write!(out, "{}", dt.format(pattern))
        .map_err(|_| ConvError::Generic(format!("invalid time format \"{pattern}\"")))?;
    Ok(out)
}

/// Formats seconds since the epoch as UTC using a strftime pattern.
pub fn format_unix_seconds(secs: f64, pattern: &str) -> ConvResult<String> {
    let dt = to_date_time(secs)?;
    format_date_time(&dt, pattern)
}

/// Formats the current UTC time using a strftime pattern.
pub fn format_now(pattern: &str) -> ConvResult<String> {
    format_date_time(&Utc::now(), pattern)
}
