//! Timestamp parsing and calendar features.

use crate::error::{Result, RoadcastError};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Accepted layouts once 'T' and 'Z' have been stripped.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

const NANOS_PER_DAY: f64 = 86_400.0 * 1e9;

/// chrono stores a leap second as `nanosecond() >= NANOS_PER_SECOND`.
const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Parses a dynamic-table timestamp.
///
/// `2012-03-01T00:05:00Z` is read as the naive instant `2012-03-01 00:05:00`:
/// the 'T' separator becomes a space and the 'Z' marker is dropped rather than
/// interpreted as a timezone.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let cleaned = raw.trim().replace('T', " ").replace('Z', "");

    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(&cleaned, format) {
            return Ok(ts);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&cleaned, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    Err(RoadcastError::Parse(format!("unrecognized timestamp `{}`", raw)))
}

/// Fraction of the day elapsed since midnight, in `[0, 1)`.
///
/// A leap second (`23:59:60`) counts as the preceding second.
#[inline]
pub fn time_of_day(ts: &NaiveDateTime) -> f64 {
    let subsec = ts.nanosecond() % NANOS_PER_SECOND;
    let nanos = ts.num_seconds_from_midnight() as f64 * 1e9 + subsec as f64;
    nanos / NANOS_PER_DAY
}

/// Day of the week, Monday = 0 through Sunday = 6.
#[inline]
pub fn day_of_week(ts: &NaiveDateTime) -> usize {
    ts.weekday().num_days_from_monday() as usize
}
