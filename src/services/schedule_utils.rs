//! Interval arithmetic shared by the workload, conflict and analyzer passes.
//!
//! Clock times are `"HH:MM"` strings; timestamps are RFC 3339. All minute-level
//! comparisons assume both intervals fall on the same calendar day, which the
//! caller checks first with [`same_day`].

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, AppResult};
use crate::models::availability::Weekday;

static CLOCK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("clock pattern must compile")
});

/// Parses `"HH:MM"` into minutes since midnight.
pub fn parse_clock(value: &str) -> AppResult<i64> {
    let captures = CLOCK_PATTERN
        .captures(value.trim())
        .ok_or_else(|| AppError::invalid_format(format!("expected HH:MM clock time, got `{value}`")))?;

    let hours: i64 = captures[1]
        .parse()
        .map_err(|_| AppError::invalid_format(format!("invalid hour in `{value}`")))?;
    let minutes: i64 = captures[2]
        .parse()
        .map_err(|_| AppError::invalid_format(format!("invalid minute in `{value}`")))?;

    Ok(hours * 60 + minutes)
}

pub fn format_clock(total_minutes: i64) -> String {
    let clamped = total_minutes.clamp(0, 24 * 60 - 1);
    format!("{:02}:{:02}", clamped / 60, clamped % 60)
}

/// Half-open overlap test with interval B widened by `buffer_minutes` on both ends.
///
/// Symmetric in A and B for any buffer, and monotone in the buffer.
pub fn overlaps(a_start: i64, a_end: i64, b_start: i64, b_end: i64, buffer_minutes: i64) -> bool {
    let buffer = buffer_minutes.max(0);
    a_start < b_end + buffer && a_end > b_start - buffer
}

/// `true` when `[inner_start, inner_end)` lies entirely inside `[outer_start, outer_end)`.
pub fn contains(outer_start: i64, outer_end: i64, inner_start: i64, inner_end: i64) -> bool {
    inner_start >= outer_start && inner_end <= outer_end
}

pub fn parse_datetime(value: &str) -> AppResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|err| AppError::invalid_format(format!("invalid timestamp `{value}`: {err}")))
}

pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| AppError::invalid_format(format!("invalid date `{value}`: {err}")))
}

pub fn minutes_of_day(dt: DateTime<FixedOffset>) -> i64 {
    let time = dt.time();
    (time.hour() as i64) * 60 + (time.minute() as i64)
}

pub fn same_day(a: DateTime<FixedOffset>, b: DateTime<FixedOffset>) -> bool {
    a.date_naive() == b.date_naive()
}

pub fn weekday_of(dt: DateTime<FixedOffset>) -> Weekday {
    Weekday::from(chrono::Datelike::weekday(&dt))
}

/// Whole weeks spanned by a date range, rounded up. Inverted ranges count as zero.
pub fn weeks_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let days = end.signed_duration_since(start).num_days();
    if days <= 0 {
        0
    } else {
        (days + 6) / 7
    }
}
