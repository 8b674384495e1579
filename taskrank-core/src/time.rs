//! Time utilities: due-date parsing and time-zone aware "today".
//!
//! Due dates are parsed against a fixed allowlist of formats. Anything outside
//! the allowlist is reported as `None`, never as an error.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::task::DueDate;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Resolve a caller-supplied due date to a calendar date.
pub fn parse_due_date(raw: &DueDate) -> Option<NaiveDate> {
    match raw {
        DueDate::Date(d) => Some(*d),
        DueDate::Text(s) => parse_date_str(s),
        DueDate::Other(_) => None,
    }
}

/// Parse a date string against the accepted formats.
///
/// RFC 3339 timestamps keep the calendar date as written, without converting
/// the offset to UTC.
pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(d) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Some(d);
    }

    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.date());
    }

    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Whole days from `today` until `due` (negative when overdue).
pub fn days_until(due: NaiveDate, today: NaiveDate) -> i64 {
    (due - today).num_days()
}

/// Parse an IANA time zone name like "America/Chicago".
pub fn parse_timezone(tz: &str) -> Result<Tz> {
    tz.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

/// The calendar date in `tz` at instant `now`.
pub fn today_in(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// The caller's current date in the named time zone.
pub fn local_today(tz: &str) -> Result<NaiveDate> {
    Ok(today_in(parse_timezone(tz)?, Utc::now()))
}
