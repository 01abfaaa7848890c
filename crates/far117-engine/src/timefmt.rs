//! Hour/minute arithmetic and display helpers.
//!
//! Two families live here:
//!
//! - Lenient parsers ([`parse_hhmm_minutes`], [`parse_utc_timestamp`]) used on
//!   roster data coming from the schedule store. They never fail: malformed
//!   input yields `0` or `None` and the caller skips it.
//! - Strict parsers ([`parse_instant`], [`parse_clock`], [`parse_block_time`])
//!   for values typed by a user, which return [`Far117Error::InvalidDatetime`]
//!   or [`Far117Error::InvalidTime`].

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike, Utc};

use crate::error::{Far117Error, Result};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Round to one decimal place (the precision every hour value is shown at).
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Render fractional hours as `"{H}h {MM}m"`.
///
/// The sign is dropped. Minutes are rounded to the nearest whole minute and a
/// rounded value of 60 carries into the hour, so `9.999` renders as
/// `"10h 00m"` rather than `"9h 60m"`.
///
/// # Examples
///
/// ```
/// use far117_engine::timefmt::format_fdp_time;
///
/// assert_eq!(format_fdp_time(13.75), "13h 45m");
/// assert_eq!(format_fdp_time(9.999), "10h 00m");
/// ```
pub fn format_fdp_time(hours: f64) -> String {
    let total_minutes = (hours.abs() * 60.0).round() as i64;
    let h = total_minutes / 60;
    let m = total_minutes % 60;
    format!("{h}h {m:02}m")
}

/// Add a fractional number of hours to a local `(hour, minute)` clock time.
///
/// The offset is rounded to the nearest minute before adding. The result is
/// wrapped into `00:00..24:00` and gets a `" +1d"` suffix once the sum reaches
/// midnight.
///
/// # Examples
///
/// ```
/// use far117_engine::timefmt::add_hours_to_time;
///
/// assert_eq!(add_hours_to_time(22, 0, 10.0), "08:00 +1d");
/// assert_eq!(add_hours_to_time(7, 30, 2.5), "10:00");
/// ```
pub fn add_hours_to_time(hour: i32, minute: i32, add_hours: f64) -> String {
    let offset = (add_hours * 60.0).round() as i64;
    let total = (i64::from(hour) * 60 + i64::from(minute)).saturating_add(offset);
    let next_day = total >= MINUTES_PER_DAY;
    let wrapped = total.rem_euclid(MINUTES_PER_DAY);
    let suffix = if next_day { " +1d" } else { "" };
    format!("{:02}:{:02}{suffix}", wrapped / 60, wrapped % 60)
}

/// Parse an `"H:MM"` duration string into minutes, leniently.
///
/// Anything that is not exactly two integer fields separated by `:`, or that
/// overflows `i64` minutes, counts as zero minutes.
pub fn parse_hhmm_minutes(value: &str) -> i64 {
    let mut parts = value.trim().split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(m), None) => match (h.trim().parse::<i64>(), m.trim().parse::<i64>()) {
            (Ok(h), Ok(m)) => h.checked_mul(60).and_then(|v| v.checked_add(m)).unwrap_or(0),
            _ => 0,
        },
        _ => 0,
    }
}

/// Same as [`parse_hhmm_minutes`] for optional roster fields.
pub(crate) fn optional_minutes(value: Option<&str>) -> i64 {
    value.map(parse_hhmm_minutes).unwrap_or(0)
}

/// Parse a roster timestamp into UTC, leniently.
///
/// Accepts RFC 3339 (`2026-02-15T18:35:00Z`, `...-07:00`) and naive ISO
/// datetimes (`2026-02-15T18:35[:00]`), which are taken to be UTC already.
pub fn parse_utc_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Strict form of [`parse_utc_timestamp`] for instants typed by a user.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    parse_utc_timestamp(value).ok_or_else(|| {
        Far117Error::InvalidDatetime(format!(
            "'{value}': expected RFC 3339, e.g. 2026-03-10T15:00:00Z"
        ))
    })
}

/// Parse a strict `HH:MM` local clock time into `(hour, minute)`.
pub fn parse_clock(value: &str) -> Result<(i32, i32)> {
    let time = NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| Far117Error::InvalidTime(format!("'{value}': {e}")))?;
    Ok((time.hour() as i32, time.minute() as i32))
}

/// Parse a strict `H:MM` block time into `(hours, minutes)`.
///
/// Unlike [`parse_clock`] the hour field is not capped at 23.
pub fn parse_block_time(value: &str) -> Result<(i32, i32)> {
    let invalid = || Far117Error::InvalidTime(format!("'{value}': expected H:MM"));
    let (h, m) = value.trim().split_once(':').ok_or_else(invalid)?;
    let hours: i32 = h.parse().map_err(|_| invalid())?;
    let minutes: i32 = m.parse().map_err(|_| invalid())?;
    if hours < 0 || !(0..60).contains(&minutes) || m.len() != 2 {
        return Err(invalid());
    }
    Ok((hours, minutes))
}
