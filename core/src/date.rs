//! Date parsing for the fixed formats Simpy uses in its responses.
//!
//! # Design
//! The service emits `YYYY-MM-DD` for day-granularity fields and
//! `YYYY-MM-DD HH:MM` for minute-granularity ones, with no timezone
//! information. `SimpyDate` keeps the two shapes distinct instead of
//! collapsing everything into a midnight timestamp, so callers can tell
//! whether the time component was actually present.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// A naive date as found in Simpy responses, with or without a time part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpyDate {
    /// `YYYY-MM-DD` — no time component.
    Date(NaiveDate),
    /// `YYYY-MM-DD HH:MM` — minute precision, no seconds.
    DateTime(NaiveDateTime),
}

// Anchored at the start only: trailing text after a valid prefix is
// tolerated, matching how the service has historically been parsed.
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})( (\d{2}):(\d{2}))?").unwrap());

/// Parse a Simpy date string, returning `None` on any mismatch.
///
/// Out-of-range components (month 13, hour 25) also yield `None`; date
/// parsing never fails a surrounding parse operation.
pub fn parse_simpy_date(raw: &str) -> Option<SimpyDate> {
    let caps = DATE_RE.captures(raw)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    match caps.get(4) {
        Some(_) => {
            let hour: u32 = caps[5].parse().ok()?;
            let minute: u32 = caps[6].parse().ok()?;
            Some(SimpyDate::DateTime(date.and_hms_opt(hour, minute, 0)?))
        }
        None => Some(SimpyDate::Date(date)),
    }
}
