//! Date and time encodings required by the parking API.
//!
//! The backend accepts three fixed string shapes:
//!
//! * date only: `2025-8-9` (month and day unpadded)
//! * time only: `1:39 PM` (12-hour, minute padded, uppercase meridiem)
//! * apply time: `2025-8-9 1:40 pm` (same parts, lowercase meridiem)

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{Error, Result};

/// `YEAR-MONTH-DAY` without leading zeros
pub fn format_date_only<T: Datelike>(t: &T) -> String {
    format!("{}-{}-{}", t.year(), t.month(), t.day())
}

/// `H:MM AM|PM`
pub fn format_time_ampm<T: Timelike>(t: &T) -> String {
    let (pm, hour) = t.hour12();
    format!("{}:{:02} {}", hour, t.minute(), if pm { "PM" } else { "AM" })
}

/// `YEAR-MONTH-DAY H:MM am|pm`; the meridiem is lowercase here
pub fn format_apply_time<T: Datelike + Timelike>(t: &T) -> String {
    let (pm, hour) = t.hour12();
    format!(
        "{} {}:{:02} {}",
        format_date_only(t),
        hour,
        t.minute(),
        if pm { "pm" } else { "am" }
    )
}

/// Date value for the draft's date field (`YYYY-MM-DD`)
pub fn draft_date(t: &NaiveDateTime) -> String {
    t.format("%Y-%m-%d").to_string()
}

/// Time value for the draft's time field (`HH:MM`, 24-hour)
pub fn draft_time(t: &NaiveDateTime) -> String {
    t.format("%H:%M").to_string()
}

fn component(part: Option<&str>) -> Option<u32> {
    part.map(str::trim)
        .and_then(|p| p.parse::<u32>().ok())
        .filter(|n| *n != 0)
}

/// Parse the draft's `YYYY-MM-DD` date and `HH:MM` time into a local
/// wall-clock value.
///
/// A missing month or day defaults to 1 and a missing hour or minute to 0.
/// The year is required and out-of-range components are rejected.
pub fn parse_start(date: &str, time: &str) -> Result<NaiveDateTime> {
    let mut date_parts = date.trim().split('-');
    let year = date_parts
        .next()
        .map(str::trim)
        .and_then(|y| y.parse::<i32>().ok())
        .ok_or_else(|| Error::validation(format!("Invalid start date: {:?}", date)))?;
    let month = component(date_parts.next()).unwrap_or(1);
    let day = component(date_parts.next()).unwrap_or(1);

    let mut time_parts = time.trim().split(':');
    let hour = component(time_parts.next()).unwrap_or(0);
    let minute = component(time_parts.next()).unwrap_or(0);

    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::validation(format!("Invalid start date: {:?}", date)))?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| Error::validation(format!("Invalid start time: {:?}", time)))?;

    Ok(date.and_time(time))
}

/// Source of the current local wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The system's local clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock stuck at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
