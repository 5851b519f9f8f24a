//! Server clock and day keys
//!
//! Every entry is filed under a calendar day in one fixed timezone,
//! regardless of where the client happens to be. All instants originate
//! here; client-supplied timestamps are never accepted.

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Utc;
use chrono_tz::Tz;

/// The timezone all day keys are anchored to
pub const JOURNAL_TZ: Tz = chrono_tz::Asia::Seoul;

/// A single clock sample, exposing both the instant and its day key
///
/// Both values derive from one reading of the clock: an entry written just
/// before midnight can not end up with a day key that disagrees with its
/// stored creation instant.
#[derive(Clone, Copy, Debug)]
pub struct Stamp {
    /// The sampled instant
    instant: DateTime<Utc>,
}

impl Stamp {
    /// Sample the clock once
    pub fn now() -> Self {
        Self {
            instant: Utc::now(),
        }
    }

    /// The instant, as stored in the database
    pub fn instant(&self) -> NaiveDateTime {
        self.instant.naive_utc()
    }

    /// The calendar day this instant falls on in [`JOURNAL_TZ`]
    pub fn day_key(&self) -> NaiveDate {
        self.instant.with_timezone(&JOURNAL_TZ).date_naive()
    }
}

/// The current day key
pub fn today() -> NaiveDate {
    Stamp::now().day_key()
}

/// Is the given day key the current one?
pub fn is_today(day: NaiveDate) -> bool {
    day == today()
}

/// First and last day of a month
///
/// Both bounds are inclusive, ready for a `BETWEEN` range over stored day
/// keys.
pub fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;

    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };

    Some((start, first_of_next.pred_opt()?))
}

/// Parse a `YYYY-MM-DD` day key
///
/// Strict about the format: the parsed date must render back to the exact
/// input, so `2024-1-5` is rejected.
pub fn parse_day(input: &str) -> Option<NaiveDate> {
    let day = NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()?;

    if day.format("%Y-%m-%d").to_string() == input {
        Some(day)
    } else {
        None
    }
}

/// Parse a `YYYY-MM` month into its (year, month) pair
pub fn parse_month(input: &str) -> Option<(i32, u32)> {
    let (year, month) = input.split_once('-')?;

    if year.len() != 4 || month.len() != 2 {
        return None;
    }

    let year = year.parse::<i32>().ok()?;
    let month = month.parse::<u32>().ok()?;

    if (1..=12).contains(&month) {
        Some((year, month))
    } else {
        None
    }
}
