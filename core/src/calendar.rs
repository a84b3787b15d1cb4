//! Calendar days and day intervals.
//!
//! Everything inside the core works on [`CalendarDate`]s, never on instants.
//! External representations (offset date-times from the server, strings from
//! a form) are converted once at the edge.

use chrono::{DateTime, Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar day without time or time zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// Build a date from year, month and day; `None` if it does not exist.
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Wrap a `chrono` date.
    #[must_use]
    pub const fn from_naive(date: NaiveDate) -> Self {
        Self(date)
    }

    /// The calendar day an instant falls on, in the instant's own offset.
    ///
    /// A booking stored as `2024-07-01T00:00:00+02:00` is the 1st of July no
    /// matter which zone the caller runs in.
    #[must_use]
    pub fn from_instant<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self(instant.date_naive())
    }

    /// The underlying `chrono` date.
    #[must_use]
    pub const fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// The following day.
    #[must_use]
    pub fn succ(self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    /// This date moved forward by `days`.
    #[must_use]
    pub fn add_days(self, days: u64) -> Option<Self> {
        self.0.checked_add_days(Days::new(days)).map(Self)
    }

    /// Signed number of days from `self` to `other`.
    #[must_use]
    pub fn days_until(self, other: Self) -> i64 {
        other.0.signed_duration_since(self.0).num_days()
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for CalendarDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Self)
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

/// A closed day interval `[start, end]`.
///
/// Both endpoints belong to the interval. An interval whose `end` precedes
/// its `start` contains no days.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateInterval {
    /// First day
    pub start: CalendarDate,
    /// Last day (inclusive)
    pub end: CalendarDate,
}

impl DateInterval {
    /// Create an interval from its endpoints.
    #[must_use]
    pub const fn new(start: CalendarDate, end: CalendarDate) -> Self {
        Self { start, end }
    }

    /// Whether `date` lies within `[start, end]`.
    #[must_use]
    pub fn contains(&self, date: CalendarDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every day from `start` to `end`, inclusive, in order.
    pub fn days(&self) -> impl Iterator<Item = CalendarDate> + use<> {
        let end = self.end;
        std::iter::successors(Some(self.start).filter(|d| *d <= end), move |d| {
            d.succ().filter(|next| *next <= end)
        })
    }

    /// Whole nights between `start` and `end` (the end day is not a night).
    #[must_use]
    pub fn nights(&self) -> u32 {
        u32::try_from(self.start.days_until(self.end).max(0)).unwrap_or(u32::MAX)
    }
}

impl fmt::Display for DateInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use proptest::prelude::*;

    fn date(s: &str) -> CalendarDate {
        s.parse().unwrap()
    }

    #[test]
    fn days_cross_year_boundary() {
        let interval = DateInterval::new(date("2024-12-30"), date("2025-01-02"));
        let days: Vec<String> = interval.days().map(|d| d.to_string()).collect();
        assert_eq!(
            days,
            vec!["2024-12-30", "2024-12-31", "2025-01-01", "2025-01-02"]
        );
    }

    #[test]
    fn days_cross_leap_day() {
        let interval = DateInterval::new(date("2024-02-28"), date("2024-03-01"));
        assert_eq!(interval.days().count(), 3);
    }

    #[test]
    fn single_day_interval_has_one_day_and_no_nights() {
        let interval = DateInterval::new(date("2024-06-01"), date("2024-06-01"));
        assert_eq!(interval.days().count(), 1);
        assert_eq!(interval.nights(), 0);
    }

    #[test]
    fn reversed_interval_is_empty() {
        let interval = DateInterval::new(date("2024-06-05"), date("2024-06-01"));
        assert_eq!(interval.days().count(), 0);
        assert_eq!(interval.nights(), 0);
        assert!(!interval.contains(date("2024-06-03")));
    }

    #[test]
    fn from_instant_uses_instant_offset() {
        let offset = FixedOffset::east_opt(10 * 3600).unwrap();
        let instant = offset.with_ymd_and_hms(2024, 7, 1, 1, 0, 0).unwrap();
        // Still June 30th in UTC, but the booking was made for July 1st.
        assert_eq!(CalendarDate::from_instant(&instant), date("2024-07-01"));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("2024-13-01".parse::<CalendarDate>().is_err());
        assert!("not a date".parse::<CalendarDate>().is_err());
    }

    proptest! {
        #[test]
        fn days_match_nights(offset in 0_u64..3_000, len in 0_u64..90) {
            let start = date("2024-01-01").add_days(offset).unwrap();
            let interval = DateInterval::new(start, start.add_days(len).unwrap());
            let days: Vec<CalendarDate> = interval.days().collect();
            prop_assert_eq!(days.len() as u64, u64::from(interval.nights()) + 1);
            prop_assert!(days.iter().all(|d| interval.contains(*d)));
        }
    }
}
