//! Availability engine.
//!
//! Pure functions over calendar days: which days are taken, whether a
//! requested stay is bookable, and what it costs.
//!
//! Reserved intervals and candidate stays are closed: both the first and the
//! last day count as occupied. A stay that ends on the day another starts
//! therefore overlaps it. Nights are counted end-exclusive, so a stay from
//! the 1st to the 4th is three nights.

use serde::{Deserialize, Serialize};
use stayflow_core::calendar::{CalendarDate, DateInterval};
use stayflow_core::money::Money;
use std::collections::BTreeSet;
use thiserror::Error;

/// Why a candidate stay cannot be booked.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Start or end day not chosen yet
    #[error("Both a start and an end date are required")]
    MissingEndpoint,

    /// Start and end on the same day
    #[error("A stay must last at least one night")]
    ZeroLength,

    /// End before start
    #[error("End date {end} is before start date {start}")]
    EndBeforeStart {
        /// Chosen start
        start: CalendarDate,
        /// Chosen end
        end: CalendarDate,
    },

    /// Start in the past
    #[error("Start date {start} is before today ({today})")]
    Retroactive {
        /// Chosen start
        start: CalendarDate,
        /// Current day
        today: CalendarDate,
    },

    /// At least one day is already reserved
    #[error("{date} is already booked")]
    Overlaps {
        /// First reserved day inside the stay
        date: CalendarDate,
    },
}

/// Set of reserved days.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedDates(BTreeSet<CalendarDate>);

impl BlockedDates {
    /// No blocked days
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Whether `date` is reserved
    #[must_use]
    pub fn contains(&self, date: CalendarDate) -> bool {
        self.0.contains(&date)
    }

    /// Number of reserved days
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is reserved
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reserved days in ascending order
    pub fn iter(&self) -> impl Iterator<Item = CalendarDate> + '_ {
        self.0.iter().copied()
    }

    /// Earliest reserved day inside `interval`, if any
    #[must_use]
    pub fn first_within(&self, interval: &DateInterval) -> Option<CalendarDate> {
        if interval.end < interval.start {
            return None;
        }
        self.0.range(interval.start..=interval.end).next().copied()
    }
}

impl FromIterator<CalendarDate> for BlockedDates {
    fn from_iter<I: IntoIterator<Item = CalendarDate>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<CalendarDate> for BlockedDates {
    fn extend<I: IntoIterator<Item = CalendarDate>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

/// Every day of every reserved interval, inclusive of both ends.
///
/// Order of `reserved` and duplicates do not matter.
#[must_use]
pub fn blocked_dates(reserved: &[DateInterval]) -> BlockedDates {
    reserved.iter().flat_map(DateInterval::days).collect()
}

/// A stay as picked in a date selector, possibly incomplete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRange {
    /// First day
    pub start: Option<CalendarDate>,
    /// Last day
    pub end: Option<CalendarDate>,
}

impl CandidateRange {
    /// A complete candidate
    #[must_use]
    pub const fn new(start: CalendarDate, end: CalendarDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Candidate from a range picker selection.
    ///
    /// Anything but exactly two entries leaves the end missing.
    #[must_use]
    pub fn from_selection(selection: &[Option<CalendarDate>]) -> Self {
        match selection {
            [start, end] => Self {
                start: *start,
                end: *end,
            },
            [start, ..] => Self {
                start: *start,
                end: None,
            },
            [] => Self::default(),
        }
    }
}

impl From<DateInterval> for CandidateRange {
    fn from(interval: DateInterval) -> Self {
        Self::new(interval.start, interval.end)
    }
}

/// Check a candidate stay against the reserved days.
///
/// # Errors
///
/// Returns the first rule the candidate breaks, checked in this order:
/// missing endpoint, zero length, end before start, start before `today`,
/// overlap with a reserved day.
pub fn validate_candidate(
    candidate: &CandidateRange,
    blocked: &BlockedDates,
    today: CalendarDate,
) -> Result<DateInterval, ValidationError> {
    let (Some(start), Some(end)) = (candidate.start, candidate.end) else {
        return Err(ValidationError::MissingEndpoint);
    };
    if start == end {
        return Err(ValidationError::ZeroLength);
    }
    if end < start {
        return Err(ValidationError::EndBeforeStart { start, end });
    }
    if start < today {
        return Err(ValidationError::Retroactive { start, today });
    }
    let interval = DateInterval::new(start, end);
    if let Some(date) = blocked.first_within(&interval) {
        return Err(ValidationError::Overlaps { date });
    }
    Ok(interval)
}

/// Whether [`validate_candidate`] accepts the candidate
#[must_use]
pub fn is_valid_candidate(
    candidate: &CandidateRange,
    blocked: &BlockedDates,
    today: CalendarDate,
) -> bool {
    validate_candidate(candidate, blocked, today).is_ok()
}

/// Whole nights from `start` to `end`; 0 unless `end` is after `start`.
#[must_use]
pub fn nights_between(start: CalendarDate, end: CalendarDate) -> u32 {
    DateInterval::new(start, end).nights()
}

/// Price of a stay at `nightly_rate`, saturating at the maximum amount.
#[must_use]
pub fn price(interval: &DateInterval, nightly_rate: Money) -> Money {
    nightly_rate.saturating_multiply(nights_between(interval.start, interval.end))
}

/// A priced, bookable stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Validated stay
    pub interval: DateInterval,
    /// Nights charged
    pub nights: u32,
    /// Total price
    pub total: Money,
}

/// Reserved intervals of one listing with their expanded day set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Availability {
    reserved: Vec<DateInterval>,
    blocked: BlockedDates,
}

impl Availability {
    /// Availability from reserved intervals
    #[must_use]
    pub fn new(reserved: Vec<DateInterval>) -> Self {
        let blocked = blocked_dates(&reserved);
        Self { reserved, blocked }
    }

    /// Reserved intervals as received
    #[must_use]
    pub fn reserved(&self) -> &[DateInterval] {
        &self.reserved
    }

    /// Reserved days
    #[must_use]
    pub const fn blocked(&self) -> &BlockedDates {
        &self.blocked
    }

    /// Whether `date` is reserved
    #[must_use]
    pub fn is_blocked(&self, date: CalendarDate) -> bool {
        self.blocked.contains(date)
    }

    /// Validate a candidate against this listing
    ///
    /// # Errors
    ///
    /// See [`validate_candidate`].
    pub fn check(
        &self,
        candidate: &CandidateRange,
        today: CalendarDate,
    ) -> Result<DateInterval, ValidationError> {
        validate_candidate(candidate, &self.blocked, today)
    }

    /// Validate and price a candidate
    ///
    /// # Errors
    ///
    /// See [`validate_candidate`].
    pub fn quote(
        &self,
        candidate: &CandidateRange,
        nightly_rate: Money,
        today: CalendarDate,
    ) -> Result<Quote, ValidationError> {
        let interval = self.check(candidate, today)?;
        Ok(Quote {
            interval,
            nights: nights_between(interval.start, interval.end),
            total: price(&interval, nightly_rate),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    fn d(year: i32, month: u32, day: u32) -> CalendarDate {
        CalendarDate::from_ymd(year, month, day).unwrap()
    }

    fn iv(start: CalendarDate, end: CalendarDate) -> DateInterval {
        DateInterval::new(start, end)
    }

    #[test]
    fn expands_across_year_boundary() {
        let blocked = blocked_dates(&[iv(d(2024, 12, 30), d(2025, 1, 2))]);
        let days: Vec<_> = blocked.iter().collect();
        assert_eq!(
            days,
            vec![d(2024, 12, 30), d(2024, 12, 31), d(2025, 1, 1), d(2025, 1, 2)]
        );
    }

    #[test]
    fn single_day_interval_blocks_one_day() {
        let blocked = blocked_dates(&[iv(d(2024, 2, 29), d(2024, 2, 29))]);
        assert_eq!(blocked.len(), 1);
        assert!(blocked.contains(d(2024, 2, 29)));
    }

    #[test]
    fn no_reservations_block_nothing() {
        assert!(blocked_dates(&[]).is_empty());
    }

    #[test]
    fn missing_endpoint_is_invalid() {
        let today = d(2024, 1, 1);
        let candidate = CandidateRange::from_selection(&[Some(d(2024, 2, 1))]);
        assert_eq!(
            validate_candidate(&candidate, &BlockedDates::new(), today),
            Err(ValidationError::MissingEndpoint)
        );
        let candidate = CandidateRange::from_selection(&[Some(d(2024, 2, 1)), None]);
        assert!(!is_valid_candidate(&candidate, &BlockedDates::new(), today));
    }

    #[test]
    fn zero_length_is_invalid() {
        let day = d(2024, 2, 1);
        assert_eq!(
            validate_candidate(&CandidateRange::new(day, day), &BlockedDates::new(), d(2024, 1, 1)),
            Err(ValidationError::ZeroLength)
        );
    }

    #[test]
    fn reversed_is_invalid() {
        let result = validate_candidate(
            &CandidateRange::new(d(2024, 2, 5), d(2024, 2, 1)),
            &BlockedDates::new(),
            d(2024, 1, 1),
        );
        assert!(matches!(result, Err(ValidationError::EndBeforeStart { .. })));
    }

    #[test]
    fn past_start_is_invalid_but_today_is_fine() {
        let today = d(2024, 3, 10);
        let blocked = BlockedDates::new();
        assert!(matches!(
            validate_candidate(&CandidateRange::new(d(2024, 3, 9), d(2024, 3, 12)), &blocked, today),
            Err(ValidationError::Retroactive { .. })
        ));
        assert!(is_valid_candidate(
            &CandidateRange::new(today, d(2024, 3, 12)),
            &blocked,
            today
        ));
    }

    #[test]
    fn touching_a_reservation_on_either_end_overlaps() {
        let blocked = blocked_dates(&[iv(d(2024, 7, 1), d(2024, 7, 3)), iv(d(2024, 7, 10), d(2024, 7, 12))]);
        let result = validate_candidate(
            &CandidateRange::new(d(2024, 7, 3), d(2024, 7, 10)),
            &blocked,
            d(2024, 6, 1),
        );
        assert_eq!(result, Err(ValidationError::Overlaps { date: d(2024, 7, 3) }));
    }

    #[test]
    fn gap_between_reservations_is_bookable() {
        let blocked = blocked_dates(&[iv(d(2024, 7, 1), d(2024, 7, 3)), iv(d(2024, 7, 10), d(2024, 7, 12))]);
        assert!(is_valid_candidate(
            &CandidateRange::new(d(2024, 7, 4), d(2024, 7, 9)),
            &blocked,
            d(2024, 6, 1)
        ));
    }

    #[test]
    fn three_nights_at_one_hundred() {
        let stay = iv(d(2024, 6, 1), d(2024, 6, 4));
        assert_eq!(nights_between(stay.start, stay.end), 3);
        assert_eq!(price(&stay, Money::from_minor(100)), Money::from_minor(300));
    }

    #[test]
    fn nights_are_zero_when_not_positive() {
        assert_eq!(nights_between(d(2024, 6, 4), d(2024, 6, 1)), 0);
        assert_eq!(nights_between(d(2024, 6, 4), d(2024, 6, 4)), 0);
    }

    #[test]
    fn price_saturates() {
        let stay = iv(d(2024, 1, 1), d(2024, 1, 3));
        assert_eq!(price(&stay, Money::from_minor(u64::MAX)), Money::from_minor(u64::MAX));
    }

    #[test]
    fn quote_bundles_nights_and_total() {
        let availability = Availability::new(vec![iv(d(2024, 7, 1), d(2024, 7, 3))]);
        assert!(availability.is_blocked(d(2024, 7, 2)));
        assert_eq!(availability.reserved().len(), 1);

        let quote = availability
            .quote(
                &CandidateRange::new(d(2024, 7, 5), d(2024, 7, 8)),
                Money::from_major(80),
                d(2024, 6, 1),
            )
            .unwrap();
        assert_eq!(quote.nights, 3);
        assert_eq!(quote.total, Money::from_major(240));
    }
}
