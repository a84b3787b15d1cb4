//! # Stayflow Testing
//!
//! Testing utilities and helpers for Stayflow view models.
//!
//! This crate provides:
//! - Mock implementations of environment traits
//! - Recording collaborators for notifications and reaction failures
//! - Property-based testing strategies for calendar types
//! - The `ReducerTest` Given-When-Then builder
//!
//! ## Example
//!
//! ```ignore
//! use stayflow_testing::{test_calendar, RecordingNotifier};
//!
//! #[test]
//! fn rejects_past_dates() {
//!     let notifier = RecordingNotifier::new();
//!     let view_model = BookDate::new(&scheduler, env, notifier.clone());
//!     // ...
//!     assert_eq!(notifier.len(), 1);
//! }
//! ```

use stayflow_core::calendar::CalendarDate;
use stayflow_core::environment::Calendar;


/// Mock implementations for testing.
pub mod mocks {
    use super::{Calendar, CalendarDate};
    use stayflow_core::environment::Notifier;
    use stayflow_core::notification::{Notification, Severity};
    use stayflow_runtime::sink::{ErrorSink, ReactionFailure};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Fixed calendar for deterministic tests
    ///
    /// Returns the same day until moved with [`set`](Self::set).
    ///
    /// # Example
    ///
    /// ```
    /// use stayflow_testing::mocks::FixedCalendar;
    /// use stayflow_testing::date;
    /// use stayflow_core::environment::Calendar;
    ///
    /// let calendar = FixedCalendar::new(date(2025, 1, 1));
    /// assert_eq!(calendar.today(), calendar.today());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedCalendar {
        today: Rc<Cell<CalendarDate>>,
    }

    impl FixedCalendar {
        /// Create a calendar fixed at `today`
        #[must_use]
        pub fn new(today: CalendarDate) -> Self {
            Self {
                today: Rc::new(Cell::new(today)),
            }
        }

        /// Move every clone of this calendar to `today`
        pub fn set(&self, today: CalendarDate) {
            self.today.set(today);
        }
    }

    impl Calendar for FixedCalendar {
        fn today(&self) -> CalendarDate {
            self.today.get()
        }
    }

    /// Create a default fixed calendar for tests (2025-01-01)
    #[must_use]
    pub fn test_calendar() -> FixedCalendar {
        FixedCalendar::new(super::date(2025, 1, 1))
    }

    /// Notifier that keeps every notification
    #[derive(Debug, Clone, Default)]
    pub struct RecordingNotifier {
        sent: Rc<RefCell<Vec<Notification>>>,
    }

    impl RecordingNotifier {
        /// Empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Everything sent so far
        #[must_use]
        pub fn sent(&self) -> Vec<Notification> {
            self.sent.borrow().clone()
        }

        /// Number of notifications sent
        #[must_use]
        pub fn len(&self) -> usize {
            self.sent.borrow().len()
        }

        /// Whether nothing was sent
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.sent.borrow().is_empty()
        }

        /// Number of notifications with the given severity
        #[must_use]
        pub fn count(&self, severity: Severity) -> usize {
            self.sent
                .borrow()
                .iter()
                .filter(|n| n.severity == severity)
                .count()
        }

        /// Forget everything recorded
        pub fn clear(&self) {
            self.sent.borrow_mut().clear();
        }
    }

    impl Notifier for RecordingNotifier {
        fn send(&self, notification: Notification) {
            self.sent.borrow_mut().push(notification);
        }
    }

    /// Error sink that keeps every reaction failure
    #[derive(Debug, Clone, Default)]
    pub struct RecordingSink {
        failures: Rc<RefCell<Vec<ReactionFailure>>>,
    }

    impl RecordingSink {
        /// Empty recorder
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Everything reported so far
        #[must_use]
        pub fn failures(&self) -> Vec<ReactionFailure> {
            self.failures.borrow().clone()
        }
    }

    impl ErrorSink for RecordingSink {
        fn report(&self, failure: &ReactionFailure) {
            self.failures.borrow_mut().push(failure.clone());
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    use stayflow_runtime::{RuntimeConfig, Scheduler};
    use std::rc::Rc;

    use super::mocks::RecordingSink;

    /// Install a `tracing` subscriber honouring `RUST_LOG`, once per process.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    /// Scheduler whose reaction failures land in the returned sink
    #[must_use]
    pub fn recording_scheduler() -> (Scheduler, RecordingSink) {
        let sink = RecordingSink::new();
        let scheduler = Scheduler::with_config(RuntimeConfig::default(), Rc::new(sink.clone()));
        (scheduler, sink)
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;
    use stayflow_core::calendar::{CalendarDate, DateInterval};

    /// Days between 2024-01-01 and roughly the end of 2026
    ///
    /// # Panics
    ///
    /// Never in practice: every offset in range is a valid date.
    #[allow(clippy::expect_used)] // Offsets stay within chrono's range
    pub fn arb_date() -> impl Strategy<Value = CalendarDate> {
        (0_u64..1_000).prop_map(|offset| {
            super::date(2024, 1, 1)
                .add_days(offset)
                .expect("offset within calendar range")
        })
    }

    /// Closed intervals of 1 to `max_len` days
    ///
    /// # Panics
    ///
    /// Never in practice: lengths stay within chrono's range.
    #[allow(clippy::expect_used)] // Lengths stay within chrono's range
    pub fn arb_interval(max_len: u64) -> impl Strategy<Value = DateInterval> {
        (arb_date(), 0..max_len.max(1)).prop_map(|(start, len)| {
            DateInterval::new(start, start.add_days(len).expect("length within range"))
        })
    }

    /// Up to `max` intervals, possibly overlapping
    pub fn arb_intervals(max: usize) -> impl Strategy<Value = Vec<DateInterval>> {
        prop::collection::vec(arb_interval(14), 0..=max)
    }
}

/// Build a date in tests
///
/// # Panics
///
/// Panics if the triple is not a valid calendar date.
#[must_use]
#[allow(clippy::expect_used)] // Test helper with literal dates
pub fn date(year: i32, month: u32, day: u32) -> CalendarDate {
    CalendarDate::from_ymd(year, month, day).expect("valid test date")
}

// Re-export commonly used items
pub use helpers::{init_test_tracing, recording_scheduler};
pub use mocks::{FixedCalendar, RecordingNotifier, RecordingSink, test_calendar};
pub use reducer_test::ReducerTest;
