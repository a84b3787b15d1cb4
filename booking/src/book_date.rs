//! Booking-date view model.
//!
//! Holds the guest's date selection for one listing, the listing's reserved
//! days and the resulting quote. The reducer is pure; [`BookDate`] wires it
//! to the availability and create slots of a [`BookingService`]:
//!
//! - availability `Ok` feeds the reserved stays into the state, `Error`
//!   raises a toast
//! - create `Ok`/`Error` raises the matching toast
//! - [`BookDate::teardown`], also run on drop, disposes both reactions and
//!   resets the create slot

use crate::availability::{Availability, CandidateRange, Quote, ValidationError};
use crate::client::BookingClient;
use crate::error::{BookingError, Result};
use crate::service::BookingService;
use crate::types::{CreateBooking, ListingId};
use smallvec::{smallvec, SmallVec};
use stayflow_core::calendar::{CalendarDate, DateInterval};
use stayflow_core::effect::Effect;
use stayflow_core::environment::{Calendar, Notifier};
use stayflow_core::money::Money;
use stayflow_core::notification::{Notification, Severity};
use stayflow_core::operation::{OperationState, Status};
use stayflow_core::reducer::Reducer;
use stayflow_runtime::{ReactionScope, ReadCell, Scheduler, Store};
use std::fmt;
use std::rc::Rc;

// ============================================================================
// State
// ============================================================================

/// State of the booking-date widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookDateState {
    /// Current date selection
    pub selection: CandidateRange,
    /// Reserved stays of the listing
    pub availability: Availability,
    /// Outcome of validating the selection
    pub check: std::result::Result<Quote, ValidationError>,
    /// Price shown to the guest; zero unless the selection can be booked
    pub total_price: Money,
    /// Set once a booking was created
    pub booked: bool,
}

impl BookDateState {
    /// The validated quote, if the selection is bookable
    #[must_use]
    pub fn quote(&self) -> Option<&Quote> {
        self.check.as_ref().ok()
    }

    /// Whether a day is shown as unavailable
    #[must_use]
    pub fn is_blocked(&self, date: CalendarDate) -> bool {
        self.availability.is_blocked(date)
    }
}

impl Default for BookDateState {
    fn default() -> Self {
        Self {
            selection: CandidateRange::default(),
            availability: Availability::default(),
            check: Err(ValidationError::MissingEndpoint),
            total_price: Money::ZERO,
            booked: false,
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Inputs of the booking-date widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookDateAction {
    /// Reserved stays arrived
    AvailabilityLoaded(Vec<DateInterval>),
    /// Reserved stays could not be fetched
    AvailabilityFailed,
    /// The guest changed the selection
    DatesChanged(CandidateRange),
    /// The server accepted the booking
    BookingCreated,
    /// The server rejected the booking
    BookingFailed,
}

// ============================================================================
// Environment
// ============================================================================

/// Collaborators and fixed inputs of the widget.
#[derive(Clone)]
pub struct BookDateEnvironment {
    /// Source of "today" for the retroactive check
    pub calendar: Rc<dyn Calendar>,
    /// Listing being booked
    pub listing: ListingId,
    /// Price per night
    pub nightly_rate: Money,
    /// Whether the guest is signed in
    pub authenticated: bool,
}

impl fmt::Debug for BookDateEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookDateEnvironment")
            .field("today", &self.calendar.today())
            .field("listing", &self.listing)
            .field("nightly_rate", &self.nightly_rate)
            .field("authenticated", &self.authenticated)
            .finish()
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Pure logic of the booking-date widget.
#[derive(Clone, Copy, Debug, Default)]
pub struct BookDateReducer;

impl BookDateReducer {
    fn recompute(state: &mut BookDateState, env: &BookDateEnvironment) {
        state.check = state.availability.quote(
            &state.selection,
            env.nightly_rate,
            env.calendar.today(),
        );
        state.total_price = match &state.check {
            Ok(quote) if env.authenticated => quote.total,
            _ => Money::ZERO,
        };
    }
}

fn toast(severity: Severity, summary: Option<&str>, detail: &str) -> Notification {
    Notification {
        severity,
        summary: summary.map(str::to_string),
        detail: Some(detail.to_string()),
    }
}

impl Reducer for BookDateReducer {
    type State = BookDateState;
    type Action = BookDateAction;
    type Environment = BookDateEnvironment;

    fn reduce(
        &self,
        state: &mut BookDateState,
        action: BookDateAction,
        env: &BookDateEnvironment,
    ) -> SmallVec<[Effect<BookDateAction>; 4]> {
        match action {
            BookDateAction::AvailabilityLoaded(reserved) => {
                state.availability = Availability::new(reserved);
                Self::recompute(state, env);
                smallvec![Effect::None]
            }
            BookDateAction::AvailabilityFailed => smallvec![Effect::Notify(toast(
                Severity::Error,
                Some("Error"),
                "Error when fetching the not available dates",
            ))],
            BookDateAction::DatesChanged(selection) => {
                state.selection = selection;
                Self::recompute(state, env);
                smallvec![Effect::None]
            }
            BookDateAction::BookingCreated => {
                state.booked = true;
                smallvec![Effect::Notify(toast(
                    Severity::Success,
                    None,
                    "Booking created successfully",
                ))]
            }
            BookDateAction::BookingFailed => smallvec![Effect::Notify(toast(
                Severity::Error,
                None,
                "Booking created failed",
            ))],
        }
    }
}

// ============================================================================
// View model
// ============================================================================

/// Booking-date widget bound to a booking service.
pub struct BookDate<C> {
    store: Rc<Store<BookDateReducer>>,
    service: Rc<BookingService<C>>,
    reactions: ReactionScope,
}

impl<C: BookingClient> BookDate<C> {
    /// Create the widget and subscribe to the service's availability and
    /// create slots.
    #[must_use]
    pub fn new(
        scheduler: &Scheduler,
        service: Rc<BookingService<C>>,
        environment: BookDateEnvironment,
        notifier: Rc<dyn Notifier>,
    ) -> Self {
        let store = Rc::new(Store::new(
            scheduler,
            BookDateState::default(),
            BookDateReducer,
            environment,
            notifier,
        ));
        let mut reactions = ReactionScope::new();

        let availability = service.availability_view();
        let target = Rc::clone(&store);
        reactions.hold(scheduler.register(move || match availability.read() {
            OperationState::Ok(reserved) => target.send(BookDateAction::AvailabilityLoaded(reserved)),
            OperationState::Error { .. } => target.send(BookDateAction::AvailabilityFailed),
            OperationState::Init => {}
        }));

        let created = service.create_view();
        let target = Rc::clone(&store);
        reactions.hold(scheduler.register(move || match created.status() {
            Status::Ok => target.send(BookDateAction::BookingCreated),
            Status::Error => target.send(BookDateAction::BookingFailed),
            Status::Init => {}
        }));

        tracing::debug!(listing = %store.environment().listing, "Book-date widget ready");
        Self {
            store,
            service,
            reactions,
        }
    }

    /// Fetch the listing's reserved stays.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Slot`] if an availability request is in
    /// flight.
    pub async fn load(&self) -> Result<()> {
        let listing = self.store.environment().listing;
        self.service.check_availability(listing).await
    }

    /// Update the selection from the raw picker value.
    pub fn select(&self, dates: &[Option<CalendarDate>]) {
        self.select_range(CandidateRange::from_selection(dates));
    }

    /// Update the selection.
    pub fn select_range(&self, selection: CandidateRange) {
        self.store.send(BookDateAction::DatesChanged(selection));
    }

    /// The request [`book`](Self::book) would send.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::NotAuthenticated`] for a signed-out guest, or
    /// [`BookingError::InvalidSelection`] if the selection is not bookable.
    pub fn booking_request(&self) -> Result<CreateBooking> {
        let environment = self.store.environment();
        if !environment.authenticated {
            return Err(BookingError::NotAuthenticated);
        }
        let quote = self.store.snapshot().check?;
        Ok(CreateBooking::new(environment.listing, quote.interval))
    }

    /// Submit the current selection.
    ///
    /// # Errors
    ///
    /// See [`booking_request`](Self::booking_request); also returns
    /// [`BookingError::Slot`] if a create request is in flight.
    pub async fn book(&self) -> Result<()> {
        let request = self.booking_request()?;
        tracing::info!(
            start = %request.start_date,
            end = %request.end_date,
            "Submitting booking"
        );
        self.service.create(request).await
    }

    /// Current state without subscribing
    #[must_use]
    pub fn state(&self) -> BookDateState {
        self.store.snapshot()
    }

    /// Observable state
    #[must_use]
    pub fn view(&self) -> ReadCell<BookDateState> {
        self.store.view()
    }
}

impl<C> BookDate<C> {
    /// Stop observing the service and return the create slot to `Init`.
    ///
    /// Idempotent. Dropping the widget tears it down.
    pub fn teardown(&mut self) {
        if self.reactions.is_empty() {
            return;
        }
        self.reactions.dispose_all();
        self.service.reset_create();
        tracing::debug!("Book-date widget torn down");
    }
}

impl<C> Drop for BookDate<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<C> fmt::Debug for BookDate<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookDate")
            .field("store", &self.store)
            .field("reactions", &self.reactions.len())
            .finish_non_exhaustive()
    }
}
