//! Booked-listings view model.
//!
//! Lists the bookings of the signed-in tenant, or the bookings on the
//! signed-in landlord's properties, and cancels them one at a time.

use crate::client::BookingClient;
use crate::error::{BookingError, Result};
use crate::service::BookingService;
use crate::types::{BookedListing, BookingId, CancelBooking};
use smallvec::{smallvec, SmallVec};
use stayflow_core::effect::Effect;
use stayflow_core::environment::Notifier;
use stayflow_core::notification::Notification;
use stayflow_core::operation::OperationState;
use stayflow_core::reducer::Reducer;
use stayflow_runtime::{ReactionScope, ReadCell, Scheduler, Store};
use std::fmt;
use std::rc::Rc;

/// Whose bookings are listed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Audience {
    /// Stays booked by the signed-in guest
    Tenant,
    /// Stays booked on the signed-in landlord's listings
    Landlord,
}

/// One listed booking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookedRow {
    /// The booking
    pub listing: BookedListing,
    /// A cancel request for this row is pending
    pub cancelling: bool,
}

/// State of the list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookedListingsState {
    /// Listed bookings
    pub rows: Vec<BookedRow>,
    /// The list is being fetched
    pub loading: bool,
}

impl BookedListingsState {
    fn row_mut(&mut self, booking: BookingId) -> Option<&mut BookedRow> {
        self.rows
            .iter_mut()
            .find(|row| row.listing.booking_id == booking)
    }

    /// Row of a booking
    #[must_use]
    pub fn row(&self, booking: BookingId) -> Option<&BookedRow> {
        self.rows.iter().find(|row| row.listing.booking_id == booking)
    }
}

/// Inputs of the list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookedListingsAction {
    /// A fetch was triggered
    FetchStarted,
    /// Bookings arrived
    Fetched(Vec<BookedListing>),
    /// Bookings could not be fetched
    FetchFailed,
    /// A cancel request for the booking was sent
    CancelStarted(BookingId),
    /// The cancel request could not be sent
    CancelRejected(BookingId),
    /// The server cancelled the booking
    Cancelled(BookingId),
    /// The server refused to cancel; the id is missing if unknown
    CancelFailed(Option<BookingId>),
}

/// Pure logic of the booked-listings list.
#[derive(Clone, Copy, Debug, Default)]
pub struct BookedListingsReducer;

impl Reducer for BookedListingsReducer {
    type State = BookedListingsState;
    type Action = BookedListingsAction;
    type Environment = Audience;

    fn reduce(
        &self,
        state: &mut BookedListingsState,
        action: BookedListingsAction,
        _env: &Audience,
    ) -> SmallVec<[Effect<BookedListingsAction>; 4]> {
        match action {
            BookedListingsAction::FetchStarted => {
                state.loading = true;
                smallvec![Effect::None]
            }
            BookedListingsAction::Fetched(listings) => {
                state.loading = false;
                state.rows = listings
                    .into_iter()
                    .map(|listing| BookedRow {
                        listing,
                        cancelling: false,
                    })
                    .collect();
                smallvec![Effect::None]
            }
            BookedListingsAction::FetchFailed => {
                state.loading = false;
                smallvec![Effect::Notify(Notification::error(
                    "Error when fetching the listing"
                ))]
            }
            BookedListingsAction::CancelStarted(booking) => {
                if let Some(row) = state.row_mut(booking) {
                    row.cancelling = true;
                }
                smallvec![Effect::None]
            }
            BookedListingsAction::CancelRejected(booking) => {
                if let Some(row) = state.row_mut(booking) {
                    row.cancelling = false;
                }
                smallvec![Effect::None]
            }
            BookedListingsAction::Cancelled(booking) => {
                state.rows.retain(|row| row.listing.booking_id != booking);
                smallvec![Effect::Notify(Notification::success(
                    "Successfully cancelled booking"
                ))]
            }
            BookedListingsAction::CancelFailed(booking) => {
                if let Some(row) = booking.and_then(|id| state.row_mut(id)) {
                    row.cancelling = false;
                }
                smallvec![Effect::Notify(Notification::error(
                    "Error when cancel your booking"
                ))]
            }
        }
    }
}

/// Booked-listings list bound to a booking service.
pub struct BookedListings<C> {
    store: Rc<Store<BookedListingsReducer>>,
    service: Rc<BookingService<C>>,
    reactions: ReactionScope,
}

impl<C: BookingClient> BookedListings<C> {
    /// Create the list and subscribe to the matching bookings slot and the
    /// cancel slot.
    #[must_use]
    pub fn new(
        scheduler: &Scheduler,
        service: Rc<BookingService<C>>,
        audience: Audience,
        notifier: Rc<dyn Notifier>,
    ) -> Self {
        let store = Rc::new(Store::new(
            scheduler,
            BookedListingsState::default(),
            BookedListingsReducer,
            audience,
            notifier,
        ));
        let mut reactions = ReactionScope::new();

        let booked = match audience {
            Audience::Tenant => service.booked_listings_view(),
            Audience::Landlord => service.booked_listings_for_landlord_view(),
        };
        let target = Rc::clone(&store);
        reactions.hold(scheduler.register(move || match booked.read() {
            OperationState::Ok(listings) => target.send(BookedListingsAction::Fetched(listings)),
            OperationState::Error { .. } => target.send(BookedListingsAction::FetchFailed),
            OperationState::Init => {}
        }));

        let cancelled = service.cancel_view();
        let target = Rc::clone(&store);
        reactions.hold(scheduler.register(move || match cancelled.read() {
            OperationState::Ok(booking) => target.send(BookedListingsAction::Cancelled(booking)),
            OperationState::Error { value, .. } => {
                target.send(BookedListingsAction::CancelFailed(value));
            }
            OperationState::Init => {}
        }));

        Self {
            store,
            service,
            reactions,
        }
    }

    /// Whose bookings are listed
    #[must_use]
    pub fn audience(&self) -> Audience {
        *self.store.environment()
    }

    /// Fetch the bookings.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Slot`] if a fetch is already in flight; the
    /// list keeps loading until that fetch completes.
    pub async fn load(&self) -> Result<()> {
        self.store.send(BookedListingsAction::FetchStarted);
        match self.audience() {
            Audience::Tenant => self.service.fetch_booked_listings().await,
            Audience::Landlord => self.service.fetch_booked_listings_for_landlord().await,
        }
    }

    /// Cancel a listed booking.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::UnknownBooking`] if the booking is not listed,
    /// or [`BookingError::Slot`] if another cancel is in flight.
    pub async fn cancel(&self, booking: BookingId) -> Result<()> {
        let listing_id = self
            .store
            .snapshot()
            .row(booking)
            .map(|row| row.listing.listing_id)
            .ok_or_else(|| BookingError::UnknownBooking(booking.to_string()))?;

        self.store.send(BookedListingsAction::CancelStarted(booking));
        let request = CancelBooking {
            booking_id: booking,
            listing_id,
            by_landlord: self.audience() == Audience::Landlord,
        };
        let result = self.service.cancel(request).await;
        if result.is_err() {
            self.store.send(BookedListingsAction::CancelRejected(booking));
        }
        result
    }

    /// Current state without subscribing
    #[must_use]
    pub fn state(&self) -> BookedListingsState {
        self.store.snapshot()
    }

    /// Observable state
    #[must_use]
    pub fn view(&self) -> ReadCell<BookedListingsState> {
        self.store.view()
    }
}

impl<C> BookedListings<C> {
    /// Stop observing the service and return the cancel slot to `Init`.
    ///
    /// Idempotent. Dropping the list tears it down.
    pub fn teardown(&mut self) {
        if self.reactions.is_empty() {
            return;
        }
        self.reactions.dispose_all();
        self.service.reset_cancel();
    }
}

impl<C> Drop for BookedListings<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<C> fmt::Debug for BookedListings<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookedListings")
            .field("store", &self.store)
            .field("reactions", &self.reactions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::types::{BookedDates, DisplayPicture, ListingId};
    use chrono::{DateTime, FixedOffset};
    use stayflow_core::money::Money;
    use stayflow_core::notification::Severity;
    use stayflow_testing::ReducerTest;

    fn booked(location: &str) -> BookedListing {
        let at = DateTime::<FixedOffset>::parse_from_rfc3339("2025-07-01T00:00:00+00:00").unwrap();
        BookedListing {
            location: location.to_string(),
            cover: DisplayPicture::default(),
            total_price: Money::from_major(200),
            dates: BookedDates {
                start_date: at,
                end_date: at,
            },
            booking_id: BookingId::new(),
            listing_id: ListingId::new(),
        }
    }

    fn tenant() -> ReducerTest<BookedListingsReducer> {
        ReducerTest::new(BookedListingsReducer, Audience::Tenant)
    }

    #[test]
    fn fetch_start_shows_loading() {
        tenant()
            .when_action(BookedListingsAction::FetchStarted)
            .then_state(|state| assert!(state.loading))
            .then_quiet()
            .run();
    }

    #[test]
    fn fetch_failure_stops_loading_and_toasts() {
        tenant()
            .given_actions([BookedListingsAction::FetchStarted])
            .when_action(BookedListingsAction::FetchFailed)
            .then_state(|state| assert!(!state.loading))
            .then_notifies(Severity::Error, "Error when fetching the listing")
            .run();
    }

    #[test]
    fn cancelled_row_is_removed() {
        let rows = vec![booked("Lisbon"), booked("Porto")];
        let gone = rows[0].booking_id;

        tenant()
            .given_actions([
                BookedListingsAction::Fetched(rows),
                BookedListingsAction::CancelStarted(gone),
            ])
            .when_action(BookedListingsAction::Cancelled(gone))
            .then_state(|state| {
                assert_eq!(state.rows.len(), 1);
                assert_eq!(state.rows[0].listing.location, "Porto");
            })
            .then_notifies(Severity::Success, "Successfully cancelled booking")
            .run();
    }

    #[test]
    fn cancel_start_marks_only_that_row() {
        let rows = vec![booked("Lisbon"), booked("Porto")];
        let (first, second) = (rows[0].booking_id, rows[1].booking_id);

        tenant()
            .given_actions([BookedListingsAction::Fetched(rows)])
            .when_action(BookedListingsAction::CancelStarted(first))
            .then_state(move |state| {
                assert!(state.row(first).unwrap().cancelling);
                assert!(!state.row(second).unwrap().cancelling);
            })
            .run();
    }

    #[test]
    fn failed_cancel_clears_only_that_row() {
        let rows = vec![booked("Lisbon"), booked("Porto")];
        let (first, second) = (rows[0].booking_id, rows[1].booking_id);

        tenant()
            .given_actions([
                BookedListingsAction::Fetched(rows),
                BookedListingsAction::CancelStarted(first),
                BookedListingsAction::CancelStarted(second),
            ])
            .when_action(BookedListingsAction::CancelFailed(Some(second)))
            .then_state(move |state| {
                assert_eq!(state.rows.len(), 2);
                assert!(state.row(first).unwrap().cancelling);
                assert!(!state.row(second).unwrap().cancelling);
            })
            .then_notifies(Severity::Error, "Error when cancel your booking")
            .run();
    }

    #[test]
    fn failed_cancel_without_id_only_toasts() {
        let rows = vec![booked("Lisbon")];
        let only = rows[0].booking_id;

        let state = tenant()
            .given_actions([
                BookedListingsAction::Fetched(rows),
                BookedListingsAction::CancelStarted(only),
            ])
            .when_action(BookedListingsAction::CancelFailed(None))
            .then_notifies(Severity::Error, "Error when cancel your booking")
            .run();

        assert!(state.row(only).unwrap().cancelling);
    }
}
