//! End-to-end booking flows against the in-memory API.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::rc::Rc;
use stayflow_booking::mocks::{sample_listing, InMemoryApi};
use stayflow_booking::{
    Audience, BookDate, BookDateEnvironment, BookedListings, BookingError, BookingService,
    ListingId, ValidationError,
};
use stayflow_core::calendar::DateInterval;
use stayflow_core::error::TransportError;
use stayflow_core::money::Money;
use stayflow_core::notification::Severity;
use stayflow_runtime::Scheduler;
use stayflow_testing::{date, init_test_tracing, recording_scheduler, test_calendar, RecordingNotifier};

struct Fixture {
    scheduler: Scheduler,
    api: InMemoryApi,
    listing: ListingId,
    service: Rc<BookingService<InMemoryApi>>,
    notifier: RecordingNotifier,
}

fn fixture() -> Fixture {
    init_test_tracing();
    let (scheduler, _sink) = recording_scheduler();
    let api = InMemoryApi::new();
    let listing = ListingId::new();
    api.add_listing(listing, sample_listing("Lisbon", "BEACH", Money::from_major(100)));
    api.add_booking(listing, DateInterval::new(date(2025, 7, 1), date(2025, 7, 3)));
    let service = Rc::new(BookingService::new(&scheduler, api.clone()));
    Fixture {
        scheduler,
        api,
        listing,
        service,
        notifier: RecordingNotifier::new(),
    }
}

fn widget(fx: &Fixture, authenticated: bool) -> BookDate<InMemoryApi> {
    BookDate::new(
        &fx.scheduler,
        Rc::clone(&fx.service),
        BookDateEnvironment {
            calendar: Rc::new(test_calendar()),
            listing: fx.listing,
            nightly_rate: Money::from_major(100),
            authenticated,
        },
        Rc::new(fx.notifier.clone()),
    )
}

#[tokio::test]
async fn guest_books_a_free_stay() {
    let fx = fixture();
    let widget = widget(&fx, true);

    widget.load().await.unwrap();
    assert!(widget.state().is_blocked(date(2025, 7, 2)));

    widget.select(&[Some(date(2025, 7, 3)), Some(date(2025, 7, 6))]);
    assert_eq!(
        widget.state().check,
        Err(ValidationError::Overlaps {
            date: date(2025, 7, 3)
        })
    );
    assert!(matches!(
        widget.book().await,
        Err(BookingError::InvalidSelection(_))
    ));

    widget.select(&[Some(date(2025, 7, 4)), Some(date(2025, 7, 7))]);
    assert_eq!(widget.state().total_price, Money::from_major(300));

    widget.book().await.unwrap();

    let state = widget.state();
    assert!(state.booked);
    assert_eq!(fx.notifier.count(Severity::Success), 1);
    assert_eq!(
        fx.notifier.sent()[0].detail.as_deref(),
        Some("Booking created successfully")
    );
    assert_eq!(fx.api.reserved(fx.listing).len(), 2);
}

#[tokio::test]
async fn server_rejection_raises_error_toast() {
    let fx = fixture();
    let widget = widget(&fx, true);
    widget.select(&[Some(date(2025, 7, 4)), Some(date(2025, 7, 7))]);

    // Someone else takes the stay before the availability refresh
    fx.api.add_booking(fx.listing, DateInterval::new(date(2025, 7, 5), date(2025, 7, 6)));
    widget.book().await.unwrap();

    assert!(fx.service.create_view().peek().is_error());
    assert!(!widget.state().booked);
    assert_eq!(fx.notifier.count(Severity::Error), 1);
    assert_eq!(
        fx.notifier.sent()[0].detail.as_deref(),
        Some("Booking created failed")
    );
}

#[tokio::test]
async fn availability_failure_raises_error_toast() {
    let fx = fixture();
    let widget = widget(&fx, true);
    fx.api.fail_next(TransportError::Network("connection reset".to_string()));

    widget.load().await.unwrap();

    let sent = fx.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].severity, Severity::Error);
    assert_eq!(sent[0].summary.as_deref(), Some("Error"));
    assert!(widget.state().availability.blocked().is_empty());
}

#[tokio::test]
async fn signed_out_guest_cannot_book() {
    let fx = fixture();
    let widget = widget(&fx, false);
    widget.select(&[Some(date(2025, 8, 1)), Some(date(2025, 8, 3))]);

    assert_eq!(widget.state().total_price, Money::ZERO);
    assert_eq!(widget.book().await, Err(BookingError::NotAuthenticated));
    assert_eq!(fx.api.requests(), 0);
}

#[tokio::test]
async fn teardown_stops_reactions_and_resets_create() {
    let fx = fixture();
    let mut widget = widget(&fx, true);
    widget.select(&[Some(date(2025, 8, 1)), Some(date(2025, 8, 3))]);
    widget.book().await.unwrap();
    assert!(fx.service.create_view().peek().is_ok());
    assert_eq!(fx.notifier.len(), 1);

    widget.teardown();
    assert!(fx.service.create_view().peek().is_init());

    let request = stayflow_booking::CreateBooking::new(
        fx.listing,
        DateInterval::new(date(2025, 9, 1), date(2025, 9, 2)),
    );
    fx.service.create(request).await.unwrap();
    assert_eq!(fx.notifier.len(), 1);
    assert_eq!(fx.scheduler.active_reactions(), 0);
}

#[tokio::test]
async fn dropped_widget_does_not_replay_its_toast() {
    let fx = fixture();
    {
        let first = widget(&fx, true);
        first.select(&[Some(date(2025, 8, 1)), Some(date(2025, 8, 3))]);
        first.book().await.unwrap();
        assert_eq!(fx.notifier.count(Severity::Success), 1);
    }

    assert!(fx.service.create_view().peek().is_init());
    assert_eq!(fx.scheduler.active_reactions(), 0);

    let second = widget(&fx, true);
    assert_eq!(fx.notifier.count(Severity::Success), 1);
    assert!(!second.state().booked);
}

#[tokio::test]
async fn dropped_list_resets_cancel_slot() {
    let fx = fixture();
    {
        let bookings = BookedListings::new(
            &fx.scheduler,
            Rc::clone(&fx.service),
            Audience::Tenant,
            Rc::new(fx.notifier.clone()),
        );
        bookings.load().await.unwrap();
        let booking = bookings.state().rows[0].listing.booking_id;
        bookings.cancel(booking).await.unwrap();
    }

    assert!(fx.service.cancel_view().peek().is_init());
    let _again = BookedListings::new(
        &fx.scheduler,
        Rc::clone(&fx.service),
        Audience::Tenant,
        Rc::new(fx.notifier.clone()),
    );
    assert_eq!(fx.notifier.count(Severity::Success), 1);
}

#[tokio::test]
async fn tenant_cancels_a_booking() {
    let fx = fixture();
    let mut bookings = BookedListings::new(
        &fx.scheduler,
        Rc::clone(&fx.service),
        Audience::Tenant,
        Rc::new(fx.notifier.clone()),
    );

    bookings.load().await.unwrap();
    let state = bookings.state();
    assert!(!state.loading);
    assert_eq!(state.rows.len(), 1);
    let booking = state.rows[0].listing.booking_id;

    bookings.cancel(booking).await.unwrap();

    assert!(bookings.state().rows.is_empty());
    assert_eq!(fx.notifier.count(Severity::Success), 1);
    assert!(fx.api.reserved(fx.listing).is_empty());

    bookings.teardown();
    assert!(fx.service.cancel_view().peek().is_init());
}

#[tokio::test]
async fn failed_cancel_keeps_the_row() {
    let fx = fixture();
    let bookings = BookedListings::new(
        &fx.scheduler,
        Rc::clone(&fx.service),
        Audience::Tenant,
        Rc::new(fx.notifier.clone()),
    );
    bookings.load().await.unwrap();
    let booking = bookings.state().rows[0].listing.booking_id;

    fx.api.fail_next(TransportError::Status {
        code: 500,
        message: "Internal Server Error".to_string(),
    });
    bookings.cancel(booking).await.unwrap();

    let state = bookings.state();
    assert_eq!(state.rows.len(), 1);
    assert!(!state.rows[0].cancelling);
    assert_eq!(
        fx.notifier.sent()[0].summary.as_deref(),
        Some("Error when cancel your booking")
    );
}

#[tokio::test]
async fn landlord_sees_bookings_on_owned_listings() {
    let fx = fixture();
    let owned = ListingId::new();
    fx.api
        .add_owned_listing(owned, sample_listing("Porto", "CITY", Money::from_major(80)));
    let stay = fx
        .api
        .add_booking(owned, DateInterval::new(date(2025, 5, 1), date(2025, 5, 4)));

    let bookings = BookedListings::new(
        &fx.scheduler,
        Rc::clone(&fx.service),
        Audience::Landlord,
        Rc::new(fx.notifier.clone()),
    );
    bookings.load().await.unwrap();

    let state = bookings.state();
    assert_eq!(state.rows.len(), 1);
    assert_eq!(state.rows[0].listing.booking_id, stay);
    assert_eq!(state.rows[0].listing.total_price, Money::from_major(240));

    bookings.cancel(stay).await.unwrap();
    assert!(bookings.state().rows.is_empty());
    assert!(fx.api.reserved(owned).is_empty());
}

#[tokio::test]
async fn unlisted_booking_is_rejected_locally() {
    let fx = fixture();
    let bookings = BookedListings::new(
        &fx.scheduler,
        Rc::clone(&fx.service),
        Audience::Tenant,
        Rc::new(fx.notifier.clone()),
    );

    let result = bookings.cancel(stayflow_booking::BookingId::new()).await;

    assert!(matches!(result, Err(BookingError::UnknownBooking(_))));
    assert_eq!(fx.api.requests(), 0);
}
