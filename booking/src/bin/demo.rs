//! Walkthrough of the booking flow against in-memory collaborators.
//!
//! Fetches a listing's availability, tries an overlapping and a free stay,
//! books the free one, searches around it, then lists and cancels it.
//!
//! Run with: `cargo run -p stayflow-booking --bin stayflow-demo`

use anyhow::{anyhow, Context};
use std::rc::Rc;
use stayflow_booking::mocks::{sample_listing, InMemoryApi};
use stayflow_booking::{
    Audience, BookDate, BookDateEnvironment, BookedListings, BookingService, CandidateRange, Config,
    ListingId, ListingService, Search,
};
use stayflow_core::calendar::{CalendarDate, DateInterval};
use stayflow_core::environment::{Calendar, Notifier, SystemCalendar};
use stayflow_core::money::Money;
use stayflow_core::notification::{Notification, Severity};
use stayflow_core::pagination::Pagination;
use stayflow_runtime::{Scheduler, TracingErrorSink};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Toasts go to the log.
struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notification: Notification) {
        let summary = notification.summary.as_deref().unwrap_or_default();
        let detail = notification.detail.as_deref().unwrap_or_default();
        match notification.severity {
            Severity::Error | Severity::Warn => tracing::warn!(summary, detail, "Toast"),
            Severity::Success | Severity::Info => tracing::info!(summary, detail, "Toast"),
        }
    }
}

fn days_from(today: CalendarDate, days: u64) -> anyhow::Result<CalendarDate> {
    today
        .add_days(days)
        .ok_or_else(|| anyhow!("{today} + {days} days is out of range"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    config.validate().context("Invalid configuration")?;
    stayflow_runtime::metrics::register_metrics();
    tracing::info!(api_url = %config.api_url, timeout = ?config.timeout(), "Starting Stayflow demo");

    let scheduler = Scheduler::with_config(config.runtime(), Rc::new(TracingErrorSink));
    let calendar = SystemCalendar::utc();
    let today = calendar.today();

    let api = InMemoryApi::new();
    let listing = ListingId::new();
    let rate = Money::from_major(100);
    api.add_listing(listing, sample_listing("Lisbon", "BEACH", rate));
    api.add_booking(
        listing,
        DateInterval::new(days_from(today, 3)?, days_from(today, 5)?),
    );

    let service = Rc::new(BookingService::new(&scheduler, api.clone()).with_timeout(config.timeout()));
    let notifier: Rc<dyn Notifier> = Rc::new(LogNotifier);

    // 1. Availability
    let mut widget = BookDate::new(
        &scheduler,
        Rc::clone(&service),
        BookDateEnvironment {
            calendar: Rc::new(calendar),
            listing,
            nightly_rate: rate,
            authenticated: true,
        },
        Rc::clone(&notifier),
    );
    widget.load().await?;
    let blocked: Vec<String> = widget
        .state()
        .availability
        .blocked()
        .iter()
        .map(|d| d.to_string())
        .collect();
    tracing::info!(?blocked, "Reserved days");

    // 2. Selection
    widget.select_range(CandidateRange::new(days_from(today, 4)?, days_from(today, 7)?));
    if let Err(error) = &widget.state().check {
        tracing::info!(%error, "Overlapping stay rejected");
    }
    widget.select_range(CandidateRange::new(days_from(today, 6)?, days_from(today, 9)?));
    let state = widget.state();
    tracing::info!(
        total = %state.total_price,
        currency = %config.currency,
        nights = state.quote().map_or(0, |q| q.nights),
        "Stay quoted"
    );

    // 3. Booking
    widget.book().await?;
    tracing::info!(booked = widget.state().booked, "Booking submitted");
    widget.teardown();

    // 4. Search
    let listings = ListingService::new(&scheduler, api.clone()).with_timeout(config.timeout());
    let capacity = sample_listing("Lisbon", "BEACH", rate).infos;
    for (from, to) in [(6, 9), (10, 12)] {
        let stay = DateInterval::new(days_from(today, from)?, days_from(today, to)?);
        listings
            .search(Search::new("Lisbon", stay, capacity), Pagination::first(10))
            .await?;
        let found = listings
            .search_view()
            .peek()
            .value()
            .map_or(0, |page| page.total_elements);
        tracing::info!(start = %stay.start, end = %stay.end, found, "Searched Lisbon");
    }

    // 5. Listing and cancelling
    let mut bookings = BookedListings::new(&scheduler, Rc::clone(&service), Audience::Tenant, notifier);
    bookings.load().await?;
    let rows = bookings.state().rows;
    tracing::info!(count = rows.len(), "Bookings listed");
    if let Some(row) = rows.first() {
        bookings.cancel(row.listing.booking_id).await?;
    }
    tracing::info!(
        remaining = bookings.state().rows.len(),
        reserved = api.reserved(listing).len(),
        requests = api.requests(),
        "Done"
    );
    bookings.teardown();

    Ok(())
}
