//! Request services.
//!
//! Each service owns one [`Slot`] per endpoint. A request method claims the
//! slot, awaits the collaborator and publishes the terminal
//! [`OperationState`](stayflow_core::operation::OperationState) through the
//! slot; observers subscribe to the slot's [`SlotView`]. Transport failures
//! are published, not returned: the `Result` of a request method only
//! reports that the slot was busy.
//!
//! Every collaborator call is bounded by the service's request timeout. A
//! request that runs out of time is published as
//! [`TransportError::Network`] and frees the slot.

use crate::client::{BookingClient, LandlordListingClient, ListingClient};
use crate::error::Result;
use crate::types::{
    BookedDates, BookedListing, BookingId, CancelBooking, CardListing, CreateBooking, Listing,
    ListingId, Search,
};
use stayflow_core::calendar::DateInterval;
use stayflow_core::error::TransportError;
use stayflow_core::operation::{failure_with_value, success};
use stayflow_core::pagination::{Page, Pagination};
use stayflow_runtime::{Scheduler, Slot, SlotView};
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Bound on one collaborator request unless a service is given another
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

async fn bounded<T>(
    limit: Duration,
    request: impl Future<Output = std::result::Result<T, TransportError>>,
) -> std::result::Result<T, TransportError> {
    tokio::time::timeout(limit, request).await.unwrap_or_else(|_| {
        tracing::warn!(timeout_ms = limit.as_millis(), "Request timed out");
        Err(TransportError::Network(format!(
            "request timed out after {}ms",
            limit.as_millis()
        )))
    })
}

// ============================================================================
// Bookings
// ============================================================================

/// Booking endpoints exposed as request slots.
pub struct BookingService<C> {
    client: C,
    timeout: Duration,
    create: Slot<bool, TransportError>,
    availability: Slot<Vec<DateInterval>, TransportError>,
    booked: Slot<Vec<BookedListing>, TransportError>,
    booked_for_landlord: Slot<Vec<BookedListing>, TransportError>,
    cancel: Slot<BookingId, TransportError>,
}

impl<C: BookingClient> BookingService<C> {
    /// Service with every slot in `Init`
    #[must_use]
    pub fn new(scheduler: &Scheduler, client: C) -> Self {
        Self {
            client,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            create: Slot::new(scheduler, "booking.create"),
            availability: Slot::new(scheduler, "booking.check_availability"),
            booked: Slot::new(scheduler, "booking.booked_listings"),
            booked_for_landlord: Slot::new(scheduler, "booking.booked_listings_for_landlord"),
            cancel: Slot::new(scheduler, "booking.cancel"),
        }
    }

    /// Bound every request by `timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create a booking and publish the outcome on the create slot.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Slot`](crate::error::BookingError::Slot) if a
    /// create request is already in flight.
    #[tracing::instrument(skip(self), fields(listing = %booking.listing_id))]
    pub async fn create(&self, booking: CreateBooking) -> Result<()> {
        let ticket = self.create.begin()?;
        let result = bounded(self.timeout, self.client.create_booking(&booking)).await;
        if let Err(error) = &result {
            tracing::warn!(%error, "Create booking failed");
        }
        self.create.settle(ticket, result);
        Ok(())
    }

    /// Fetch the reserved stays of `listing`.
    ///
    /// Server date-times are converted to calendar days in their own offset
    /// before they reach the slot.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Slot`](crate::error::BookingError::Slot) if an
    /// availability request is already in flight.
    #[tracing::instrument(skip(self), fields(listing = %listing))]
    pub async fn check_availability(&self, listing: ListingId) -> Result<()> {
        let ticket = self.availability.begin()?;
        let result = bounded(self.timeout, self.client.check_availability(listing))
            .await
            .map(|dates| dates.iter().map(BookedDates::to_interval).collect::<Vec<_>>());
        match &result {
            Ok(reserved) => tracing::debug!(reserved = reserved.len(), "Availability fetched"),
            Err(error) => tracing::warn!(%error, "Availability check failed"),
        }
        self.availability.settle(ticket, result);
        Ok(())
    }

    /// Fetch the signed-in tenant's bookings.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Slot`](crate::error::BookingError::Slot) if the
    /// request is already in flight.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_booked_listings(&self) -> Result<()> {
        let ticket = self.booked.begin()?;
        let result = bounded(self.timeout, self.client.booked_listings()).await;
        if let Err(error) = &result {
            tracing::warn!(%error, "Fetching booked listings failed");
        }
        self.booked.settle(ticket, result);
        Ok(())
    }

    /// Fetch bookings on the signed-in landlord's properties.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Slot`](crate::error::BookingError::Slot) if the
    /// request is already in flight.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_booked_listings_for_landlord(&self) -> Result<()> {
        let ticket = self.booked_for_landlord.begin()?;
        let result = bounded(self.timeout, self.client.booked_listings_for_landlord()).await;
        if let Err(error) = &result {
            tracing::warn!(%error, "Fetching landlord bookings failed");
        }
        self.booked_for_landlord.settle(ticket, result);
        Ok(())
    }

    /// Cancel a booking.
    ///
    /// A failure keeps the booking id as the state's value so observers can
    /// tell which booking it concerns.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Slot`](crate::error::BookingError::Slot) if a
    /// cancel request is already in flight.
    #[tracing::instrument(skip(self), fields(booking = %cancel.booking_id, by_landlord = cancel.by_landlord))]
    pub async fn cancel(&self, cancel: CancelBooking) -> Result<()> {
        let ticket = self.cancel.begin()?;
        let state = match bounded(self.timeout, self.client.cancel_booking(&cancel)).await {
            Ok(cancelled) => success(cancelled),
            Err(error) => {
                tracing::warn!(%error, "Cancel booking failed");
                failure_with_value(Some(error), cancel.booking_id)
            }
        };
        self.cancel.complete(ticket, state);
        Ok(())
    }
}

impl<C> BookingService<C> {
    /// The collaborator
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Bound applied to each request
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Create slot
    #[must_use]
    pub fn create_view(&self) -> SlotView<bool, TransportError> {
        self.create.view()
    }

    /// Availability slot
    #[must_use]
    pub fn availability_view(&self) -> SlotView<Vec<DateInterval>, TransportError> {
        self.availability.view()
    }

    /// Tenant bookings slot
    #[must_use]
    pub fn booked_listings_view(&self) -> SlotView<Vec<BookedListing>, TransportError> {
        self.booked.view()
    }

    /// Landlord bookings slot
    #[must_use]
    pub fn booked_listings_for_landlord_view(&self) -> SlotView<Vec<BookedListing>, TransportError> {
        self.booked_for_landlord.view()
    }

    /// Cancel slot
    #[must_use]
    pub fn cancel_view(&self) -> SlotView<BookingId, TransportError> {
        self.cancel.view()
    }

    /// Return the create slot to `Init`
    pub fn reset_create(&self) {
        self.create.reset();
    }

    /// Return the availability slot to `Init`
    pub fn reset_availability(&self) {
        self.availability.reset();
    }

    /// Return the tenant bookings slot to `Init`
    pub fn reset_booked_listings(&self) {
        self.booked.reset();
    }

    /// Return the landlord bookings slot to `Init`
    pub fn reset_booked_listings_for_landlord(&self) {
        self.booked_for_landlord.reset();
    }

    /// Return the cancel slot to `Init`
    pub fn reset_cancel(&self) {
        self.cancel.reset();
    }
}

impl<C> fmt::Debug for BookingService<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookingService")
            .field("timeout", &self.timeout)
            .field("create", &self.create)
            .field("availability", &self.availability)
            .field("booked", &self.booked)
            .field("booked_for_landlord", &self.booked_for_landlord)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Listings
// ============================================================================

/// Listing endpoints exposed as request slots.
pub struct ListingService<C> {
    client: C,
    timeout: Duration,
    by_category: Slot<Page<CardListing>, TransportError>,
    listing: Slot<Listing, TransportError>,
    search: Slot<Page<CardListing>, TransportError>,
}

impl<C: ListingClient> ListingService<C> {
    /// Service with every slot in `Init`
    #[must_use]
    pub fn new(scheduler: &Scheduler, client: C) -> Self {
        Self {
            client,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            by_category: Slot::new(scheduler, "listing.by_category"),
            listing: Slot::new(scheduler, "listing.one"),
            search: Slot::new(scheduler, "listing.search"),
        }
    }

    /// Bound every request by `timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch one page of listings in `category`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Slot`](crate::error::BookingError::Slot) if a
    /// page request is already in flight.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_by_category(&self, page: Pagination, category: String) -> Result<()> {
        let ticket = self.by_category.begin()?;
        let result = bounded(self.timeout, self.client.listings_by_category(&page, &category)).await;
        if let Err(error) = &result {
            tracing::warn!(%error, "Fetching listings failed");
        }
        self.by_category.settle(ticket, result);
        Ok(())
    }

    /// Fetch one listing.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Slot`](crate::error::BookingError::Slot) if a
    /// listing request is already in flight.
    #[tracing::instrument(skip(self), fields(listing = %listing))]
    pub async fn fetch_listing(&self, listing: ListingId) -> Result<()> {
        let ticket = self.listing.begin()?;
        let result = bounded(self.timeout, self.client.listing(listing)).await;
        if let Err(error) = &result {
            tracing::warn!(%error, "Fetching listing failed");
        }
        self.listing.settle(ticket, result);
        Ok(())
    }

    /// Search listings that are free for the searched stay.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Slot`](crate::error::BookingError::Slot) if a
    /// search is already in flight.
    #[tracing::instrument(skip(self, search), fields(location = %search.location, dates = %search.dates.start))]
    pub async fn search(&self, search: Search, page: Pagination) -> Result<()> {
        let ticket = self.search.begin()?;
        let result = bounded(self.timeout, self.client.search_listings(&search, &page)).await;
        match &result {
            Ok(found) => tracing::debug!(found = found.total_elements, "Search finished"),
            Err(error) => tracing::warn!(%error, "Search failed"),
        }
        self.search.settle(ticket, result);
        Ok(())
    }
}

impl<C> ListingService<C> {
    /// Listings page slot
    #[must_use]
    pub fn by_category_view(&self) -> SlotView<Page<CardListing>, TransportError> {
        self.by_category.view()
    }

    /// Single listing slot
    #[must_use]
    pub fn listing_view(&self) -> SlotView<Listing, TransportError> {
        self.listing.view()
    }

    /// Search results slot
    #[must_use]
    pub fn search_view(&self) -> SlotView<Page<CardListing>, TransportError> {
        self.search.view()
    }

    /// Return the listings page slot to `Init`
    pub fn reset_by_category(&self) {
        self.by_category.reset();
    }

    /// Return the single listing slot to `Init`
    pub fn reset_listing(&self) {
        self.listing.reset();
    }

    /// Return the search slot to `Init`
    pub fn reset_search(&self) {
        self.search.reset();
    }
}

impl<C> fmt::Debug for ListingService<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingService")
            .field("timeout", &self.timeout)
            .field("by_category", &self.by_category)
            .field("listing", &self.listing)
            .field("search", &self.search)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Landlord listings
// ============================================================================

/// The signed-in landlord's own listings exposed as request slots.
pub struct LandlordListingService<C> {
    client: C,
    timeout: Duration,
    all: Slot<Vec<CardListing>, TransportError>,
    delete: Slot<ListingId, TransportError>,
}

impl<C: LandlordListingClient> LandlordListingService<C> {
    /// Service with every slot in `Init`
    #[must_use]
    pub fn new(scheduler: &Scheduler, client: C) -> Self {
        Self {
            client,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            all: Slot::new(scheduler, "landlord_listing.get_all"),
            delete: Slot::new(scheduler, "landlord_listing.delete"),
        }
    }

    /// Bound every request by `timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch every listing the landlord owns.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Slot`](crate::error::BookingError::Slot) if the
    /// request is already in flight.
    #[tracing::instrument(skip(self))]
    pub async fn get_all(&self) -> Result<()> {
        let ticket = self.all.begin()?;
        let result = bounded(self.timeout, self.client.landlord_listings()).await;
        if let Err(error) = &result {
            tracing::warn!(%error, "Fetching landlord listings failed");
        }
        self.all.settle(ticket, result);
        Ok(())
    }

    /// Delete an owned listing.
    ///
    /// Like a cancel, a failure keeps the listing id as the state's value.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Slot`](crate::error::BookingError::Slot) if a
    /// delete is already in flight.
    #[tracing::instrument(skip(self), fields(listing = %listing))]
    pub async fn delete(&self, listing: ListingId) -> Result<()> {
        let ticket = self.delete.begin()?;
        let state = match bounded(self.timeout, self.client.delete_listing(listing)).await {
            Ok(deleted) => success(deleted),
            Err(error) => {
                tracing::warn!(%error, "Deleting listing failed");
                failure_with_value(Some(error), listing)
            }
        };
        self.delete.complete(ticket, state);
        Ok(())
    }
}

impl<C> LandlordListingService<C> {
    /// Owned listings slot
    #[must_use]
    pub fn get_all_view(&self) -> SlotView<Vec<CardListing>, TransportError> {
        self.all.view()
    }

    /// Delete slot
    #[must_use]
    pub fn delete_view(&self) -> SlotView<ListingId, TransportError> {
        self.delete.view()
    }

    /// Return the owned listings slot to `Init`
    pub fn reset_get_all(&self) {
        self.all.reset();
    }

    /// Return the delete slot to `Init`
    pub fn reset_delete(&self) {
        self.delete.reset();
    }
}

impl<C> fmt::Debug for LandlordListingService<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LandlordListingService")
            .field("timeout", &self.timeout)
            .field("all", &self.all)
            .field("delete", &self.delete)
            .finish_non_exhaustive()
    }
}
