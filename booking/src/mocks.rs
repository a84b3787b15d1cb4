//! In-memory collaborator implementations for testing.
//!
//! [`InMemoryApi`] implements every client trait over shared in-process
//! data, applying the same rules as the booking API: overlapping stays are
//! rejected, totals are `nights * price`, only the owner of a listing may
//! cancel on a tenant's behalf or delete it, and a search skips listings
//! booked during the searched dates.

use crate::availability::price;
use crate::client::{BookingClient, LandlordListingClient, ListingClient};
use crate::types::{
    BookedDates, BookedListing, BookingId, CancelBooking, CardListing, CreateBooking,
    DisplayPicture, Listing, ListingId, Search,
};
use chrono::{DateTime, FixedOffset, NaiveTime, Offset, TimeZone};
use stayflow_core::calendar::CalendarDate;
use stayflow_core::calendar::DateInterval;
use stayflow_core::error::TransportError;
use stayflow_core::money::Money;
use stayflow_core::pagination::{Page, Pagination};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone)]
struct StoredBooking {
    id: BookingId,
    listing: ListingId,
    interval: DateInterval,
    total: Money,
}

#[derive(Debug, Default)]
struct Backend {
    listings: BTreeMap<ListingId, Listing>,
    owned: HashSet<ListingId>,
    bookings: Vec<StoredBooking>,
    failures: VecDeque<TransportError>,
    requests: usize,
}

impl Backend {
    fn begin_request(&mut self) -> Result<(), TransportError> {
        self.requests += 1;
        self.failures.pop_front().map_or(Ok(()), Err)
    }

    fn booked_listing(&self, booking: &StoredBooking, offset: FixedOffset) -> Option<BookedListing> {
        let listing = self.listings.get(&booking.listing)?;
        Some(BookedListing {
            location: listing.location.clone(),
            cover: cover_of(listing),
            total_price: booking.total,
            dates: booked_dates(&booking.interval, offset)?,
            booking_id: booking.id,
            listing_id: booking.listing,
        })
    }
}

fn cover_of(listing: &Listing) -> DisplayPicture {
    listing
        .pictures
        .iter()
        .find(|p| p.is_cover)
        .cloned()
        .unwrap_or_default()
}

fn booked_dates(interval: &DateInterval, offset: FixedOffset) -> Option<BookedDates> {
    let at_midnight = |date: CalendarDate| -> Option<DateTime<FixedOffset>> {
        offset
            .from_local_datetime(&date.as_naive().and_time(NaiveTime::MIN))
            .single()
    };
    Some(BookedDates {
        start_date: at_midnight(interval.start)?,
        end_date: at_midnight(interval.end)?,
    })
}

fn overlaps(a: &DateInterval, b: &DateInterval) -> bool {
    a.start <= b.end && b.start <= a.end
}

fn card_of(id: ListingId, listing: &Listing) -> CardListing {
    CardListing {
        price: listing.price,
        location: listing.location.clone(),
        cover: cover_of(listing),
        booking_category: listing.category.clone(),
        listing_id: id,
    }
}

fn page_of(matching: Vec<CardListing>, page: &Pagination) -> Page<CardListing> {
    let size = page.size.max(1) as usize;
    let total_elements = matching.len() as u64;
    let total_pages = u32::try_from(matching.len().div_ceil(size)).unwrap_or(u32::MAX);
    let content = matching
        .into_iter()
        .skip(page.page as usize * size)
        .take(size)
        .collect();
    Page {
        content,
        number: page.page,
        size: page.size,
        total_elements,
        total_pages,
    }
}

/// In-memory booking API.
///
/// Clones share the same data.
#[derive(Debug, Clone)]
pub struct InMemoryApi {
    backend: Arc<Mutex<Backend>>,
    offset: FixedOffset,
    latency: Duration,
}

impl InMemoryApi {
    /// Empty API reporting dates in UTC with no latency
    #[must_use]
    pub fn new() -> Self {
        Self {
            backend: Arc::new(Mutex::new(Backend::default())),
            offset: chrono::Utc.fix(),
            latency: Duration::ZERO,
        }
    }

    /// Report booked dates in `offset`
    #[must_use]
    pub const fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Delay every response by `latency`
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn backend(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a listing owned by someone else
    pub fn add_listing(&self, id: ListingId, listing: Listing) {
        self.backend().listings.insert(id, listing);
    }

    /// Add a listing owned by the signed-in landlord
    pub fn add_owned_listing(&self, id: ListingId, listing: Listing) {
        let mut backend = self.backend();
        backend.listings.insert(id, listing);
        backend.owned.insert(id);
    }

    /// Store an existing booking without validation
    pub fn add_booking(&self, listing: ListingId, interval: DateInterval) -> BookingId {
        let mut backend = self.backend();
        let rate = backend.listings.get(&listing).map_or(Money::ZERO, |l| l.price);
        let id = BookingId::new();
        backend.bookings.push(StoredBooking {
            id,
            listing,
            interval,
            total: price(&interval, rate),
        });
        id
    }

    /// Make the next request fail with `error`
    pub fn fail_next(&self, error: TransportError) {
        self.backend().failures.push_back(error);
    }

    /// Number of requests received
    #[must_use]
    pub fn requests(&self) -> usize {
        self.backend().requests
    }

    /// Stored stays of a listing
    #[must_use]
    pub fn reserved(&self, listing: ListingId) -> Vec<DateInterval> {
        self.backend()
            .bookings
            .iter()
            .filter(|b| b.listing == listing)
            .map(|b| b.interval)
            .collect()
    }

    fn respond<T: Send + 'static>(
        &self,
        result: Result<T, TransportError>,
    ) -> impl Future<Output = Result<T, TransportError>> + Send + use<T> {
        let latency = self.latency;
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            result
        }
    }
}

impl Default for InMemoryApi {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingClient for InMemoryApi {
    fn create_booking(
        &self,
        booking: &CreateBooking,
    ) -> impl Future<Output = Result<bool, TransportError>> + Send {
        let result = {
            let mut backend = self.backend();
            backend.begin_request().and_then(|()| {
                let rate = backend
                    .listings
                    .get(&booking.listing_id)
                    .map(|l| l.price)
                    .ok_or_else(|| TransportError::Status {
                        code: 404,
                        message: "Landlord public id not found".to_string(),
                    })?;
                let requested = booking.interval();
                if backend
                    .bookings
                    .iter()
                    .any(|b| b.listing == booking.listing_id && overlaps(&b.interval, &requested))
                {
                    return Err(TransportError::Status {
                        code: 409,
                        message: "One booking already exists".to_string(),
                    });
                }
                backend.bookings.push(StoredBooking {
                    id: BookingId::new(),
                    listing: booking.listing_id,
                    interval: requested,
                    total: price(&requested, rate),
                });
                Ok(true)
            })
        };
        self.respond(result)
    }

    fn check_availability(
        &self,
        listing: ListingId,
    ) -> impl Future<Output = Result<Vec<BookedDates>, TransportError>> + Send {
        let offset = self.offset;
        let result = {
            let mut backend = self.backend();
            backend.begin_request().map(|()| {
                backend
                    .bookings
                    .iter()
                    .filter(|b| b.listing == listing)
                    .filter_map(|b| booked_dates(&b.interval, offset))
                    .collect()
            })
        };
        self.respond(result)
    }

    fn cancel_booking(
        &self,
        cancel: &CancelBooking,
    ) -> impl Future<Output = Result<BookingId, TransportError>> + Send {
        let result = {
            let mut backend = self.backend();
            backend.begin_request().and_then(|()| {
                if cancel.by_landlord && !backend.owned.contains(&cancel.listing_id) {
                    return Err(TransportError::NotFound("Booking not found".to_string()));
                }
                let before = backend.bookings.len();
                backend
                    .bookings
                    .retain(|b| !(b.id == cancel.booking_id && b.listing == cancel.listing_id));
                if backend.bookings.len() < before {
                    Ok(cancel.booking_id)
                } else {
                    Err(TransportError::NotFound("Booking not found".to_string()))
                }
            })
        };
        self.respond(result)
    }

    fn booked_listings(
        &self,
    ) -> impl Future<Output = Result<Vec<BookedListing>, TransportError>> + Send {
        let offset = self.offset;
        let result = {
            let mut backend = self.backend();
            backend.begin_request().map(|()| {
                backend
                    .bookings
                    .iter()
                    .filter(|b| !backend.owned.contains(&b.listing))
                    .filter_map(|b| backend.booked_listing(b, offset))
                    .collect()
            })
        };
        self.respond(result)
    }

    fn booked_listings_for_landlord(
        &self,
    ) -> impl Future<Output = Result<Vec<BookedListing>, TransportError>> + Send {
        let offset = self.offset;
        let result = {
            let mut backend = self.backend();
            backend.begin_request().map(|()| {
                backend
                    .bookings
                    .iter()
                    .filter(|b| backend.owned.contains(&b.listing))
                    .filter_map(|b| backend.booked_listing(b, offset))
                    .collect()
            })
        };
        self.respond(result)
    }
}

impl ListingClient for InMemoryApi {
    fn listings_by_category(
        &self,
        page: &Pagination,
        category: &str,
    ) -> impl Future<Output = Result<Page<CardListing>, TransportError>> + Send {
        let result = {
            let mut backend = self.backend();
            backend.begin_request().map(|()| {
                let matching = backend
                    .listings
                    .iter()
                    .filter(|(_, l)| l.category == category)
                    .map(|(id, l)| card_of(*id, l))
                    .collect();
                page_of(matching, page)
            })
        };
        self.respond(result)
    }

    fn listing(
        &self,
        listing: ListingId,
    ) -> impl Future<Output = Result<Listing, TransportError>> + Send {
        let result = {
            let mut backend = self.backend();
            backend.begin_request().and_then(|()| {
                backend
                    .listings
                    .get(&listing)
                    .cloned()
                    .ok_or_else(|| TransportError::NotFound(format!("Listing {listing}")))
            })
        };
        self.respond(result)
    }

    fn search_listings(
        &self,
        search: &Search,
        page: &Pagination,
    ) -> impl Future<Output = Result<Page<CardListing>, TransportError>> + Send {
        let result = {
            let mut backend = self.backend();
            backend.begin_request().map(|()| {
                let matching = backend
                    .listings
                    .iter()
                    .filter(|(_, l)| l.location == search.location && l.infos == search.infos)
                    .filter(|(id, _)| {
                        !backend
                            .bookings
                            .iter()
                            .any(|b| b.listing == **id && overlaps(&b.interval, &search.dates))
                    })
                    .map(|(id, l)| card_of(*id, l))
                    .collect();
                page_of(matching, page)
            })
        };
        self.respond(result)
    }
}

impl LandlordListingClient for InMemoryApi {
    fn landlord_listings(
        &self,
    ) -> impl Future<Output = Result<Vec<CardListing>, TransportError>> + Send {
        let result = {
            let mut backend = self.backend();
            backend.begin_request().map(|()| {
                backend
                    .listings
                    .iter()
                    .filter(|(id, _)| backend.owned.contains(*id))
                    .map(|(id, l)| card_of(*id, l))
                    .collect()
            })
        };
        self.respond(result)
    }

    fn delete_listing(
        &self,
        listing: ListingId,
    ) -> impl Future<Output = Result<ListingId, TransportError>> + Send {
        let result = {
            let mut backend = self.backend();
            backend.begin_request().and_then(|()| {
                if !backend.owned.remove(&listing) {
                    return Err(TransportError::NotFound("Listing not found".to_string()));
                }
                backend.listings.remove(&listing);
                backend.bookings.retain(|b| b.listing != listing);
                Ok(listing)
            })
        };
        self.respond(result)
    }
}

/// Listing fixture with a nightly rate.
#[must_use]
pub fn sample_listing(location: &str, category: &str, price: Money) -> Listing {
    Listing {
        title: format!("Stay in {location}"),
        description: "Bright and quiet.".to_string(),
        pictures: vec![DisplayPicture {
            file: Some("cover.jpg".to_string()),
            file_content_type: Some("image/jpeg".to_string()),
            is_cover: true,
        }],
        infos: crate::types::ListingInfo {
            guests: 2,
            bedrooms: 1,
            beds: 1,
            baths: 1,
        },
        price,
        category: category.to_string(),
        location: location.to_string(),
        landlord: crate::types::LandlordSummary {
            firstname: "Ana".to_string(),
            image_url: String::new(),
        },
    }
}
