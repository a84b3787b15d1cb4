//! Request collaborators.
//!
//! These traits abstract over the booking API transport. Implementations
//! own URLs, authentication and decoding; callers only see domain types and
//! [`TransportError`].

use crate::types::{
    BookedDates, BookedListing, BookingId, CancelBooking, CardListing, CreateBooking, Listing,
    ListingId, Search,
};
use stayflow_core::error::TransportError;
use stayflow_core::pagination::{Page, Pagination};
use std::future::Future;

/// Booking endpoints.
pub trait BookingClient {
    /// Create a booking.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails or the server rejects
    /// the stay (for example because it overlaps an existing booking).
    fn create_booking(
        &self,
        booking: &CreateBooking,
    ) -> impl Future<Output = Result<bool, TransportError>> + Send;

    /// Reserved stays of a listing.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails.
    fn check_availability(
        &self,
        listing: ListingId,
    ) -> impl Future<Output = Result<Vec<BookedDates>, TransportError>> + Send;

    /// Cancel a booking, returning the cancelled id.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails or the booking does
    /// not exist.
    fn cancel_booking(
        &self,
        cancel: &CancelBooking,
    ) -> impl Future<Output = Result<BookingId, TransportError>> + Send;

    /// Bookings made by the signed-in tenant.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails.
    fn booked_listings(
        &self,
    ) -> impl Future<Output = Result<Vec<BookedListing>, TransportError>> + Send;

    /// Bookings on the signed-in landlord's properties.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails.
    fn booked_listings_for_landlord(
        &self,
    ) -> impl Future<Output = Result<Vec<BookedListing>, TransportError>> + Send;
}

/// Listing endpoints.
pub trait ListingClient {
    /// One page of listings in a category.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails.
    fn listings_by_category(
        &self,
        page: &Pagination,
        category: &str,
    ) -> impl Future<Output = Result<Page<CardListing>, TransportError>> + Send;

    /// A listing page.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NotFound`] for an unknown id, or another
    /// variant if the request fails.
    fn listing(
        &self,
        listing: ListingId,
    ) -> impl Future<Output = Result<Listing, TransportError>> + Send;

    /// Listings matching a search that are free for the searched dates.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails.
    fn search_listings(
        &self,
        search: &Search,
        page: &Pagination,
    ) -> impl Future<Output = Result<Page<CardListing>, TransportError>> + Send;
}

/// Endpoints for the signed-in landlord's own listings.
pub trait LandlordListingClient {
    /// Every listing the landlord owns.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the request fails.
    fn landlord_listings(
        &self,
    ) -> impl Future<Output = Result<Vec<CardListing>, TransportError>> + Send;

    /// Delete an owned listing, returning its id.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NotFound`] if the landlord does not own the
    /// listing, or another variant if the request fails.
    fn delete_listing(
        &self,
        listing: ListingId,
    ) -> impl Future<Output = Result<ListingId, TransportError>> + Send;
}
