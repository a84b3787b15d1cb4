//! Domain types for bookings and listings.
//!
//! Server payloads are decoded into these types at the edge. Dates travel as
//! offset date-times on the wire and become [`CalendarDate`]s through
//! [`BookedDates::to_interval`].

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use stayflow_core::calendar::{CalendarDate, DateInterval};
use stayflow_core::money::Money;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Public identifier of a listing
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListingId(Uuid);

impl ListingId {
    /// Creates a new random `ListingId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ListingId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ListingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ListingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Public identifier of a booking
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Creates a new random `BookingId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `BookingId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Request body for creating a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    /// First night
    pub start_date: CalendarDate,
    /// Departure day
    pub end_date: CalendarDate,
    /// Listing being booked
    #[serde(rename = "listingPublicId")]
    pub listing_id: ListingId,
}

impl CreateBooking {
    /// Booking request for a validated interval
    #[must_use]
    pub const fn new(listing_id: ListingId, interval: DateInterval) -> Self {
        Self {
            start_date: interval.start,
            end_date: interval.end,
            listing_id,
        }
    }

    /// The requested stay
    #[must_use]
    pub const fn interval(&self) -> DateInterval {
        DateInterval::new(self.start_date, self.end_date)
    }
}

/// Request parameters for cancelling a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBooking {
    /// Booking to cancel
    #[serde(rename = "bookingPublicId")]
    pub booking_id: BookingId,
    /// Listing the booking belongs to
    #[serde(rename = "listingPublicId")]
    pub listing_id: ListingId,
    /// Whether the landlord cancels on the tenant's behalf
    pub by_landlord: bool,
}

// ============================================================================
// Responses
// ============================================================================

/// Reserved stay as sent by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedDates {
    /// Start of the stay
    pub start_date: DateTime<FixedOffset>,
    /// End of the stay
    pub end_date: DateTime<FixedOffset>,
}

impl BookedDates {
    /// Calendar interval of the stay, each end read in its own offset.
    #[must_use]
    pub fn to_interval(&self) -> DateInterval {
        DateInterval::new(
            CalendarDate::from_instant(&self.start_date),
            CalendarDate::from_instant(&self.end_date),
        )
    }
}

/// Listing picture reference.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPicture {
    /// Encoded image, if loaded
    pub file: Option<String>,
    /// MIME type of `file`
    pub file_content_type: Option<String>,
    /// Whether this is the cover picture
    #[serde(default)]
    pub is_cover: bool,
}

/// A booking as listed for a tenant or landlord.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedListing {
    /// Listing location
    pub location: String,
    /// Cover picture
    pub cover: DisplayPicture,
    /// Price of the whole stay
    pub total_price: Money,
    /// Reserved dates
    pub dates: BookedDates,
    /// Booking id
    #[serde(rename = "bookingPublicId")]
    pub booking_id: BookingId,
    /// Listing id
    #[serde(rename = "listingPublicId")]
    pub listing_id: ListingId,
}

/// Listing summary shown in search results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardListing {
    /// Nightly rate
    pub price: Money,
    /// Location
    pub location: String,
    /// Cover picture
    pub cover: DisplayPicture,
    /// Category name
    pub booking_category: String,
    /// Listing id
    #[serde(rename = "publicId")]
    pub listing_id: ListingId,
}

/// Capacity of a listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingInfo {
    /// Guests
    pub guests: u32,
    /// Bedrooms
    pub bedrooms: u32,
    /// Beds
    pub beds: u32,
    /// Bathrooms
    pub baths: u32,
}

/// Landlord shown on a listing page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandlordSummary {
    /// First name
    pub firstname: String,
    /// Avatar URL
    pub image_url: String,
}

/// Full listing page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Pictures
    pub pictures: Vec<DisplayPicture>,
    /// Capacity
    pub infos: ListingInfo,
    /// Nightly rate
    pub price: Money,
    /// Category name
    pub category: String,
    /// Location
    pub location: String,
    /// Landlord
    pub landlord: LandlordSummary,
}

/// Listing search: where, when, and how many.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Search {
    /// Location to search in
    pub location: String,
    /// Stay the listing must be free for
    pub dates: DateInterval,
    /// Required capacity
    pub infos: ListingInfo,
}

impl Search {
    /// Search for a stay in `location`
    #[must_use]
    pub fn new(location: impl Into<String>, dates: DateInterval, infos: ListingInfo) -> Self {
        Self {
            location: location.into(),
            dates,
            infos,
        }
    }

    /// Query parameters of the search, dates as `YYYY-MM-DD`
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("location", self.location.clone()),
            ("guests", self.infos.guests.to_string()),
            ("bedrooms", self.infos.bedrooms.to_string()),
            ("beds", self.infos.beds.to_string()),
            ("baths", self.infos.baths.to_string()),
            ("startDate", self.dates.start.to_string()),
            ("endDate", self.dates.end.to_string()),
        ]
    }
}
