//! # Stayflow Booking
//!
//! Booking domain of the Stayflow client.
//!
//! ## Components
//!
//! - **Availability engine**: reserved days, candidate validation, pricing
//! - **Services**: booking, listing, search and landlord-listing endpoints
//!   published through request slots, each request bounded by a timeout
//! - **View models**: the booking-date widget and the booked-listings list,
//!   each a reducer run by a store and subscribed to service slots
//! - **Collaborators**: transport traits, with in-memory implementations
//!   behind the `test-utils` feature
//!
//! ## Example
//!
//! ```
//! use stayflow_booking::availability::{Availability, CandidateRange};
//! use stayflow_core::calendar::{CalendarDate, DateInterval};
//! use stayflow_core::money::Money;
//!
//! let day = |d| CalendarDate::from_ymd(2024, 7, d).unwrap();
//! let availability = Availability::new(vec![DateInterval::new(day(1), day(3))]);
//!
//! let quote = availability
//!     .quote(&CandidateRange::new(day(4), day(6)), Money::from_major(100), day(1))
//!     .unwrap();
//! assert_eq!(quote.total, Money::from_major(200));
//! assert!(availability.check(&CandidateRange::new(day(3), day(5)), day(1)).is_err());
//! ```

/// Availability engine
pub mod availability;

/// Booking-date view model
pub mod book_date;

/// Booked-listings view model
pub mod booked_listings;

/// Request collaborators
pub mod client;

/// Configuration from the environment
pub mod config;

/// Error types
pub mod error;

/// In-memory collaborators
#[cfg(feature = "test-utils")]
pub mod mocks;

/// Request services
pub mod service;

/// Domain types and request/response DTOs
pub mod types;

pub use availability::{
    blocked_dates, is_valid_candidate, nights_between, price, validate_candidate, Availability,
    BlockedDates, CandidateRange, Quote, ValidationError,
};
pub use book_date::{BookDate, BookDateAction, BookDateEnvironment, BookDateReducer, BookDateState};
pub use booked_listings::{
    Audience, BookedListings, BookedListingsAction, BookedListingsReducer, BookedListingsState,
    BookedRow,
};
pub use client::{BookingClient, LandlordListingClient, ListingClient};
pub use config::{Config, ConfigError};
pub use error::{BookingError, Result};
pub use service::{BookingService, LandlordListingService, ListingService, DEFAULT_REQUEST_TIMEOUT};
pub use types::{
    BookedDates, BookedListing, BookingId, CancelBooking, CardListing, CreateBooking, Listing,
    ListingId, ListingInfo, Search,
};
