//! Error types for booking services and view models.

use crate::availability::ValidationError;
use stayflow_runtime::SlotError;
use thiserror::Error;

/// Errors returned to the caller of a service or view-model command.
///
/// Transport failures are not here: they are published through the request
/// slot as `OperationState::Error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// The request slot already has a request in flight
    #[error(transparent)]
    Slot(#[from] SlotError),

    /// The selected stay cannot be booked
    #[error("Invalid selection: {0}")]
    InvalidSelection(#[from] ValidationError),

    /// Booking requires a signed-in user
    #[error("Sign in to book this listing")]
    NotAuthenticated,

    /// The booking is not in the current list
    #[error("Booking {0} is not listed")]
    UnknownBooking(String),
}

/// Result type for booking commands
pub type Result<T> = std::result::Result<T, BookingError>;
