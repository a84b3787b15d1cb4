//! Lifecycle state of an asynchronous operation.
//!
//! An [`OperationState`] is what a request slot holds: nothing has happened yet
//! (`Init`), the operation produced a value (`Ok`), or it failed (`Error`).
//! States are immutable; every transition builds a new instance through
//! [`StateBuilder`] or the free functions [`initial`], [`success`] and
//! [`failure`].
//!
//! # Example
//!
//! ```
//! use stayflow_core::operation::{failure, success, OperationState, Status};
//! use stayflow_core::error::TransportError;
//!
//! let ok: OperationState<u32, TransportError> = success(7);
//! assert_eq!(ok.status(), Status::Ok);
//! assert_eq!(ok.value(), Some(&7));
//!
//! let failed: OperationState<u32, TransportError> = failure(None);
//! assert_eq!(failed.error(), Some(&TransportError::Unknown));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Phase of an operation. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Not started, or reset after the owning scope ended
    Init,
    /// Completed with a value
    Ok,
    /// Completed with an error
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "INIT"),
            Self::Ok => write!(f, "OK"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Error types that have a canonical "unknown error" instance.
///
/// [`failure`] substitutes this value when the caller supplies no error.
pub trait UnknownError {
    /// The canonical unknown error.
    fn unknown() -> Self;
}

impl UnknownError for String {
    fn unknown() -> Self {
        "Unknown Error".to_string()
    }
}

/// Current state of one asynchronous operation.
///
/// The variants make "value present but status says error" unrepresentable:
/// an `Error` may carry a stale value for display purposes, but
/// [`value`](Self::value) only ever returns the payload of `Ok`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationState<T, E> {
    /// No result yet
    Init,
    /// Completed successfully
    Ok(T),
    /// Failed
    Error {
        /// The failure
        error: E,
        /// Value carried through for partial-failure display (never authoritative)
        value: Option<T>,
    },
}

impl<T, E> Default for OperationState<T, E> {
    fn default() -> Self {
        Self::Init
    }
}

impl<T, E> OperationState<T, E> {
    /// The active status tag.
    #[must_use]
    pub const fn status(&self) -> Status {
        match self {
            Self::Init => Status::Init,
            Self::Ok(_) => Status::Ok,
            Self::Error { .. } => Status::Error,
        }
    }

    /// `true` while nothing has been recorded.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self, Self::Init)
    }

    /// `true` if the operation succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// `true` if the operation failed.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The authoritative value, present only when `Ok`.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Ok(value) => Some(value),
            _ => None,
        }
    }

    /// The value carried through a failure, if any.
    #[must_use]
    pub const fn stale_value(&self) -> Option<&T> {
        match self {
            Self::Error { value, .. } => value.as_ref(),
            _ => None,
        }
    }

    /// The error, present only when `Error`.
    #[must_use]
    pub const fn error(&self) -> Option<&E> {
        match self {
            Self::Error { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Convert a collaborator result into a terminal state.
    pub fn from_result(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(error) => Self::Error { error, value: None },
        }
    }

    /// Map the success payload (and any stale payload).
    pub fn map<U>(self, f: impl Fn(T) -> U) -> OperationState<U, E> {
        match self {
            Self::Init => OperationState::Init,
            Self::Ok(value) => OperationState::Ok(f(value)),
            Self::Error { error, value } => OperationState::Error {
                error,
                value: value.map(f),
            },
        }
    }

    /// Borrowing view of this state.
    #[must_use]
    pub const fn as_ref(&self) -> OperationState<&T, &E> {
        match self {
            Self::Init => OperationState::Init,
            Self::Ok(value) => OperationState::Ok(value),
            Self::Error { error, value } => OperationState::Error {
                error,
                value: value.as_ref(),
            },
        }
    }
}

/// Build a state with `status = Init`.
#[must_use]
pub const fn initial<T, E>() -> OperationState<T, E> {
    OperationState::Init
}

/// Build a state with `status = Ok`.
#[must_use]
pub const fn success<T, E>(value: T) -> OperationState<T, E> {
    OperationState::Ok(value)
}

/// Build a state with `status = Error`.
///
/// A missing error is replaced by [`UnknownError::unknown`].
#[must_use]
pub fn failure<T, E: UnknownError>(error: Option<E>) -> OperationState<T, E> {
    OperationState::Error {
        error: error.unwrap_or_else(E::unknown),
        value: None,
    }
}

/// Build a state with `status = Error` that still carries `value`.
#[must_use]
pub fn failure_with_value<T, E: UnknownError>(error: Option<E>, value: T) -> OperationState<T, E> {
    OperationState::Error {
        error: error.unwrap_or_else(E::unknown),
        value: Some(value),
    }
}

/// Typed constructor namespace for [`OperationState`].
///
/// Useful where the payload types cannot be inferred from the call site:
///
/// ```
/// use stayflow_core::operation::StateBuilder;
///
/// let state = StateBuilder::<Vec<u8>, String>::for_error(None);
/// assert_eq!(state.error().map(String::as_str), Some("Unknown Error"));
/// ```
pub struct StateBuilder<T, E> {
    _phantom: PhantomData<fn() -> (T, E)>,
}

impl<T, E: UnknownError> StateBuilder<T, E> {
    /// `Init` state.
    #[must_use]
    pub const fn for_init() -> OperationState<T, E> {
        initial()
    }

    /// `Ok` state holding `value`.
    #[must_use]
    pub const fn for_success(value: T) -> OperationState<T, E> {
        success(value)
    }

    /// `Error` state, defaulting the error when `None`.
    #[must_use]
    pub fn for_error(error: Option<E>) -> OperationState<T, E> {
        failure(error)
    }

    /// `Error` state carrying a stale value.
    #[must_use]
    pub fn for_error_with_value(error: Option<E>, value: T) -> OperationState<T, E> {
        failure_with_value(error, value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::error::TransportError;

    type State = OperationState<String, TransportError>;

    #[test]
    fn initial_has_no_value_or_error() {
        let state: State = initial();
        assert_eq!(state.status(), Status::Init);
        assert!(state.value().is_none());
        assert!(state.error().is_none());
        assert_eq!(state, State::default());
    }

    #[test]
    fn success_holds_value() {
        let state: State = success("abc".to_string());
        assert_eq!(state.status(), Status::Ok);
        assert_eq!(state.value().map(String::as_str), Some("abc"));
        assert!(state.error().is_none());
    }

    #[test]
    fn failure_defaults_to_unknown_error() {
        let state: State = failure(None);
        assert_eq!(state.status(), Status::Error);
        assert_eq!(state.error(), Some(&TransportError::Unknown));
        assert!(state.value().is_none());
    }

    #[test]
    fn failure_keeps_supplied_error() {
        let state: State = failure(Some(TransportError::NotFound("listing".into())));
        assert_eq!(
            state.error(),
            Some(&TransportError::NotFound("listing".into()))
        );
    }

    #[test]
    fn stale_value_is_not_authoritative() {
        let state: State = failure_with_value(None, "booking-1".to_string());
        assert!(state.value().is_none());
        assert_eq!(state.stale_value().map(String::as_str), Some("booking-1"));
    }

    #[test]
    fn builder_matches_free_functions() {
        assert_eq!(StateBuilder::<u8, String>::for_init(), initial());
        assert_eq!(StateBuilder::<u8, String>::for_success(3), success(3));
        assert_eq!(
            StateBuilder::<u8, String>::for_error(None),
            failure(Some("Unknown Error".to_string()))
        );
    }

    #[test]
    fn from_result_maps_both_arms() {
        let ok: OperationState<u8, String> = OperationState::from_result(Ok(1));
        let err: OperationState<u8, String> = OperationState::from_result(Err("boom".into()));
        assert!(ok.is_ok());
        assert!(err.is_error());
        assert!(err.stale_value().is_none());
    }

    #[test]
    fn map_transforms_payloads() {
        let state: OperationState<u8, String> = failure_with_value(None, 2);
        let mapped = state.map(|v| u32::from(v) * 10);
        assert_eq!(mapped.stale_value(), Some(&20));
    }

    #[test]
    fn status_display_matches_wire_names() {
        assert_eq!(Status::Init.to_string(), "INIT");
        assert_eq!(Status::Ok.to_string(), "OK");
        assert_eq!(Status::Error.to_string(), "ERROR");
    }

    #[test]
    fn serde_round_trip_keeps_variant() {
        let state: State = success("x".to_string());
        let json = serde_json::to_string(&state).unwrap();
        let back: State = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
