//! Error taxonomy shared across crates.
//!
//! [`TransportError`] is the opaque failure a request collaborator reports.
//! It travels inside [`OperationState`](crate::operation::OperationState)
//! and is never thrown across the core boundary.

use crate::operation::UnknownError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of an external request (network, server, decoding).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportError {
    /// No detail available
    #[error("Unknown Error")]
    Unknown,

    /// The server answered with a non-success status
    #[error("Server responded with {code}: {message}")]
    Status {
        /// HTTP status code
        code: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// The request never reached the server
    #[error("Network failure: {0}")]
    Network(String),

    /// The response could not be decoded
    #[error("Malformed response: {0}")]
    Decode(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl TransportError {
    /// Whether retrying the same request could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { code, .. } => *code >= 500,
            Self::Unknown | Self::Decode(_) | Self::NotFound(_) => false,
        }
    }
}

impl UnknownError for TransportError {
    fn unknown() -> Self {
        Self::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_is_canonical_default() {
        assert_eq!(TransportError::unknown(), TransportError::Unknown);
        assert_eq!(TransportError::Unknown.to_string(), "Unknown Error");
    }

    #[test]
    fn server_errors_are_transient() {
        let unavailable = TransportError::Status {
            code: 503,
            message: "unavailable".into(),
        };
        let conflict = TransportError::Status {
            code: 409,
            message: "One booking already exists".into(),
        };
        assert!(unavailable.is_transient());
        assert!(!conflict.is_transient());
        assert!(TransportError::Network("reset".into()).is_transient());
    }
}
