//! Where reaction failures go.
//!
//! A reaction that returns an error or panics never stops the write that
//! triggered it. The failure is packaged as a [`ReactionFailure`] and handed
//! to the scheduler's [`ErrorSink`].

use crate::scheduler::ReactionId;
use std::fmt;

/// How a reaction failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The reaction returned `Err`
    Error,
    /// The reaction panicked
    Panic,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Panic => write!(f, "panic"),
        }
    }
}

/// One failed reaction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionFailure {
    /// Failed reaction
    pub reaction: ReactionId,
    /// Label given at registration, if any
    pub label: Option<&'static str>,
    /// Error or panic
    pub kind: FailureKind,
    /// Rendered error chain or panic message
    pub message: String,
}

/// Receives reaction failures.
pub trait ErrorSink {
    /// Report one failure
    fn report(&self, failure: &ReactionFailure);
}

/// Default sink: logs every failure at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, failure: &ReactionFailure) {
        tracing::error!(
            reaction = %failure.reaction,
            label = failure.label.unwrap_or("-"),
            kind = %failure.kind,
            "Reaction failed: {}",
            failure.message
        );
    }
}
