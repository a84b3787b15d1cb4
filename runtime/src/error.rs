//! Error types for the reactive runtime.

use crate::scheduler::{CellId, ReactionId};
use thiserror::Error;

/// Recoverable errors returned by request slots.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// A trigger is already in flight for this slot
    ///
    /// Returned by `Slot::begin` until the outstanding ticket completes or
    /// the slot is reset.
    #[error("Request slot '{slot}' already has a request in flight")]
    Busy {
        /// Slot name
        slot: &'static str,
    },
}

/// Broken runtime invariants.
///
/// These are programming errors. The runtime raises them with
/// [`std::panic::panic_any`] so they abort the current call stack, and
/// reaction isolation never swallows them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolMisuse {
    /// A reaction wrote a cell it read during the same run
    #[error("Reaction {reaction} wrote cell {cell} that it is currently reading")]
    CyclicWrite {
        /// Cell being written
        cell: CellId,
        /// Reaction that read it
        reaction: ReactionId,
    },

    /// Reactions kept re-triggering each other while one write settled
    #[error("Reaction {reaction} ran {runs} times while settling a single write")]
    RerunLimitExceeded {
        /// Reaction that hit the limit
        reaction: ReactionId,
        /// Runs observed in the cycle
        runs: usize,
    },

    /// A cell was written while its value was borrowed
    #[error("Cell {cell} was written while its value was borrowed")]
    ReentrantWrite {
        /// Cell being written
        cell: CellId,
    },
}

impl ProtocolMisuse {
    /// Log and raise the misuse.
    pub(crate) fn raise(self) -> ! {
        tracing::error!(misuse = %self, "Reactive protocol misuse");
        std::panic::panic_any(self)
    }
}
