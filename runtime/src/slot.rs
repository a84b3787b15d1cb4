//! Request slots.
//!
//! A [`Slot`] pairs one asynchronous operation with a reactive
//! [`OperationState`]. The owner triggers the operation, the operation
//! writes its terminal state, and observers react to the state through a
//! [`SlotView`].
//!
//! At most one request is in flight per slot. [`Slot::begin`] hands out a
//! [`Ticket`]; the completion presents it back. [`Slot::reset`] invalidates
//! any outstanding ticket, so a late response after a reset is dropped
//! instead of resurrecting a stale result.

use crate::cell::{Derived, ReactiveCell, ReadCell};
use crate::error::SlotError;
use crate::metrics::SlotMetrics;
use crate::scheduler::{CellId, Scheduler};
use stayflow_core::operation::{OperationState, Status, UnknownError};
use std::cell::Cell;
use std::fmt;

/// Proof that the holder started the in-flight request of a slot.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a ticket must be completed, or the slot stays busy until reset"]
pub struct Ticket {
    serial: u64,
}

/// Owner side of a request slot.
///
/// # Example
///
/// ```
/// use stayflow_runtime::{Scheduler, Slot};
/// use stayflow_core::operation::Status;
///
/// let scheduler = Scheduler::new();
/// let slot: Slot<u32, String> = Slot::new(&scheduler, "nights");
///
/// let ticket = slot.begin().unwrap();
/// assert!(slot.begin().is_err());
/// assert!(slot.settle(ticket, Ok(3)));
/// assert_eq!(slot.view().status(), Status::Ok);
/// ```
pub struct Slot<T, E> {
    name: &'static str,
    cell: ReactiveCell<OperationState<T, E>>,
    in_flight: Cell<Option<u64>>,
    next_serial: Cell<u64>,
}

impl<T: 'static, E: 'static> Slot<T, E> {
    /// New slot in `Init`
    #[must_use]
    pub fn new(scheduler: &Scheduler, name: &'static str) -> Self {
        Self {
            name,
            cell: ReactiveCell::new(scheduler, OperationState::Init),
            in_flight: Cell::new(None),
            next_serial: Cell::new(0),
        }
    }

    /// Slot name used in logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Id of the underlying cell
    #[must_use]
    pub fn id(&self) -> CellId {
        self.cell.id()
    }

    /// Read-only view for observers
    #[must_use]
    pub fn view(&self) -> SlotView<T, E> {
        SlotView {
            name: self.name,
            cell: self.cell.reader(),
        }
    }

    /// Whether a ticket is outstanding
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.get().is_some()
    }

    /// Claim the slot for a new request.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError::Busy`] while another request is in flight.
    pub fn begin(&self) -> Result<Ticket, SlotError> {
        if self.in_flight.get().is_some() {
            tracing::debug!(slot = self.name, "Trigger rejected, request in flight");
            return Err(SlotError::Busy { slot: self.name });
        }
        let serial = self.next_serial.get();
        self.next_serial.set(serial + 1);
        self.in_flight.set(Some(serial));
        tracing::debug!(slot = self.name, serial, "Request started");
        Ok(Ticket { serial })
    }

    /// Publish the terminal state of the request identified by `ticket`.
    ///
    /// Returns `false` and writes nothing if the ticket was invalidated by a
    /// reset in the meantime.
    pub fn complete(&self, ticket: Ticket, state: OperationState<T, E>) -> bool {
        if self.in_flight.get() != Some(ticket.serial) {
            SlotMetrics::record_late_completion();
            tracing::debug!(
                slot = self.name,
                serial = ticket.serial,
                "Dropping completion of a superseded request"
            );
            return false;
        }
        self.in_flight.set(None);
        tracing::debug!(slot = self.name, status = %state.status(), "Request completed");
        self.cell.write(state);
        true
    }

    /// Complete from a `Result`
    pub fn settle(&self, ticket: Ticket, result: Result<T, E>) -> bool {
        self.complete(ticket, OperationState::from_result(result))
    }

    /// Write `Ok(value)` directly.
    ///
    /// Direct writes supersede an outstanding ticket: its completion is
    /// dropped like one arriving after [`reset`](Self::reset).
    pub fn succeed(&self, value: T) {
        self.overwrite(OperationState::Ok(value));
    }

    /// Write an error directly; `None` becomes the unknown error.
    pub fn fail(&self, error: Option<E>)
    where
        E: UnknownError,
    {
        self.overwrite(stayflow_core::operation::failure(error));
    }

    /// Write an error that keeps a value for observers.
    pub fn fail_with_value(&self, error: Option<E>, value: T)
    where
        E: UnknownError,
    {
        self.overwrite(stayflow_core::operation::failure_with_value(error, value));
    }

    fn overwrite(&self, state: OperationState<T, E>) {
        if let Some(serial) = self.in_flight.take() {
            tracing::debug!(slot = self.name, serial, "Direct write supersedes in-flight request");
        }
        self.cell.write(state);
    }

    /// Return to `Init` and invalidate any outstanding ticket.
    pub fn reset(&self) {
        if let Some(serial) = self.in_flight.take() {
            tracing::debug!(slot = self.name, serial, "Reset abandons in-flight request");
        }
        self.cell.write(OperationState::Init);
    }

    /// Current state without subscribing
    #[must_use]
    pub fn peek(&self) -> OperationState<T, E>
    where
        T: Clone,
        E: Clone,
    {
        self.cell.peek()
    }
}

impl<T, E> fmt::Debug for Slot<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("name", &self.name)
            .field("in_flight", &self.in_flight.get())
            .finish_non_exhaustive()
    }
}

/// Observer side of a request slot.
pub struct SlotView<T, E> {
    name: &'static str,
    cell: ReadCell<OperationState<T, E>>,
}

impl<T: 'static, E: 'static> SlotView<T, E> {
    /// Slot name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Id of the underlying cell
    #[must_use]
    pub fn id(&self) -> CellId {
        self.cell.id()
    }

    /// Tracked read of the whole state
    #[must_use]
    pub fn read(&self) -> OperationState<T, E>
    where
        T: Clone,
        E: Clone,
    {
        self.cell.read()
    }

    /// Tracked borrow of the state
    pub fn with<R>(&self, f: impl FnOnce(&OperationState<T, E>) -> R) -> R {
        self.cell.with(f)
    }

    /// Tracked read of the status only
    #[must_use]
    pub fn status(&self) -> Status {
        self.cell.with(OperationState::status)
    }

    /// Current state without subscribing
    #[must_use]
    pub fn peek(&self) -> OperationState<T, E>
    where
        T: Clone,
        E: Clone,
    {
        self.cell.peek()
    }

    /// Memoized projection of the state
    #[must_use]
    pub fn derive<U, F>(&self, map: F) -> Derived<U>
    where
        U: 'static,
        F: Fn(&OperationState<T, E>) -> U + 'static,
    {
        self.cell.derive(map)
    }
}

impl<T, E> Clone for SlotView<T, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            cell: self.cell.clone(),
        }
    }
}

impl<T, E> fmt::Debug for SlotView<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotView")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn slot() -> (Scheduler, Slot<u32, String>) {
        let scheduler = Scheduler::new();
        let slot = Slot::new(&scheduler, "test");
        (scheduler, slot)
    }

    #[test]
    fn starts_in_init() {
        let (_, slot) = slot();
        assert!(slot.view().read().is_init());
        assert!(!slot.is_in_flight());
    }

    #[test]
    fn second_trigger_is_rejected_while_in_flight() {
        let (_, slot) = slot();
        let ticket = slot.begin().unwrap();
        assert_eq!(slot.begin(), Err(SlotError::Busy { slot: "test" }));
        assert!(slot.complete(ticket, OperationState::Ok(1)));
        assert!(slot.begin().is_ok());
    }

    #[test]
    fn completion_after_reset_is_dropped() {
        let (_, slot) = slot();
        let ticket = slot.begin().unwrap();
        slot.reset();
        assert!(!slot.settle(ticket, Ok(5)));
        assert!(slot.peek().is_init());
        assert!(!slot.is_in_flight());
    }

    #[test]
    fn reset_then_new_request_ignores_old_ticket() {
        let (_, slot) = slot();
        let stale = slot.begin().unwrap();
        slot.reset();
        let fresh = slot.begin().unwrap();
        assert!(!slot.settle(stale, Ok(1)));
        assert!(slot.is_in_flight());
        assert!(slot.settle(fresh, Ok(2)));
        assert_eq!(slot.peek().value(), Some(&2));
    }

    #[test]
    fn failure_without_error_uses_unknown_error() {
        let (_, slot) = slot();
        slot.fail(None);
        assert_eq!(slot.peek().error().map(String::as_str), Some("Unknown Error"));
    }

    #[test]
    fn failure_with_value_keeps_value() {
        let (_, slot) = slot();
        slot.fail_with_value(Some("gone".to_string()), 9);
        let state = slot.peek();
        assert!(state.is_error());
        assert_eq!(state.stale_value(), Some(&9));
    }

    #[test]
    fn direct_write_supersedes_in_flight_request() {
        let (_, slot) = slot();
        let ticket = slot.begin().unwrap();

        slot.succeed(7);

        assert!(!slot.is_in_flight());
        assert!(!slot.settle(ticket, Ok(1)));
        assert_eq!(slot.peek().value(), Some(&7));
        assert!(slot.begin().is_ok());
    }

    #[test]
    fn observers_see_every_transition() {
        let (scheduler, slot) = slot();
        let statuses = Rc::new(RefCell::new(Vec::new()));
        let view = slot.view();
        let out = Rc::clone(&statuses);
        let _handle = scheduler.register(move || out.borrow_mut().push(view.status()));

        let ticket = slot.begin().unwrap();
        slot.settle(ticket, Err("nope".to_string()));
        slot.reset();
        slot.succeed(4);

        assert_eq!(
            *statuses.borrow(),
            vec![Status::Init, Status::Error, Status::Init, Status::Ok]
        );
    }
}
