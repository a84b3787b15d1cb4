//! # Stayflow Runtime
//!
//! Single-threaded reactive runtime for the Stayflow booking client.
//!
//! ## Core Components
//!
//! - **Scheduler**: dependency graph between cells and reactions; runs the
//!   dependents of a write, in registration order, before the write returns
//! - **`ReactiveCell`**: observable value with a single writer
//! - **Derived**: memoized projection of a cell
//! - **Slot**: one asynchronous request and its `OperationState`, with
//!   at-most-one-in-flight tickets
//! - **Store**: runs a reducer against state held in a cell
//!
//! ## Example
//!
//! ```
//! use stayflow_runtime::{Scheduler, Slot};
//! use stayflow_core::operation::Status;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let scheduler = Scheduler::new();
//! let create: Slot<u32, String> = Slot::new(&scheduler, "create-booking");
//!
//! let last = Rc::new(Cell::new(Status::Init));
//! let view = create.view();
//! let out = Rc::clone(&last);
//! let handle = scheduler.register(move || out.set(view.status()));
//!
//! create.fail(None);
//! assert_eq!(last.get(), Status::Error);
//! handle.dispose();
//! ```

/// Observable cells and derived values
pub mod cell;

/// Runtime configuration
pub mod config;

/// Error types for the runtime
pub mod error;

/// Metrics for observability
pub mod metrics;

/// Dependency tracking and reaction scheduling
pub mod scheduler;

/// Reaction failure reporting
pub mod sink;

/// Request slots
pub mod slot;

/// Reducer-driven view-model store
pub mod store;

pub use cell::{Derived, ReactiveCell, ReadCell};
pub use config::RuntimeConfig;
pub use error::{ProtocolMisuse, SlotError};
pub use scheduler::{CellId, ReactionHandle, ReactionId, ReactionScope, ReactionState, Scheduler};
pub use sink::{ErrorSink, FailureKind, ReactionFailure, TracingErrorSink};
pub use slot::{Slot, SlotView, Ticket};
pub use store::Store;
