//! # Stayflow Core
//!
//! Core value types for the Stayflow booking client.
//!
//! This crate holds everything that is plain data or a pure function:
//!
//! - **`OperationState`**: tri-state (`Init` / `Ok` / `Error`) result of one
//!   asynchronous request, with its builder
//! - **Calendar**: `CalendarDate` and closed `DateInterval`s
//! - **Money**: minor-unit amounts
//! - **Reducer / Effect**: view-model logic as `(State, Action, Environment) → Effects`
//! - **Environment**: injected collaborators (`Calendar`, `Notifier`)
//!
//! Nothing here holds interior mutability; the reactive runtime lives in
//! `stayflow-runtime`.
//!
//! ## Example
//!
//! ```ignore
//! use stayflow_core::*;
//!
//! impl Reducer for BookDateReducer {
//!     type State = BookDateState;
//!     type Action = BookDateAction;
//!     type Environment = BookDateEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut BookDateState,
//!         action: BookDateAction,
//!         env: &BookDateEnvironment,
//!     ) -> SmallVec<[Effect<BookDateAction>; 4]> {
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// Calendar days and day intervals
pub mod calendar;

/// Transport error taxonomy
pub mod error;

/// Money value object
pub mod money;

/// User-facing notifications
pub mod notification;

/// Operation lifecycle state and its builder
pub mod operation;

/// Paging parameters and results
pub mod pagination;

/// Reducer module - view-model logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// The runtime `Store` owns the state and executes the returned effects.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for view-model logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Updates `state` in place and returns effect descriptions for the
        /// runtime to execute. Must not perform I/O.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects are values returned by reducers, executed by the `Store`.
pub mod effect {
    use crate::notification::Notification;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    #[derive(Debug, Clone, PartialEq)]
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects one after another
        Sequential(Vec<Effect<Action>>),

        /// Show a notification through the environment's notifier
        Notify(Notification),

        /// Feed an action back into the reducer
        Dispatch(Box<Action>),
    }

    impl<Action> Effect<Action> {
        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Dispatch `action` after the current reduction
        #[must_use]
        pub fn dispatch(action: Action) -> Effect<Action> {
            Effect::Dispatch(Box::new(action))
        }

        /// Whether this effect does nothing
        #[must_use]
        pub fn is_none(&self) -> bool {
            match self {
                Effect::None => true,
                Effect::Sequential(effects) => effects.iter().all(Effect::is_none),
                Effect::Notify(_) | Effect::Dispatch(_) => false,
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and handed to
/// constructors explicitly; there is no global registry.
pub mod environment {
    use crate::calendar::CalendarDate;
    use crate::notification::Notification;
    use chrono::{FixedOffset, Offset, Utc};

    /// Calendar trait - abstracts "today" for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Test - fixed day for deterministic tests
    /// struct FixedCalendar { today: CalendarDate }
    /// impl Calendar for FixedCalendar {
    ///     fn today(&self) -> CalendarDate {
    ///         self.today
    ///     }
    /// }
    /// ```
    pub trait Calendar {
        /// The current calendar day
        fn today(&self) -> CalendarDate;
    }

    /// Calendar backed by the system clock at a fixed UTC offset.
    #[derive(Debug, Clone, Copy)]
    pub struct SystemCalendar {
        offset: FixedOffset,
    }

    impl SystemCalendar {
        /// System calendar in the given offset
        #[must_use]
        pub const fn new(offset: FixedOffset) -> Self {
            Self { offset }
        }

        /// System calendar in UTC
        #[must_use]
        pub fn utc() -> Self {
            Self::new(Utc.fix())
        }
    }

    impl Calendar for SystemCalendar {
        fn today(&self) -> CalendarDate {
            CalendarDate::from_instant(&Utc::now().with_timezone(&self.offset))
        }
    }

    /// Toast / notification collaborator.
    pub trait Notifier {
        /// Deliver a notification to the user
        fn send(&self, notification: Notification);
    }
}
