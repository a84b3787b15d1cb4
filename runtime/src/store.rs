//! Synchronous view-model store.
//!
//! A [`Store`] runs a [`Reducer`] against state held in a [`ReactiveCell`].
//! Every reduced action writes the new state, so reactions and derived
//! values observing the store update before `send` returns.

use crate::cell::{ReactiveCell, ReadCell};
use crate::metrics::StoreMetrics;
use crate::scheduler::Scheduler;
use stayflow_core::effect::Effect;
use stayflow_core::environment::Notifier;
use stayflow_core::reducer::Reducer;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

/// Reducer runtime bound to a scheduler.
///
/// Actions sent while another action is being processed (for example from a
/// reaction that observes the store) are queued and reduced in order after
/// the current one.
pub struct Store<R: Reducer> {
    state: ReactiveCell<R::State>,
    reducer: R,
    environment: R::Environment,
    notifier: Rc<dyn Notifier>,
    pending: RefCell<VecDeque<R::Action>>,
    processing: Cell<bool>,
}

impl<R> Store<R>
where
    R: Reducer,
    R::State: Clone + 'static,
    R::Action: fmt::Debug,
{
    /// Create a new store with initial state, reducer, and environment
    ///
    /// # Arguments
    ///
    /// - `scheduler`: Scheduler the state cell registers with
    /// - `initial_state`: The starting state for the store
    /// - `reducer`: The reducer implementation
    /// - `environment`: Injected dependencies
    /// - `notifier`: Executes [`Effect::Notify`]
    #[must_use]
    pub fn new(
        scheduler: &Scheduler,
        initial_state: R::State,
        reducer: R,
        environment: R::Environment,
        notifier: Rc<dyn Notifier>,
    ) -> Self {
        Self {
            state: ReactiveCell::new(scheduler, initial_state),
            reducer,
            environment,
            notifier,
            pending: RefCell::new(VecDeque::new()),
            processing: Cell::new(false),
        }
    }

    /// Reduce `action` and execute its effects, including any actions they
    /// dispatch.
    pub fn send(&self, action: R::Action) {
        self.pending.borrow_mut().push_back(action);
        if self.processing.get() {
            tracing::trace!("Store busy, action queued");
            return;
        }

        self.processing.set(true);
        let guard = ProcessingGuard(&self.processing);
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(action) = next else { break };
            self.process(action);
        }
        drop(guard);
    }

    fn process(&self, action: R::Action) {
        tracing::debug!(?action, "Processing action");

        let mut state = self.state.peek();
        let start = Instant::now();
        let effects = self.reducer.reduce(&mut state, action, &self.environment);
        StoreMetrics::record_action(start.elapsed());
        tracing::trace!("Reducer completed, returned {} effects", effects.len());

        self.state.write(state);

        for effect in effects {
            self.execute(effect);
        }
    }

    fn execute(&self, effect: Effect<R::Action>) {
        match effect {
            Effect::None => {}
            Effect::Sequential(effects) => {
                tracing::trace!("Executing Effect::Sequential with {} effects", effects.len());
                for effect in effects {
                    self.execute(effect);
                }
            }
            Effect::Notify(notification) => {
                tracing::debug!(severity = ?notification.severity, "Executing Effect::Notify");
                StoreMetrics::record_notification();
                self.notifier.send(notification);
            }
            Effect::Dispatch(action) => {
                tracing::trace!("Executing Effect::Dispatch");
                self.pending.borrow_mut().push_back(*action);
            }
        }
    }

    /// Tracked read of state via a closure
    ///
    /// ```ignore
    /// let nights = store.state(|s| s.quote.map(|q| q.nights));
    /// ```
    pub fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&R::State) -> T,
    {
        self.state.with(f)
    }

    /// Copy of the current state without subscribing
    #[must_use]
    pub fn snapshot(&self) -> R::State {
        self.state.peek()
    }

    /// Read-only view of the state cell
    #[must_use]
    pub fn view(&self) -> ReadCell<R::State> {
        self.state.reader()
    }

    /// Injected environment
    #[must_use]
    pub const fn environment(&self) -> &R::Environment {
        &self.environment
    }
}

impl<R: Reducer> fmt::Debug for Store<R>
where
    R::State: 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state.id())
            .field("pending", &self.pending.borrow().len())
            .finish_non_exhaustive()
    }
}

struct ProcessingGuard<'a>(&'a Cell<bool>);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
