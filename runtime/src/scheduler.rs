//! Dependency tracking and reaction scheduling.
//!
//! A [`Scheduler`] owns the dependency graph between cells and reactions.
//! Reactions discover their dependencies by reading cells: every tracked read
//! made while a reaction runs is recorded, and the recorded set replaces the
//! reaction's previous dependencies when the run ends.
//!
//! A write settles synchronously. Dependents of the written cell are queued
//! in registration order and run before `write` returns. Writes made by a
//! reaction while a write is settling join the same queue, so each reaction
//! runs once per queued trigger and never re-enters itself.
//!
//! The scheduler is a cheap `Rc` handle. It is `!Send` by construction: all
//! cells, reactions and slots that share one scheduler live on one thread.

use crate::config::RuntimeConfig;
use crate::error::ProtocolMisuse;
use crate::metrics::ReactionMetrics;
use crate::sink::{ErrorSink, FailureKind, ReactionFailure, TracingErrorSink};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

/// Identity of a reactive cell within one scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(u64);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

/// Identity of a reaction within one scheduler.
///
/// Ids grow with registration, so ordering by id is registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReactionId(u64);

impl fmt::Display for ReactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reaction#{}", self.0)
    }
}

/// Lifecycle of a registered reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionState {
    /// Runs whenever a dependency is written
    Active,
    /// Never runs again
    Disposed,
}

type ReactionFn = Box<dyn FnMut() -> anyhow::Result<()>>;

struct ReactionEntry {
    run: Rc<RefCell<ReactionFn>>,
    deps: BTreeSet<CellId>,
    state: Rc<Cell<ReactionState>>,
    label: Option<&'static str>,
}

#[derive(Default)]
struct Graph {
    reactions: BTreeMap<ReactionId, ReactionEntry>,
    dependents: HashMap<CellId, BTreeSet<ReactionId>>,
}

impl Graph {
    fn unlink(&mut self, id: ReactionId) {
        if let Some(entry) = self.reactions.remove(&id) {
            for cell in &entry.deps {
                self.detach(*cell, id);
            }
        }
    }

    fn detach(&mut self, cell: CellId, id: ReactionId) {
        if let Some(set) = self.dependents.get_mut(&cell) {
            set.remove(&id);
            if set.is_empty() {
                self.dependents.remove(&cell);
            }
        }
    }
}

/// Reads recorded for one running reaction, or an untracked section.
struct Frame {
    reaction: Option<ReactionId>,
    reads: BTreeSet<CellId>,
}

struct Inner {
    config: RuntimeConfig,
    sink: Rc<dyn ErrorSink>,
    next_cell: Cell<u64>,
    next_reaction: Cell<u64>,
    graph: RefCell<Graph>,
    frames: RefCell<Vec<Frame>>,
    queue: RefCell<BTreeSet<ReactionId>>,
    runs: RefCell<HashMap<ReactionId, usize>>,
    flushing: Cell<bool>,
    batch_depth: Cell<usize>,
    pending_disposals: RefCell<Vec<ReactionId>>,
}

/// Shared handle to a dependency graph.
///
/// Cloning is cheap and every clone refers to the same graph.
///
/// # Example
///
/// ```
/// use stayflow_runtime::{ReactiveCell, Scheduler};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let scheduler = Scheduler::new();
/// let nights = ReactiveCell::new(&scheduler, 2_u32);
/// let seen = Rc::new(Cell::new(0));
///
/// let view = nights.reader();
/// let sink = Rc::clone(&seen);
/// let handle = scheduler.register(move || sink.set(view.read()));
///
/// nights.write(5);
/// assert_eq!(seen.get(), 5);
/// handle.dispose();
/// ```
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<Inner>,
}

impl Scheduler {
    /// Scheduler with default configuration, logging failures via `tracing`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default(), Rc::new(TracingErrorSink))
    }

    /// Scheduler with explicit configuration and error sink.
    #[must_use]
    pub fn with_config(config: RuntimeConfig, sink: Rc<dyn ErrorSink>) -> Self {
        Self {
            inner: Rc::new(Inner {
                config,
                sink,
                next_cell: Cell::new(0),
                next_reaction: Cell::new(0),
                graph: RefCell::new(Graph::default()),
                frames: RefCell::new(Vec::new()),
                queue: RefCell::new(BTreeSet::new()),
                runs: RefCell::new(HashMap::new()),
                flushing: Cell::new(false),
                batch_depth: Cell::new(0),
                pending_disposals: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> RuntimeConfig {
        self.inner.config
    }

    /// Register an infallible reaction and run it once to capture its
    /// dependencies.
    #[must_use = "dropping the handle leaves no way to dispose the reaction"]
    pub fn register<F>(&self, mut reaction: F) -> ReactionHandle
    where
        F: FnMut() + 'static,
    {
        self.insert(
            None,
            Box::new(move || {
                reaction();
                Ok(())
            }),
        )
    }

    /// Register a fallible reaction.
    ///
    /// An `Err` from any run is reported to the error sink; the reaction
    /// stays registered.
    #[must_use = "dropping the handle leaves no way to dispose the reaction"]
    pub fn try_register<F>(&self, reaction: F) -> ReactionHandle
    where
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        self.insert(None, Box::new(reaction))
    }

    /// Register a fallible reaction with a label used in logs and failure
    /// reports.
    #[must_use = "dropping the handle leaves no way to dispose the reaction"]
    pub fn try_register_labeled<F>(&self, label: &'static str, reaction: F) -> ReactionHandle
    where
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        self.insert(Some(label), Box::new(reaction))
    }

    /// Run `f` without recording any reads into the current reaction.
    pub fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        self.inner.frames.borrow_mut().push(Frame {
            reaction: None,
            reads: BTreeSet::new(),
        });
        let guard = FrameGuard {
            scheduler: self,
            armed: true,
        };
        let out = f();
        drop(guard);
        self.flush_if_idle();
        out
    }

    /// Run `f` and settle all writes it makes in a single pass.
    ///
    /// Reactions that depend on several cells written inside the batch run
    /// once, after `f` returns.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        let depth = &self.inner.batch_depth;
        depth.set(depth.get() + 1);
        let guard = BatchGuard { scheduler: self };
        let out = f();
        drop(guard);
        self.flush_if_idle();
        out
    }

    /// Stop a reaction registered on this scheduler. Idempotent.
    pub fn dispose(&self, handle: &ReactionHandle) {
        self.retire(handle.id, &handle.state);
    }

    /// Number of reactions that are still active
    #[must_use]
    pub fn active_reactions(&self) -> usize {
        self.inner
            .graph
            .borrow()
            .reactions
            .values()
            .filter(|entry| entry.state.get() == ReactionState::Active)
            .count()
    }

    /// Active reactions that depend on `cell`, in registration order.
    #[must_use]
    pub fn dependents_of(&self, cell: CellId) -> Vec<ReactionId> {
        let graph = self.inner.graph.borrow();
        graph
            .dependents
            .get(&cell)
            .map(|set| {
                set.iter()
                    .copied()
                    .filter(|id| {
                        graph
                            .reactions
                            .get(id)
                            .is_some_and(|entry| entry.state.get() == ReactionState::Active)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Cells the reaction read during its last run.
    #[must_use]
    pub fn dependencies_of(&self, reaction: ReactionId) -> Vec<CellId> {
        self.inner
            .graph
            .borrow()
            .reactions
            .get(&reaction)
            .map(|entry| entry.deps.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn allocate_cell(&self) -> CellId {
        let id = self.inner.next_cell.get();
        self.inner.next_cell.set(id + 1);
        CellId(id)
    }

    /// Record a read of `cell` by the innermost running reaction.
    pub(crate) fn track_read(&self, cell: CellId) {
        if let Some(frame) = self.inner.frames.borrow_mut().last_mut() {
            if frame.reaction.is_some() {
                frame.reads.insert(cell);
            }
        }
    }

    /// Reject writes to a cell that a running reaction has read.
    pub(crate) fn check_write(&self, cell: CellId) {
        let offender = self
            .inner
            .frames
            .borrow()
            .iter()
            .find(|frame| frame.reads.contains(&cell))
            .and_then(|frame| frame.reaction);
        if let Some(reaction) = offender {
            self.abandon_cycle();
            ProtocolMisuse::CyclicWrite { cell, reaction }.raise();
        }
    }

    /// Queue the dependents of `cell` and settle them unless a pass, a batch
    /// or a reaction run is already in progress.
    pub(crate) fn propagate(&self, cell: CellId) {
        {
            let graph = self.inner.graph.borrow();
            let Some(dependents) = graph.dependents.get(&cell) else {
                return;
            };
            let mut queue = self.inner.queue.borrow_mut();
            for id in dependents {
                if graph
                    .reactions
                    .get(id)
                    .is_some_and(|entry| entry.state.get() == ReactionState::Active)
                {
                    queue.insert(*id);
                }
            }
        }
        self.flush_if_idle();
    }

    fn is_idle(&self) -> bool {
        !self.inner.flushing.get()
            && self.inner.batch_depth.get() == 0
            && self.inner.frames.borrow().is_empty()
    }

    fn flush_if_idle(&self) {
        if self.is_idle() {
            self.flush();
        }
    }

    fn insert(&self, label: Option<&'static str>, run: ReactionFn) -> ReactionHandle {
        let id = ReactionId(self.inner.next_reaction.get());
        self.inner.next_reaction.set(id.0 + 1);
        let state = Rc::new(Cell::new(ReactionState::Active));
        self.inner.graph.borrow_mut().reactions.insert(
            id,
            ReactionEntry {
                run: Rc::new(RefCell::new(run)),
                deps: BTreeSet::new(),
                state: Rc::clone(&state),
                label,
            },
        );
        tracing::debug!(reaction = %id, label = label.unwrap_or("-"), "Reaction registered");

        self.run_reaction(id);
        self.flush_if_idle();

        ReactionHandle {
            id,
            state,
            scheduler: Rc::downgrade(&self.inner),
        }
    }

    fn flush(&self) {
        self.inner.flushing.set(true);
        let guard = FlushGuard { scheduler: self };
        loop {
            let next = self.inner.queue.borrow_mut().pop_first();
            let Some(id) = next else { break };
            let runs = {
                let mut runs = self.inner.runs.borrow_mut();
                let count = runs.entry(id).or_insert(0);
                *count += 1;
                *count
            };
            if runs > self.inner.config.max_reruns_per_cycle {
                ProtocolMisuse::RerunLimitExceeded { reaction: id, runs }.raise();
            }
            self.run_reaction(id);
        }
        drop(guard);
        self.settle_disposals();
    }

    fn run_reaction(&self, id: ReactionId) {
        let (run, label) = {
            let graph = self.inner.graph.borrow();
            match graph.reactions.get(&id) {
                Some(entry) if entry.state.get() == ReactionState::Active => {
                    (Rc::clone(&entry.run), entry.label)
                }
                _ => return,
            }
        };

        tracing::trace!(reaction = %id, label = label.unwrap_or("-"), "Running reaction");
        ReactionMetrics::record_run();

        self.inner.frames.borrow_mut().push(Frame {
            reaction: Some(id),
            reads: BTreeSet::new(),
        });
        let mut guard = FrameGuard {
            scheduler: self,
            armed: true,
        };
        let outcome = self.invoke(&run);
        guard.armed = false;
        drop(guard);
        let reads = self
            .inner
            .frames
            .borrow_mut()
            .pop()
            .map(|frame| frame.reads)
            .unwrap_or_default();
        self.relink(id, reads);

        if let Err((kind, message)) = outcome {
            ReactionMetrics::record_failure();
            self.inner.sink.report(&ReactionFailure {
                reaction: id,
                label,
                kind,
                message,
            });
        }
    }

    fn invoke(&self, run: &Rc<RefCell<ReactionFn>>) -> Result<(), (FailureKind, String)> {
        if !self.inner.config.catch_panics {
            return (run.borrow_mut())().map_err(|e| (FailureKind::Error, format!("{e:#}")));
        }
        match panic::catch_unwind(AssertUnwindSafe(|| (run.borrow_mut())())) {
            Ok(result) => result.map_err(|e| (FailureKind::Error, format!("{e:#}"))),
            Err(payload) => {
                if payload.is::<ProtocolMisuse>() {
                    panic::resume_unwind(payload);
                }
                Err((FailureKind::Panic, panic_message(payload.as_ref())))
            }
        }
    }

    /// Replace the recorded dependencies of `id` with `reads`.
    fn relink(&self, id: ReactionId, reads: BTreeSet<CellId>) {
        let mut graph = self.inner.graph.borrow_mut();
        let graph = &mut *graph;
        let Some(entry) = graph.reactions.get_mut(&id) else {
            return;
        };
        if entry.state.get() != ReactionState::Active {
            return;
        }
        for stale in entry.deps.difference(&reads) {
            if let Some(set) = graph.dependents.get_mut(stale) {
                set.remove(&id);
                if set.is_empty() {
                    graph.dependents.remove(stale);
                }
            }
        }
        for fresh in reads.difference(&entry.deps) {
            graph.dependents.entry(*fresh).or_default().insert(id);
        }
        entry.deps = reads;
    }

    fn retire(&self, id: ReactionId, state: &Cell<ReactionState>) {
        if state.get() == ReactionState::Disposed {
            return;
        }
        state.set(ReactionState::Disposed);
        self.inner.queue.borrow_mut().remove(&id);
        tracing::debug!(reaction = %id, "Reaction disposed");

        if self.inner.flushing.get() || !self.inner.frames.borrow().is_empty() {
            self.inner.pending_disposals.borrow_mut().push(id);
        } else {
            self.inner.graph.borrow_mut().unlink(id);
        }
    }

    fn settle_disposals(&self) {
        let pending: Vec<ReactionId> = self.inner.pending_disposals.borrow_mut().drain(..).collect();
        if pending.is_empty() {
            return;
        }
        let mut graph = self.inner.graph.borrow_mut();
        for id in pending {
            graph.unlink(id);
        }
    }

    /// Drop queued work after a misuse so the scheduler stays usable.
    fn abandon_cycle(&self) {
        self.inner.queue.borrow_mut().clear();
        self.inner.runs.borrow_mut().clear();
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.inner.config)
            .field("active_reactions", &self.active_reactions())
            .field("flushing", &self.inner.flushing.get())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "reaction panicked".to_string()
    }
}

/// Pops the current frame if the run unwinds.
struct FrameGuard<'a> {
    scheduler: &'a Scheduler,
    armed: bool,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.scheduler.inner.frames.borrow_mut().pop();
        }
    }
}

/// Ends a settle pass, also when it unwinds.
struct FlushGuard<'a> {
    scheduler: &'a Scheduler,
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        let inner = &self.scheduler.inner;
        inner.flushing.set(false);
        inner.runs.borrow_mut().clear();
        if std::thread::panicking() {
            inner.queue.borrow_mut().clear();
        }
    }
}

struct BatchGuard<'a> {
    scheduler: &'a Scheduler,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        let depth = &self.scheduler.inner.batch_depth;
        depth.set(depth.get().saturating_sub(1));
    }
}

/// Handle to a registered reaction.
///
/// Dropping the handle does not dispose the reaction; call
/// [`dispose`](Self::dispose) or hand the handle to a [`ReactionScope`].
#[derive(Debug)]
pub struct ReactionHandle {
    id: ReactionId,
    state: Rc<Cell<ReactionState>>,
    scheduler: Weak<Inner>,
}

impl ReactionHandle {
    /// Reaction id
    #[must_use]
    pub const fn id(&self) -> ReactionId {
        self.id
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> ReactionState {
        self.state.get()
    }

    /// Stop the reaction. Idempotent.
    ///
    /// Disposing while a write is settling takes effect immediately for
    /// scheduling purposes: the reaction does not run again, even if it is
    /// still queued in the current pass.
    pub fn dispose(&self) {
        match self.scheduler.upgrade() {
            Some(inner) => Scheduler { inner }.retire(self.id, &self.state),
            None => self.state.set(ReactionState::Disposed),
        }
    }
}

/// Owns reactions and disposes all of them when dropped.
///
/// View models keep one scope for their whole lifetime so teardown is a
/// single drop.
#[derive(Debug, Default)]
pub struct ReactionScope {
    handles: Vec<ReactionHandle>,
}

impl ReactionScope {
    /// Empty scope
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a reaction
    pub fn hold(&mut self, handle: ReactionHandle) {
        self.handles.push(handle);
    }

    /// Number of reactions held
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether the scope holds nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Dispose every held reaction now.
    pub fn dispose_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.dispose();
        }
    }
}

impl Drop for ReactionScope {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)] // Test code
mod tests {
    use super::*;
    use crate::cell::ReactiveCell;

    #[derive(Default)]
    struct Collect(RefCell<Vec<ReactionFailure>>);

    impl ErrorSink for Collect {
        fn report(&self, failure: &ReactionFailure) {
            self.0.borrow_mut().push(failure.clone());
        }
    }

    fn counter() -> (Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let c = Rc::new(Cell::new(0));
        (Rc::clone(&c), c)
    }

    #[test]
    fn registration_runs_once_and_captures_dependencies() {
        let scheduler = Scheduler::new();
        let cell = ReactiveCell::new(&scheduler, 1);
        let (runs, seen) = counter();
        let view = cell.reader();
        let handle = scheduler.register(move || {
            let _ = view.read();
            seen.set(seen.get() + 1);
        });

        assert_eq!(runs.get(), 1);
        assert_eq!(scheduler.dependents_of(cell.id()), vec![handle.id()]);
        assert_eq!(scheduler.dependencies_of(handle.id()), vec![cell.id()]);
    }

    #[test]
    fn each_write_runs_each_dependent_once() {
        let scheduler = Scheduler::new();
        let cell = ReactiveCell::new(&scheduler, 0);
        let (runs, seen) = counter();
        let view = cell.reader();
        let _handle = scheduler.register(move || {
            let _ = view.read();
            let _ = view.read();
            seen.set(seen.get() + 1);
        });

        cell.write(1);
        cell.write(2);
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn dependents_run_in_registration_order() {
        let scheduler = Scheduler::new();
        let cell = ReactiveCell::new(&scheduler, 0);
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut handles = Vec::new();
        for tag in ["first", "second", "third"] {
            let view = cell.reader();
            let order = Rc::clone(&order);
            handles.push(scheduler.register(move || {
                if view.read() > 0 {
                    order.borrow_mut().push(tag);
                }
            }));
        }

        cell.write(1);
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn dependencies_follow_branches() {
        let scheduler = Scheduler::new();
        let flag = ReactiveCell::new(&scheduler, true);
        let left = ReactiveCell::new(&scheduler, 0);
        let right = ReactiveCell::new(&scheduler, 0);
        let (flag_view, left_view, right_view) = (flag.reader(), left.reader(), right.reader());
        let handle = scheduler.register(move || {
            if flag_view.read() {
                let _ = left_view.read();
            } else {
                let _ = right_view.read();
            }
        });

        assert_eq!(scheduler.dependents_of(right.id()), Vec::new());
        flag.write(false);
        assert_eq!(scheduler.dependents_of(left.id()), Vec::new());
        assert_eq!(scheduler.dependents_of(right.id()), vec![handle.id()]);
    }

    #[test]
    fn disposed_reaction_never_runs_again() {
        let scheduler = Scheduler::new();
        let cell = ReactiveCell::new(&scheduler, 0);
        let (runs, seen) = counter();
        let view = cell.reader();
        let handle = scheduler.register(move || {
            let _ = view.read();
            seen.set(seen.get() + 1);
        });

        handle.dispose();
        scheduler.dispose(&handle);
        cell.write(1);

        assert_eq!(runs.get(), 1);
        assert_eq!(handle.state(), ReactionState::Disposed);
        assert_eq!(scheduler.active_reactions(), 0);
        assert!(scheduler.dependents_of(cell.id()).is_empty());
    }

    #[test]
    fn disposal_during_fan_out_skips_queued_reaction() {
        let scheduler = Scheduler::new();
        let cell = ReactiveCell::new(&scheduler, 0);
        let victim: Rc<RefCell<Option<ReactionHandle>>> = Rc::new(RefCell::new(None));
        let (victim_runs, seen) = counter();

        let view = cell.reader();
        let slot = Rc::clone(&victim);
        let _killer = scheduler.register(move || {
            if view.read() > 0 {
                if let Some(handle) = slot.borrow().as_ref() {
                    handle.dispose();
                }
            }
        });
        let view = cell.reader();
        *victim.borrow_mut() = Some(scheduler.register(move || {
            let _ = view.read();
            seen.set(seen.get() + 1);
        }));

        cell.write(1);
        assert_eq!(victim_runs.get(), 1);
        assert_eq!(scheduler.dependents_of(cell.id()).len(), 1);
    }

    #[test]
    fn failing_reaction_is_isolated() {
        let sink = Rc::new(Collect::default());
        let scheduler = Scheduler::with_config(RuntimeConfig::default(), sink.clone());
        let cell = ReactiveCell::new(&scheduler, 0);

        let view = cell.reader();
        let _failing = scheduler.try_register_labeled("failing", move || {
            if view.read() > 0 {
                anyhow::bail!("backend unreachable");
            }
            Ok(())
        });
        let view = cell.reader();
        let _panicking = scheduler.register(move || {
            if view.read() > 0 {
                panic!("boom");
            }
        });
        let (runs, seen) = counter();
        let view = cell.reader();
        let _healthy = scheduler.register(move || {
            let _ = view.read();
            seen.set(seen.get() + 1);
        });

        cell.write(1);

        assert_eq!(runs.get(), 2);
        let failures = sink.0.borrow();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].kind, FailureKind::Error);
        assert_eq!(failures[0].label, Some("failing"));
        assert_eq!(failures[0].message, "backend unreachable");
        assert_eq!(failures[1].kind, FailureKind::Panic);
        assert_eq!(failures[1].message, "boom");
        assert_eq!(scheduler.active_reactions(), 3);
    }

    #[test]
    #[should_panic]
    fn writing_a_cell_read_in_the_same_run_is_misuse() {
        let scheduler = Scheduler::new();
        let cell = Rc::new(ReactiveCell::new(&scheduler, 0));
        let inner = Rc::clone(&cell);
        let _handle = scheduler.register(move || {
            let value = inner.read();
            inner.write(value + 1);
        });
    }

    #[test]
    fn writes_from_reactions_settle_before_outer_write_returns() {
        let scheduler = Scheduler::new();
        let source = ReactiveCell::new(&scheduler, 1);
        let doubled = Rc::new(ReactiveCell::new(&scheduler, 0));
        let seen = Rc::new(Cell::new(0));

        let view = source.reader();
        let target = Rc::clone(&doubled);
        let _mirror = scheduler.register(move || target.write(view.read() * 2));
        let view = doubled.reader();
        let out = Rc::clone(&seen);
        let _observer = scheduler.register(move || out.set(view.read()));

        source.write(21);
        assert_eq!(seen.get(), 42);
    }

    #[test]
    #[should_panic]
    fn ping_pong_between_reactions_hits_rerun_limit() {
        let scheduler = Scheduler::with_config(
            RuntimeConfig::default().with_max_reruns_per_cycle(4),
            Rc::new(TracingErrorSink),
        );
        let a = Rc::new(ReactiveCell::new(&scheduler, 0));
        let b = Rc::new(ReactiveCell::new(&scheduler, 0));

        let (read_a, write_b) = (a.reader(), Rc::clone(&b));
        let _ab = scheduler.register(move || write_b.write(read_a.read() + 1));
        let (read_b, write_a) = (b.reader(), Rc::clone(&a));
        let _ba = scheduler.register(move || write_a.write(read_b.read() + 1));
    }

    #[test]
    fn batch_runs_shared_dependents_once() {
        let scheduler = Scheduler::new();
        let first = ReactiveCell::new(&scheduler, 0);
        let second = ReactiveCell::new(&scheduler, 0);
        let (runs, seen) = counter();
        let (a, b) = (first.reader(), second.reader());
        let _handle = scheduler.register(move || {
            let _ = a.read() + b.read();
            seen.set(seen.get() + 1);
        });

        scheduler.batch(|| {
            first.write(1);
            second.write(2);
        });
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn untracked_reads_do_not_subscribe() {
        let scheduler = Scheduler::new();
        let cell = ReactiveCell::new(&scheduler, 0);
        let view = cell.reader();
        let inner = scheduler.clone();
        let handle = scheduler.register(move || {
            let _ = inner.untracked(|| view.read());
        });

        assert!(scheduler.dependencies_of(handle.id()).is_empty());
    }

    #[test]
    fn scope_disposes_on_drop() {
        let scheduler = Scheduler::new();
        let cell = ReactiveCell::new(&scheduler, 0);
        let mut scope = ReactionScope::new();
        for _ in 0..3 {
            let view = cell.reader();
            scope.hold(scheduler.register(move || {
                let _ = view.read();
            }));
        }
        assert_eq!(scope.len(), 3);
        assert_eq!(scheduler.active_reactions(), 3);

        drop(scope);
        assert_eq!(scheduler.active_reactions(), 0);
        cell.write(1);
    }
}
