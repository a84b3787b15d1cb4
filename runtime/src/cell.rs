//! Observable cells.
//!
//! A [`ReactiveCell`] is the single writer of a value. Readers get a
//! [`ReadCell`] (or a [`Derived`] projection) that can read but never write,
//! so ownership of a write path is visible in the types.

use crate::error::ProtocolMisuse;
use crate::metrics::CellMetrics;
use crate::scheduler::{CellId, Scheduler};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

struct CellInner<T> {
    id: CellId,
    value: RefCell<T>,
    version: Cell<u64>,
    scheduler: Scheduler,
}

impl<T> CellInner<T> {
    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.scheduler.track_read(self.id);
        f(&self.value.borrow())
    }
}

/// Writable observable value.
///
/// Reads inside a running reaction subscribe that reaction to the cell.
/// Every write notifies all dependents, even when the new value equals the
/// old one.
pub struct ReactiveCell<T> {
    inner: Rc<CellInner<T>>,
}

impl<T: 'static> ReactiveCell<T> {
    /// New cell registered with `scheduler`
    #[must_use]
    pub fn new(scheduler: &Scheduler, initial: T) -> Self {
        let id = scheduler.allocate_cell();
        tracing::trace!(cell = %id, "Cell created");
        Self {
            inner: Rc::new(CellInner {
                id,
                value: RefCell::new(initial),
                version: Cell::new(0),
                scheduler: scheduler.clone(),
            }),
        }
    }

    /// Cell id
    #[must_use]
    pub fn id(&self) -> CellId {
        self.inner.id
    }

    /// Number of writes so far. Not tracked.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Replace the value and run every dependent before returning.
    ///
    /// # Panics
    ///
    /// Raises [`ProtocolMisuse`] if a running reaction has read this cell
    /// in its current run, or if the value is borrowed by the caller.
    pub fn write(&self, value: T) {
        let inner = &self.inner;
        inner.scheduler.check_write(inner.id);
        let previous = {
            let Ok(mut slot) = inner.value.try_borrow_mut() else {
                ProtocolMisuse::ReentrantWrite { cell: inner.id }.raise();
            };
            std::mem::replace(&mut *slot, value)
        };
        drop(previous);
        inner.version.set(inner.version.get() + 1);
        CellMetrics::record_write();
        tracing::trace!(cell = %inner.id, version = inner.version.get(), "Cell written");
        inner.scheduler.propagate(inner.id);
    }

    /// Modify the value in place, then notify like [`write`](Self::write).
    pub fn update(&self, f: impl FnOnce(&mut T))
    where
        T: Clone,
    {
        let mut next = self.peek();
        f(&mut next);
        self.write(next);
    }

    /// Read-only view of this cell
    #[must_use]
    pub fn reader(&self) -> ReadCell<T> {
        ReadCell {
            inner: Rc::clone(&self.inner),
        }
    }

    /// Tracked read
    #[must_use]
    pub fn read(&self) -> T
    where
        T: Clone,
    {
        self.inner.with(T::clone)
    }

    /// Tracked borrow
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.with(f)
    }

    /// Read without subscribing the running reaction.
    #[must_use]
    pub fn peek(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Project this cell through `map`, recomputing only after writes
    #[must_use]
    pub fn derive<U, F>(&self, map: F) -> Derived<U>
    where
        U: 'static,
        F: Fn(&T) -> U + 'static,
    {
        self.reader().derive(map)
    }
}

impl<T: fmt::Debug> fmt::Debug for ReactiveCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveCell")
            .field("id", &self.inner.id)
            .field("version", &self.inner.version.get())
            .field("value", &self.inner.value)
            .finish()
    }
}

/// Read-only view of a [`ReactiveCell`].
pub struct ReadCell<T> {
    inner: Rc<CellInner<T>>,
}

impl<T: 'static> ReadCell<T> {
    /// Cell id
    #[must_use]
    pub fn id(&self) -> CellId {
        self.inner.id
    }

    /// Number of writes so far. Not tracked.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Tracked read
    #[must_use]
    pub fn read(&self) -> T
    where
        T: Clone,
    {
        self.inner.with(T::clone)
    }

    /// Tracked borrow
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.with(f)
    }

    /// Read without subscribing the running reaction.
    #[must_use]
    pub fn peek(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Project this view through `map`
    #[must_use]
    pub fn derive<U, F>(&self, map: F) -> Derived<U>
    where
        U: 'static,
        F: Fn(&T) -> U + 'static,
    {
        Derived {
            source: Rc::new(Projection {
                cell: Rc::clone(&self.inner),
                map,
            }),
            cache: Rc::new(RefCell::new(None)),
            computations: Rc::new(Cell::new(0)),
        }
    }
}

impl<T> Clone for ReadCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadCell")
            .field("id", &self.inner.id)
            .field("value", &self.inner.value)
            .finish()
    }
}

trait Source<U> {
    fn track(&self);
    fn version(&self) -> u64;
    fn compute(&self) -> U;
}

struct Projection<T, F> {
    cell: Rc<CellInner<T>>,
    map: F,
}

impl<T, U, F> Source<U> for Projection<T, F>
where
    F: Fn(&T) -> U,
{
    fn track(&self) {
        self.cell.scheduler.track_read(self.cell.id);
    }

    fn version(&self) -> u64 {
        self.cell.version.get()
    }

    fn compute(&self) -> U {
        (self.map)(&self.cell.value.borrow())
    }
}

/// Lazily memoized projection of a cell.
///
/// Reading a `Derived` inside a reaction subscribes the reaction to the
/// source cell. The projection is recomputed on the first read after each
/// write to the source and cached otherwise.
pub struct Derived<U> {
    source: Rc<dyn Source<U>>,
    cache: Rc<RefCell<Option<(u64, U)>>>,
    computations: Rc<Cell<u64>>,
}

impl<U: Clone> Derived<U> {
    /// Tracked read of the current projection
    #[must_use]
    pub fn read(&self) -> U {
        self.source.track();
        self.current()
    }

    /// Current projection without subscribing
    #[must_use]
    pub fn peek(&self) -> U {
        self.current()
    }

    /// How many times the projection has been computed
    #[must_use]
    pub fn computations(&self) -> u64 {
        self.computations.get()
    }

    fn current(&self) -> U {
        let version = self.source.version();
        if let Some((cached_at, value)) = self.cache.borrow().as_ref() {
            if *cached_at == version {
                return value.clone();
            }
        }
        let value = self.source.compute();
        self.computations.set(self.computations.get() + 1);
        *self.cache.borrow_mut() = Some((version, value.clone()));
        value
    }
}

impl<U> Clone for Derived<U> {
    fn clone(&self) -> Self {
        Self {
            source: Rc::clone(&self.source),
            cache: Rc::clone(&self.cache),
            computations: Rc::clone(&self.computations),
        }
    }
}

impl<U> fmt::Debug for Derived<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derived")
            .field("version", &self.source.version())
            .field("computations", &self.computations.get())
            .finish_non_exhaustive()
    }
}
