//! Runtime configuration.

/// Configuration for a [`Scheduler`](crate::scheduler::Scheduler).
///
/// # Example
///
/// ```
/// use stayflow_runtime::RuntimeConfig;
///
/// let config = RuntimeConfig::default()
///     .with_max_reruns_per_cycle(8)
///     .with_catch_panics(false);
/// assert_eq!(config.max_reruns_per_cycle, 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// How many times one reaction may run while a single write settles.
    ///
    /// Exceeding it means reactions keep re-triggering each other through
    /// writes, which is reported as protocol misuse.
    pub max_reruns_per_cycle: usize,
    /// Whether a panicking reaction is isolated and reported to the error
    /// sink instead of unwinding through `write`.
    pub catch_panics: bool,
}

impl RuntimeConfig {
    /// Create a configuration with explicit values
    #[must_use]
    pub const fn new(max_reruns_per_cycle: usize, catch_panics: bool) -> Self {
        Self {
            max_reruns_per_cycle,
            catch_panics,
        }
    }

    /// Set the rerun limit
    #[must_use]
    pub const fn with_max_reruns_per_cycle(mut self, limit: usize) -> Self {
        self.max_reruns_per_cycle = limit;
        self
    }

    /// Enable or disable panic isolation
    #[must_use]
    pub const fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_reruns_per_cycle: 32,
            catch_panics: true,
        }
    }
}
