//! Runtime metrics.
//!
//! Counters and histograms are recorded through the `metrics` facade. With
//! no recorder installed they are no-ops; a host application installs an
//! exporter and calls [`register_metrics`] once to attach descriptions.

use metrics::{describe_counter, describe_histogram};
use std::time::Duration;

// Re-export metrics macros for use in other crates
pub use metrics::{counter, histogram};

/// Register all metric descriptions.
pub fn register_metrics() {
    // Reactions
    describe_counter!(
        "stayflow_reactions_run_total",
        "Total number of reaction runs"
    );
    describe_counter!(
        "stayflow_reaction_failures_total",
        "Total number of reaction runs that returned an error or panicked"
    );

    // Cells
    describe_counter!(
        "stayflow_cell_writes_total",
        "Total number of reactive cell writes"
    );

    // Slots
    describe_counter!(
        "stayflow_slot_late_completions_total",
        "Total number of completions dropped because the slot was reset"
    );

    // Stores
    describe_counter!(
        "stayflow_store_actions_total",
        "Total number of actions reduced by view-model stores"
    );
    describe_histogram!(
        "stayflow_store_reduce_duration_seconds",
        "Time taken to reduce one action"
    );
    describe_counter!(
        "stayflow_store_notifications_total",
        "Total number of notifications emitted by view-model stores"
    );
}

/// Reaction metrics recorder.
pub struct ReactionMetrics;

impl ReactionMetrics {
    /// Record one reaction run.
    pub fn record_run() {
        counter!("stayflow_reactions_run_total").increment(1);
    }

    /// Record a failed reaction run.
    pub fn record_failure() {
        counter!("stayflow_reaction_failures_total").increment(1);
    }
}

/// Cell metrics recorder.
pub struct CellMetrics;

impl CellMetrics {
    /// Record one write.
    pub fn record_write() {
        counter!("stayflow_cell_writes_total").increment(1);
    }
}

/// Slot metrics recorder.
pub struct SlotMetrics;

impl SlotMetrics {
    /// Record a completion dropped after a reset.
    pub fn record_late_completion() {
        counter!("stayflow_slot_late_completions_total").increment(1);
    }
}

/// Store metrics recorder.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record an action reduced.
    pub fn record_action(duration: Duration) {
        counter!("stayflow_store_actions_total").increment(1);
        histogram!("stayflow_store_reduce_duration_seconds").record(duration.as_secs_f64());
    }

    /// Record a notification handed to the notifier.
    pub fn record_notification() {
        counter!("stayflow_store_notifications_total").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        register_metrics();
        ReactionMetrics::record_run();
        ReactionMetrics::record_failure();
        CellMetrics::record_write();
        SlotMetrics::record_late_completion();
        StoreMetrics::record_action(Duration::from_millis(1));
        StoreMetrics::record_notification();
    }
}
