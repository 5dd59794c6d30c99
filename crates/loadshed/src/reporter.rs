//! Observability hooks

use crate::stats::Stats;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Hooks invoked at admission lifecycle points.
///
/// The engines never call these themselves: the layer driving
/// acquire/release (an HTTP middleware, a job runner) invokes the matching
/// hook with the snapshot it was handed. Implementations should be passed in
/// explicitly at construction rather than read from global state, so the
/// adapter stays independently testable.
pub trait Reporter: Send + Sync {
    /// An operation was admitted and is about to run.
    fn accepted(&self, stats: &Stats);

    /// An operation was shed.
    fn rejected(&self, stats: &Stats);

    /// An admitted operation finished after `duration`.
    fn completed(&self, stats: &Stats, duration: Duration) {
        let _ = (stats, duration);
    }
}

/// Reporter that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl NullReporter {
    /// Create a no-op reporter.
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for NullReporter {
    fn accepted(&self, _stats: &Stats) {}

    fn rejected(&self, _stats: &Stats) {}
}

/// Reporter that emits structured tracing events.
///
/// Accepted operations log at `info`, shed operations at `warn`, completions
/// at `debug`, each with the occupancy fields attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl LogReporter {
    /// Create a tracing-based reporter.
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for LogReporter {
    fn accepted(&self, stats: &Stats) {
        info!(
            running = stats.running,
            waiting = stats.waiting,
            limit = stats.limit,
            utilization = stats.utilization(),
            wait_time_us = stats.wait_time.as_micros() as u64,
            "operation accepted"
        );
    }

    fn rejected(&self, stats: &Stats) {
        warn!(
            running = stats.running,
            waiting = stats.waiting,
            limit = stats.limit,
            utilization = stats.utilization(),
            wait_time_us = stats.wait_time.as_micros() as u64,
            "operation rejected"
        );
    }

    fn completed(&self, stats: &Stats, duration: Duration) {
        debug!(
            running = stats.running,
            waiting = stats.waiting,
            limit = stats.limit,
            duration_us = duration.as_micros() as u64,
            "operation completed"
        );
    }
}
