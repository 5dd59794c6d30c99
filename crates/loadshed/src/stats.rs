//! Occupancy statistics

use std::time::Duration;

/// Point-in-time snapshot of the admission state.
///
/// Returned by every acquire/release/stats call so callers never need a
/// separate polling step. Fields are read from atomics without locking: a
/// snapshot taken while counters are mutating is best-effort rather than a
/// consistent cut across fields, which is harmless since values self-correct
/// on the next call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Operations currently holding a slot, capped at `limit`.
    pub running: usize,
    /// Operations waiting for a slot to free up.
    pub waiting: usize,
    /// Configured concurrency limit.
    pub limit: usize,
    /// Time spent waiting. For acquire-side snapshots this is the measured
    /// in-call wait (exactly zero for hard rejections); the QoS engine
    /// reports the projected wait instead.
    pub wait_time: Duration,
}

impl Stats {
    /// Derive running/waiting from the single occupancy counter.
    ///
    /// `running = min(current, limit)`, `waiting = max(0, current - limit)`,
    /// so both are always consistent projections of one value.
    pub(crate) fn derive(current: i64, limit: usize, wait_time: Duration) -> Self {
        let limit_i64 = limit as i64;
        Self {
            running: current.clamp(0, limit_i64) as usize,
            waiting: (current - limit_i64).max(0) as usize,
            limit,
            wait_time,
        }
    }

    /// Ratio of running operations to the configured limit.
    pub fn utilization(&self) -> f64 {
        if self.limit == 0 {
            return 0.0;
        }
        self.running as f64 / self.limit as f64
    }
}
