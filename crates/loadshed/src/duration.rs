//! Lock-free moving average of operation durations

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Exponential moving average (EMA) of observed operation durations.
///
/// The average is stored as whole nanoseconds in a single atomic. Zero
/// doubles as the "no data yet" sentinel: the first recorded value is stored
/// directly instead of being blended against an empty baseline, and callers
/// must treat a zero average as insufficient history rather than a
/// measurement.
#[derive(Debug)]
pub struct DurationTracker {
    avg_nanos: AtomicU64,
    alpha: f64,
}

impl DurationTracker {
    /// Create a tracker with the given smoothing factor.
    ///
    /// Higher alpha (closer to 1) reacts faster to changes but is more
    /// volatile; lower alpha is more stable but slower to adapt.
    ///
    /// # Panics
    ///
    /// Panics if `alpha` is outside the open interval (0, 1).
    pub fn new(alpha: f64) -> Self {
        assert!(
            alpha > 0.0 && alpha < 1.0,
            "loadshed: ema alpha must be between 0 and 1 (exclusive)"
        );
        Self {
            avg_nanos: AtomicU64::new(0),
            alpha,
        }
    }

    /// Fold one observation into the average.
    ///
    /// Applies `new = alpha * sample + (1 - alpha) * old`, blended in
    /// floating point and rounded back to the nearest whole nanosecond so
    /// repeated updates cannot accumulate float drift. Concurrent updates
    /// are resolved by retrying the compare-and-swap, never by locking.
    pub fn record(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);

        loop {
            let old = self.avg_nanos.load(Ordering::Acquire);
            let new = if old == 0 {
                // First measurement, use it directly
                nanos
            } else {
                let blended = self.alpha * nanos as f64 + (1.0 - self.alpha) * old as f64;
                blended.round() as u64
            };

            if self
                .avg_nanos
                .compare_exchange_weak(old, new, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }
    }

    /// Current average duration, or zero if nothing has been recorded yet.
    pub fn average(&self) -> Duration {
        Duration::from_nanos(self.avg_nanos.load(Ordering::Acquire))
    }
}
