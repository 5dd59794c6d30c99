//! Projected-wait admission engine

use crate::config::QosConfig;
use crate::duration::DurationTracker;
use crate::error::Result;
use crate::stats::Stats;
use crate::token::Token;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use validator::Validate;

/// Concurrency limiter that admits over-limit operations when their
/// projected queueing delay stays within a configured bound.
///
/// This is the alternative admission policy to [`Loadshedder`]'s waiting
/// queue: instead of blocking excess operations, it estimates how long a new
/// over-limit operation would have to wait — overflow depth times the
/// average observed operation duration — and admits it immediately when the
/// estimate is within `max_wait_time`. Nothing ever suspends. With no
/// duration history yet the projection is zero and over-limit operations are
/// admitted optimistically.
///
/// With `max_wait_time` of zero the projection test is disabled and the
/// engine degrades to a plain non-blocking limiter.
///
/// [`Loadshedder`]: crate::Loadshedder
#[derive(Debug)]
pub struct QosShedder {
    limit: usize,
    max_wait_time: Duration,
    current: AtomicI64,
    durations: DurationTracker,
}

impl QosShedder {
    /// Create a new QoS shedder.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid. Use [`QosShedder::try_new`]
    /// to validate it as a startup error instead.
    pub fn new(config: QosConfig) -> Self {
        match Self::try_new(config) {
            Ok(shedder) => shedder,
            Err(err) => panic!("loadshed: {err}"),
        }
    }

    /// Create a new QoS shedder, surfacing invalid configuration as an
    /// error.
    pub fn try_new(config: QosConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            limit: config.limit,
            max_wait_time: config.max_wait_time,
            current: AtomicI64::new(0),
            durations: DurationTracker::new(config.ema_alpha),
        })
    }

    /// Attempt to acquire a slot without blocking.
    ///
    /// Always returns a token; check [`Token::accepted`] for the outcome.
    pub fn acquire(&self) -> (Stats, Token) {
        let current = self.current.fetch_add(1, Ordering::Relaxed) + 1;

        if current > self.limit as i64 {
            let projected = self.projected_wait(current);
            if self.max_wait_time > Duration::ZERO && projected <= self.max_wait_time {
                // Over the limit, but the backlog is expected to drain fast
                // enough. An empty average projects zero: optimistic cold
                // start.
                return (self.snapshot(current), Token::accepted_now());
            }

            let current = self.current.fetch_sub(1, Ordering::Relaxed) - 1;
            return (self.snapshot(current), Token::rejected());
        }

        (self.snapshot(current), Token::accepted_now())
    }

    /// Release a previously acquired slot, feeding the measured operation
    /// duration into the moving average.
    ///
    /// Safe to call on rejected tokens and more than once per token; only
    /// the first release of an accepted token has any effect.
    pub fn release(&self, token: &Token) -> Stats {
        if token.try_release() {
            let current = self.current.fetch_sub(1, Ordering::Relaxed) - 1;
            if let Some(held) = token.held_for() {
                self.durations.record(held);
            }
            return self.snapshot(current);
        }

        self.stats()
    }

    /// Current occupancy snapshot.
    ///
    /// `wait_time` carries the projected wait for the current occupancy.
    pub fn stats(&self) -> Stats {
        self.snapshot(self.current.load(Ordering::Relaxed))
    }

    /// Configured concurrency limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Current average operation duration, or zero with no history yet.
    pub fn average_duration(&self) -> Duration {
        self.durations.average()
    }

    /// Estimate how long an operation at occupancy position `current` would
    /// wait for a slot: overflow depth times the average duration. Zero when
    /// under the limit or without duration history.
    fn projected_wait(&self, current: i64) -> Duration {
        let overflow = current - self.limit as i64;
        if overflow <= 0 {
            return Duration::ZERO;
        }

        let avg = self.durations.average();
        if avg.is_zero() {
            return Duration::ZERO;
        }

        avg.saturating_mul(u32::try_from(overflow).unwrap_or(u32::MAX))
    }

    fn snapshot(&self, current: i64) -> Stats {
        Stats::derive(current, self.limit, self.projected_wait(current))
    }
}
