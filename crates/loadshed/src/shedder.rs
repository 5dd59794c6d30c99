//! Waiting-queue admission engine

use crate::config::Config;
use crate::error::Result;
use crate::stats::Stats;
use crate::token::Token;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use validator::Validate;

/// Framework-agnostic concurrency limiter with an optional bounded waiting
/// queue.
///
/// At most `limit` operations run concurrently, enforced by a FIFO-fair
/// semaphore holding `limit` permits. Up to `waiting_limit` further
/// operations may block waiting for a permit; anything beyond that is shed
/// immediately without blocking. A single atomic counter tracks
/// running-plus-waiting occupancy, from which the [`Stats`] projections are
/// derived.
///
/// Rejection is an expected outcome, not an error: [`Loadshedder::acquire`]
/// always returns a [`Token`], and callers check [`Token::accepted`].
#[derive(Debug)]
pub struct Loadshedder {
    limit: usize,
    waiting_limit: usize,
    // running + waiting operations; incremented speculatively on every
    // acquire attempt so racing callers see monotonic occupancy positions
    current: AtomicI64,
    semaphore: Semaphore,
}

impl Loadshedder {
    /// Create a new load shedder.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid. Invalid static configuration
    /// has no runtime recovery; use [`Loadshedder::try_new`] to validate it
    /// as a startup error instead.
    pub fn new(config: Config) -> Self {
        match Self::try_new(config) {
            Ok(shedder) => shedder,
            Err(err) => panic!("loadshed: {err}"),
        }
    }

    /// Create a new load shedder, surfacing invalid configuration as an
    /// error.
    pub fn try_new(config: Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            limit: config.limit,
            waiting_limit: config.waiting_limit,
            current: AtomicI64::new(0),
            semaphore: Semaphore::new(config.limit),
        })
    }

    /// Attempt to acquire a slot for one operation.
    ///
    /// Always returns a token; check [`Token::accepted`] for the outcome.
    /// With a waiting queue configured this may suspend until a slot frees
    /// up or `cancel` is cancelled; without one it never suspends. Call
    /// release with the token when the operation completes, whatever the
    /// outcome.
    pub async fn acquire(&self, cancel: &CancellationToken) -> (Stats, Token) {
        let start = Instant::now();
        let current = self.current.fetch_add(1, Ordering::Relaxed) + 1;

        if current > (self.limit + self.waiting_limit) as i64 {
            // Even the waiting capacity is exceeded: undo the increment and
            // shed without blocking. The snapshot keeps the pre-undo value so
            // the shed attempt is visible to the caller.
            self.current.fetch_sub(1, Ordering::Relaxed);
            return (self.snapshot(current, Duration::ZERO), Token::rejected());
        }

        // Checked before the permit fast path so a pre-cancelled attempt is
        // rejected even when permits are free.
        if cancel.is_cancelled() {
            let current = self.current.fetch_sub(1, Ordering::Relaxed) - 1;
            return (self.snapshot(current, start.elapsed()), Token::rejected());
        }

        let admitted = if self.waiting_limit == 0 {
            match self.semaphore.try_acquire() {
                Ok(permit) => {
                    permit.forget();
                    true
                }
                Err(_) => false,
            }
        } else {
            tokio::select! {
                () = cancel.cancelled() => false,
                permit = self.semaphore.acquire() => match permit {
                    Ok(permit) => {
                        permit.forget();
                        true
                    }
                    Err(_) => false,
                },
            }
        };

        if !admitted {
            let current = self.current.fetch_sub(1, Ordering::Relaxed) - 1;
            return (self.snapshot(current, start.elapsed()), Token::rejected());
        }

        // The permit was forgotten above; release() restores it exactly once
        // per token via its idempotency guard.
        (self.snapshot(current, start.elapsed()), Token::accepted_now())
    }

    /// Release a previously acquired slot.
    ///
    /// Safe to call on rejected tokens and more than once per token; only
    /// the first release of an accepted token has any effect. Never blocks.
    pub fn release(&self, token: &Token) -> Stats {
        if token.try_release() {
            self.semaphore.add_permits(1);
            let current = self.current.fetch_sub(1, Ordering::Relaxed) - 1;
            return self.snapshot(current, Duration::ZERO);
        }

        self.stats()
    }

    /// Current occupancy snapshot.
    ///
    /// Lock-free; safe to call concurrently with any other operation.
    pub fn stats(&self) -> Stats {
        self.snapshot(self.current.load(Ordering::Relaxed), Duration::ZERO)
    }

    /// Configured concurrency limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Configured waiting limit.
    pub fn waiting_limit(&self) -> usize {
        self.waiting_limit
    }

    fn snapshot(&self, current: i64, wait_time: Duration) -> Stats {
        Stats::derive(current, self.limit, wait_time)
    }
}
