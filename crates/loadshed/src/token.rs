//! Admission tokens

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Outcome of one admission attempt.
///
/// Always returned by acquire; check [`Token::accepted`] to learn whether the
/// operation may proceed. Hand the token back to the engine's release when
/// the operation completes. Releasing the same token again, or a rejected
/// token, is a safe no-op — the release guard has effect exactly once, even
/// under concurrent release calls.
#[derive(Debug)]
pub struct Token {
    accepted: bool,
    released: AtomicBool,
    acquired_at: Option<Instant>,
}

impl Token {
    pub(crate) fn rejected() -> Self {
        Self {
            accepted: false,
            released: AtomicBool::new(false),
            acquired_at: None,
        }
    }

    pub(crate) fn accepted_now() -> Self {
        Self {
            accepted: true,
            released: AtomicBool::new(false),
            acquired_at: Some(Instant::now()),
        }
    }

    /// Whether the operation was admitted.
    pub fn accepted(&self) -> bool {
        self.accepted
    }

    /// Time elapsed since the slot was granted, if admitted.
    pub fn held_for(&self) -> Option<Duration> {
        self.acquired_at.map(|at| at.elapsed())
    }

    // Flips the release guard; returns true exactly once per accepted token.
    pub(crate) fn try_release(&self) -> bool {
        self.accepted
            && self
                .released
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }
}
