//! Scoped slot release

use crate::shedder::Loadshedder;
use crate::stats::Stats;
use crate::token::Token;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Releases an admitted slot when dropped.
///
/// Wrapping the token in a guard guarantees the slot is freed when the
/// guarded operation finishes, including when it panics — the equivalent of
/// a deferred release around the wrapped work.
#[derive(Debug)]
pub struct SlotGuard {
    shedder: Arc<Loadshedder>,
    token: Token,
}

impl SlotGuard {
    /// Acquire a slot and wrap the accepted token in a guard.
    ///
    /// Returns the acquire-time snapshot, and `None` for the guard when the
    /// attempt was rejected.
    pub async fn acquire(
        shedder: Arc<Loadshedder>,
        cancel: &CancellationToken,
    ) -> (Stats, Option<SlotGuard>) {
        let (stats, token) = shedder.acquire(cancel).await;
        if !token.accepted() {
            return (stats, None);
        }

        (stats, Some(SlotGuard { shedder, token }))
    }

    /// The token held by this guard.
    pub fn token(&self) -> &Token {
        &self.token
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.shedder.release(&self.token);
    }
}
