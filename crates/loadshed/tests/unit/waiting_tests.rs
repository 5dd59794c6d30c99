//! Waiting queue tests: requests wait within the waiting limit, rejection
//! beyond it, waiter handoff on release, cancellation while waiting.

use loadshed::{Config, Loadshedder};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Spawns a waiter that blocks in acquire, holds the slot until `hold` is
/// cancelled, then releases.
fn spawn_holder(
    shedder: &Arc<Loadshedder>,
    cancel: &CancellationToken,
    hold: &CancellationToken,
) -> tokio::task::JoinHandle<bool> {
    let shedder = Arc::clone(shedder);
    let cancel = cancel.clone();
    let hold = hold.clone();
    tokio::spawn(async move {
        let (_, token) = shedder.acquire(&cancel).await;
        if !token.accepted() {
            return false;
        }
        hold.cancelled().await;
        shedder.release(&token);
        true
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn test_accepts_within_waiting_limit() {
    let shedder = Arc::new(Loadshedder::new(Config {
        limit: 2,
        waiting_limit: 2,
    }));
    let cancel = CancellationToken::new();
    let hold = CancellationToken::new();

    let (stats1, token1) = shedder.acquire(&cancel).await;
    assert!(token1.accepted());
    assert_eq!(stats1.running, 1);

    let (stats2, token2) = shedder.acquire(&cancel).await;
    assert!(token2.accepted());
    assert_eq!(stats2.running, 2);

    // Two more enter the waiting queue.
    let waiter1 = spawn_holder(&shedder, &cancel, &hold);
    let waiter2 = spawn_holder(&shedder, &cancel, &hold);

    tokio::time::sleep(Duration::from_millis(50)).await;

    let stats = shedder.stats();
    assert_eq!(stats.running, 2);
    assert_eq!(stats.waiting, 2);
    assert_eq!(stats.limit, 2);

    // Free the running slots so the waiters move to running.
    shedder.release(&token1);
    shedder.release(&token2);
    hold.cancel();

    assert!(waiter1.await.expect("waiter task failed"));
    assert!(waiter2.await.expect("waiter task failed"));

    let final_stats = shedder.stats();
    assert_eq!(final_stats.running, 0);
    assert_eq!(final_stats.waiting, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejects_beyond_waiting_limit() {
    let shedder = Arc::new(Loadshedder::new(Config {
        limit: 2,
        waiting_limit: 1,
    }));
    let cancel = CancellationToken::new();
    let hold = CancellationToken::new();

    let (_, token1) = shedder.acquire(&cancel).await;
    let (_, token2) = shedder.acquire(&cancel).await;
    assert!(token1.accepted());
    assert!(token2.accepted());

    let waiter = spawn_holder(&shedder, &cancel, &hold);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mid_stats = shedder.stats();
    assert_eq!(mid_stats.running, 2);
    assert_eq!(mid_stats.waiting, 1);

    // One past limit + waiting_limit: hard rejection, instantly.
    let (stats, token) = shedder.acquire(&cancel).await;
    assert!(!token.accepted());
    // The rejection snapshot includes the shed attempt: occupancy was
    // briefly 4, so two requests show past the limit.
    assert_eq!(stats.running, 2);
    assert_eq!(stats.waiting, 2);

    shedder.release(&token1);
    shedder.release(&token2);
    hold.cancel();
    assert!(waiter.await.expect("waiter task failed"));

    let final_stats = shedder.stats();
    assert_eq!(final_stats.running, 0);
    assert_eq!(final_stats.waiting, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_hard_rejection_has_zero_wait_time() {
    let shedder = Arc::new(Loadshedder::new(Config {
        limit: 2,
        waiting_limit: 2,
    }));
    let cancel = CancellationToken::new();
    let hold = CancellationToken::new();

    let (_, token1) = shedder.acquire(&cancel).await;
    let (_, token2) = shedder.acquire(&cancel).await;
    let waiter1 = spawn_holder(&shedder, &cancel, &hold);
    let waiter2 = spawn_holder(&shedder, &cancel, &hold);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(shedder.stats().waiting, 2);

    // Fifth request exceeds limit + waiting_limit.
    let (stats5, token5) = shedder.acquire(&cancel).await;
    assert!(!token5.accepted());
    assert_eq!(stats5.wait_time, Duration::ZERO);

    shedder.release(&token1);
    shedder.release(&token2);
    hold.cancel();
    assert!(waiter1.await.expect("waiter task failed"));
    assert!(waiter2.await.expect("waiter task failed"));

    let final_stats = shedder.stats();
    assert_eq!(final_stats.running, 0);
    assert_eq!(final_stats.waiting, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_release_unblocks_waiters_one_at_a_time() {
    let shedder = Arc::new(Loadshedder::new(Config {
        limit: 2,
        waiting_limit: 10,
    }));
    let cancel = CancellationToken::new();

    let (_, token1) = shedder.acquire(&cancel).await;
    let (_, token2) = shedder.acquire(&cancel).await;

    let acquired = Arc::new(AtomicI64::new(0));
    let mut waiters = Vec::new();
    for _ in 0..3 {
        let shedder = Arc::clone(&shedder);
        let cancel = cancel.clone();
        let acquired = Arc::clone(&acquired);
        waiters.push(tokio::spawn(async move {
            let (_, token) = shedder.acquire(&cancel).await;
            assert!(token.accepted());
            acquired.fetch_add(1, Ordering::Relaxed);
            // Hold briefly so releases are observable one at a time.
            tokio::time::sleep(Duration::from_millis(100)).await;
            shedder.release(&token);
        }));
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    let stats = shedder.stats();
    assert_eq!(stats.running, 2);
    assert_eq!(stats.waiting, 3);

    // Each release lets exactly one waiter through; running stays capped.
    shedder.release(&token1);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(acquired.load(Ordering::Relaxed) >= 1);
    assert_eq!(shedder.stats().running, 2);

    shedder.release(&token2);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(acquired.load(Ordering::Relaxed) >= 2);

    for waiter in waiters {
        waiter.await.expect("waiter task failed");
    }
    assert_eq!(acquired.load(Ordering::Relaxed), 3);

    let final_stats = shedder.stats();
    assert_eq!(final_stats.running, 0);
    assert_eq!(final_stats.waiting, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_all_waiters_cancelled_simultaneously() {
    let shedder = Arc::new(Loadshedder::new(Config {
        limit: 2,
        waiting_limit: 10,
    }));
    let background = CancellationToken::new();

    let (_, token1) = shedder.acquire(&background).await;
    let (_, token2) = shedder.acquire(&background).await;

    let cancel = CancellationToken::new();
    let mut waiters = Vec::new();
    for _ in 0..5 {
        let shedder = Arc::clone(&shedder);
        let cancel = cancel.clone();
        waiters.push(tokio::spawn(async move {
            let (_, token) = shedder.acquire(&cancel).await;
            assert!(!token.accepted(), "expected acquisition to be cancelled");
        }));
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    let stats = shedder.stats();
    assert_eq!(stats.running, 2);
    assert_eq!(stats.waiting, 5);

    cancel.cancel();
    for waiter in waiters {
        waiter.await.expect("waiter task failed");
    }

    // Every cancelled waiter unwound its speculative increment.
    let stats = shedder.stats();
    assert_eq!(stats.running, 2);
    assert_eq!(stats.waiting, 0);

    shedder.release(&token1);
    shedder.release(&token2);
    assert_eq!(shedder.stats().running, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancellation_while_waiting_returns_promptly() {
    let shedder = Arc::new(Loadshedder::new(Config {
        limit: 1,
        waiting_limit: 2,
    }));
    let background = CancellationToken::new();

    let (_, token1) = shedder.acquire(&background).await;
    assert!(token1.accepted());

    // Deadline-style cancellation of a waiting acquire.
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        }
    });

    let start = Instant::now();
    let (stats, token) = shedder.acquire(&cancel).await;
    let elapsed = start.elapsed();

    assert!(!token.accepted());
    assert!(
        elapsed >= Duration::from_millis(50),
        "expected to wait until cancellation, returned after {elapsed:?}"
    );
    assert!(
        elapsed < Duration::from_secs(2),
        "expected prompt return after cancellation, took {elapsed:?}"
    );
    assert!(
        stats.wait_time >= Duration::from_millis(50),
        "expected measured wait for cancelled request, got {:?}",
        stats.wait_time
    );

    shedder.release(&token1);
    let final_stats = shedder.stats();
    assert_eq!(final_stats.running, 0);
    assert_eq!(final_stats.waiting, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_pre_cancelled_token_rejects() {
    let shedder = Loadshedder::new(Config {
        limit: 10,
        waiting_limit: 0,
    });

    let cancel = CancellationToken::new();
    cancel.cancel();

    let (stats, token) = shedder.acquire(&cancel).await;
    assert!(!token.accepted());
    assert_eq!(stats.limit, 10);

    let final_stats = shedder.stats();
    assert_eq!(final_stats.running, 0);
    assert_eq!(final_stats.waiting, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_partial_waiters_cancelled() {
    let shedder = Arc::new(Loadshedder::new(Config {
        limit: 2,
        waiting_limit: 10,
    }));
    let background = CancellationToken::new();

    let (_, token1) = shedder.acquire(&background).await;
    let (_, token2) = shedder.acquire(&background).await;

    // Two waiters on a deadline that will fire before any slot frees up.
    let deadline = CancellationToken::new();
    tokio::spawn({
        let deadline = deadline.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            deadline.cancel();
        }
    });

    let mut doomed = Vec::new();
    for _ in 0..2 {
        let shedder = Arc::clone(&shedder);
        let deadline = deadline.clone();
        doomed.push(tokio::spawn(async move {
            let (_, token) = shedder.acquire(&deadline).await;
            token.accepted()
        }));
    }

    // One waiter that can wait indefinitely.
    let survivor = tokio::spawn({
        let shedder = Arc::clone(&shedder);
        let background = background.clone();
        async move {
            let (_, token) = shedder.acquire(&background).await;
            assert!(token.accepted());
            shedder.release(&token);
        }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    let stats = shedder.stats();
    assert_eq!(stats.running, 2);
    assert_eq!(stats.waiting, 3);

    // Let the deadline fire, then free one slot for the survivor.
    tokio::time::sleep(Duration::from_millis(100)).await;
    for task in doomed {
        assert!(!task.await.expect("doomed waiter task failed"));
    }

    shedder.release(&token1);
    survivor.await.expect("surviving waiter task failed");

    shedder.release(&token2);
    let final_stats = shedder.stats();
    assert_eq!(final_stats.running, 0);
    assert_eq!(final_stats.waiting, 0);
}
