//! Integration tests for the rate limiter and backoff primitives
//!
//! Drives the limiter from concurrent tasks and checks that waits and
//! backoff sleeps honor cancellation.

#![cfg(feature = "runtime")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use kra_connect_common::error::ErrorKind;
use kra_connect_common::resilience::{
    sleep_or_cancel, BackoffPolicy, MockClock, RateLimiter, RateLimiterConfig,
};
use tokio_util::sync::CancellationToken;

/// Verifies the token bucket bound with a controlled clock.
///
/// # Test Steps
/// 1. Create a limiter of 10 requests per second on a mock clock
/// 2. Drain it and confirm exactly 10 grants
/// 3. Advance by `window / capacity` and confirm one more grant
#[test]
fn test_token_bucket_bound() {
    let clock = MockClock::new();
    let limiter =
        RateLimiter::with_clock(RateLimiterConfig::new(10, Duration::from_secs(1)), clock.clone())
            .expect("valid limiter");

    let granted = (0..50).filter(|_| limiter.try_acquire()).count();
    assert_eq!(granted, 10);

    clock.advance_millis(100);
    assert!(limiter.try_acquire());
    assert!(!limiter.try_acquire());
}

/// Checks that concurrent waiters are throttled to the refill rate.
///
/// # Test Steps
/// 1. Create a limiter of 5 requests per 100ms
/// 2. Launch 10 concurrent waiters
/// 3. Verify all complete and the second half had to wait for refill
#[tokio::test]
async fn test_concurrent_waiters_are_throttled() {
    let limiter = Arc::new(
        RateLimiter::new(RateLimiterConfig::new(5, Duration::from_millis(100)))
            .expect("valid limiter"),
    );
    let completed = Arc::new(AtomicUsize::new(0));
    let started = Instant::now();

    let waiters: Vec<_> = (0..10)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            let completed = Arc::clone(&completed);
            tokio::spawn(async move {
                limiter.wait().await;
                completed.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    for waiter in waiters {
        waiter.await.expect("waiter task panicked");
    }

    assert_eq!(completed.load(Ordering::SeqCst), 10);
    assert!(started.elapsed() >= Duration::from_millis(80));
}

/// Confirms cancellation releases a blocked waiter.
///
/// # Test Steps
/// 1. Drain a slow limiter
/// 2. Start a cancellable wait and cancel it after 20ms
/// 3. Verify a `Cancelled` error arrives well before the refill
#[tokio::test]
async fn test_wait_with_cancel_is_prompt() {
    let limiter = RateLimiter::new(RateLimiterConfig::new(1, Duration::from_secs(60)))
        .expect("valid limiter");
    assert!(limiter.try_acquire());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = limiter.wait_with_cancel(&cancel).await.expect_err("wait should be cancelled");
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(5));
}

/// Confirms the backoff schedule and its cancellable sleep work together.
///
/// # Test Steps
/// 1. Compute un-jittered delays for a 100ms/400ms policy
/// 2. Sleep the first delay with a live token
/// 3. Sleep the capped delay with a cancelled token
#[tokio::test]
async fn test_backoff_schedule_and_cancellation() {
    let policy = BackoffPolicy::new(Duration::from_millis(100), Duration::from_millis(400));
    let schedule: Vec<_> = (0..5).map(|attempt| policy.base_delay(attempt)).collect();
    assert_eq!(
        schedule,
        vec![
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(400),
            Duration::from_millis(400),
            Duration::from_millis(400),
        ]
    );

    let live = CancellationToken::new();
    sleep_or_cancel(Duration::from_millis(10), &live).await.expect("uncancelled sleep");

    let cancelled = CancellationToken::new();
    cancelled.cancel();
    let err = sleep_or_cancel(policy.delay(4), &cancelled).await.expect_err("cancelled sleep");
    assert!(err.is_cancelled());
}

/// Drives `sleep_or_cancel` from synchronous test code.
///
/// # Test Steps
/// 1. Complete a short sleep on a live token
/// 2. Cancel the token and confirm a long sleep returns `Cancelled` at once
#[cfg(feature = "test-utils")]
#[test]
fn test_sleep_or_cancel_from_blocking_code() {
    let token = CancellationToken::new();
    tokio_test::assert_ok!(tokio_test::block_on(sleep_or_cancel(Duration::from_millis(5), &token)));

    token.cancel();
    let started = Instant::now();
    let err = tokio_test::assert_err!(tokio_test::block_on(sleep_or_cancel(Duration::from_secs(60), &token)));
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(1));
}
