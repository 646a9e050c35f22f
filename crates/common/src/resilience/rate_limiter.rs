//! Token-bucket rate limiter for outbound API calls
//!
//! The bucket holds up to `max_requests` tokens and refills continuously at
//! `max_requests / window` tokens per second. Refill is lazy: it happens on
//! every acquisition attempt, so there is no background timer.
//!
//! Refill and decrement run under one mutex, so concurrent callers can never
//! spend the same token twice.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::backoff::sleep_or_cancel;
use super::{Clock, SystemClock};
use crate::error::{KraError, KraResult};
use crate::validation::validate_rate_limit;

/// Slack added to every computed wait so a sleeper wakes after the refill
const WAIT_BUFFER: Duration = Duration::from_millis(10);

/// Configuration for [`RateLimiter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// When `false` every acquisition succeeds immediately
    pub enabled: bool,
    /// Bucket capacity
    pub max_requests: u32,
    /// Time to refill an empty bucket
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self { enabled: true, max_requests: 100, window: Duration::from_secs(60) }
    }
}

impl RateLimiterConfig {
    /// Enabled limiter allowing `max_requests` per `window`
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self { enabled: true, max_requests, window }
    }

    /// Limiter that never blocks
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::default() }
    }

    /// Reject an enabled limiter with no capacity or an empty window
    pub fn validate(&self) -> KraResult<()> {
        if !self.enabled {
            return Ok(());
        }
        validate_rate_limit(self.max_requests, self.window)
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

/// Token-bucket rate limiter
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use kra_connect_common::resilience::{RateLimiter, RateLimiterConfig};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let limiter = RateLimiter::new(RateLimiterConfig::new(2, Duration::from_secs(1)))?;
///
/// assert!(limiter.try_acquire());
/// assert!(limiter.try_acquire());
/// assert!(!limiter.try_acquire());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RateLimiter<C: Clock = SystemClock> {
    config: RateLimiterConfig,
    state: Mutex<BucketState>,
    clock: C,
}

impl RateLimiter<SystemClock> {
    /// Limiter driven by the system clock
    pub fn new(config: RateLimiterConfig) -> KraResult<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Limiter driven by a custom clock
    pub fn with_clock(config: RateLimiterConfig, clock: C) -> KraResult<Self> {
        config.validate()?;
        let state = BucketState { tokens: config.max_requests, last_refill: clock.now() };
        Ok(Self { config, state: Mutex::new(state), clock })
    }

    /// Configuration this limiter was built with
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Whether acquisitions are actually limited
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Bucket capacity
    pub fn capacity(&self) -> u32 {
        self.config.max_requests
    }

    /// Tokens replenished per second
    pub fn refill_rate(&self) -> f64 {
        f64::from(self.config.max_requests) / self.config.window.as_secs_f64()
    }

    /// Time needed to replenish a single token
    fn token_interval(&self) -> Duration {
        self.config.window / self.config.max_requests
    }

    /// Add the whole tokens earned since the last refill
    ///
    /// The refill clock only moves forward by the time those tokens account
    /// for, so partial progress toward the next token is kept. A full bucket
    /// discards it.
    fn refill(&self, state: &mut BucketState) {
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(state.last_refill);
        let capacity = u128::from(self.config.max_requests);
        let window_nanos = self.config.window.as_nanos();

        let earned = elapsed.as_nanos().saturating_mul(capacity) / window_nanos;
        if earned == 0 {
            return;
        }

        let missing = u128::from(self.config.max_requests - state.tokens);
        if earned >= missing {
            state.tokens = self.config.max_requests;
            state.last_refill = now;
        } else {
            // earned < missing <= u32::MAX
            let added = u32::try_from(earned).unwrap_or(u32::MAX);
            state.tokens += added;
            state.last_refill += self.token_interval() * added;
        }

        debug!(
            event = "rate_limit.refill",
            earned = earned.min(missing) as u64,
            available = state.tokens,
            "refilled rate limiter tokens"
        );
    }

    /// Take one token if available
    ///
    /// Always succeeds when the limiter is disabled.
    pub fn try_acquire(&self) -> bool {
        if !self.config.enabled {
            return true;
        }

        let mut state = self.state.lock();
        self.refill(&mut state);

        if state.tokens == 0 {
            debug!(event = "rate_limit.exceeded", capacity = self.config.max_requests, "no tokens available");
            return false;
        }

        state.tokens -= 1;
        debug!(event = "rate_limit.acquire", remaining = state.tokens, "acquired rate limiter token");
        true
    }

    /// Wait until a token is acquired
    ///
    /// Never gives up on its own; callers that need a bound should use
    /// [`RateLimiter::wait_with_cancel`].
    pub async fn wait(&self) {
        while !self.try_acquire() {
            let delay = self.estimate_wait_time();
            debug!(event = "rate_limit.wait", delay_ms = delay.as_millis() as u64, "waiting for token");
            tokio::time::sleep(delay).await;
        }
    }

    /// Wait until a token is acquired or `cancel` fires
    pub async fn wait_with_cancel(&self, cancel: &CancellationToken) -> KraResult<()> {
        loop {
            if cancel.is_cancelled() {
                return Err(KraError::cancelled("rate limiter wait cancelled"));
            }
            if self.try_acquire() {
                return Ok(());
            }
            let delay = self.estimate_wait_time();
            debug!(event = "rate_limit.wait", delay_ms = delay.as_millis() as u64, "waiting for token");
            sleep_or_cancel(delay, cancel).await?;
        }
    }

    /// Tokens currently available after refill, or `-1` when disabled
    pub fn available_tokens(&self) -> i64 {
        if !self.config.enabled {
            return -1;
        }
        let mut state = self.state.lock();
        self.refill(&mut state);
        i64::from(state.tokens)
    }

    /// Expected delay before the next token becomes available
    ///
    /// Zero when a token is available now (or the limiter is disabled);
    /// otherwise one refill interval plus a 10 ms buffer.
    pub fn estimate_wait_time(&self) -> Duration {
        if self.available_tokens() != 0 {
            return Duration::ZERO;
        }
        self.token_interval() + WAIT_BUFFER
    }

    /// Refill the bucket to capacity and restart the refill clock
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.tokens = self.config.max_requests;
        state.last_refill = self.clock.now();
        debug!(event = "rate_limit.reset", capacity = self.config.max_requests, "rate limiter reset");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::error::ErrorKind;
    use crate::resilience::MockClock;

    fn limiter(max: u32, window: Duration) -> (RateLimiter<MockClock>, MockClock) {
        let clock = MockClock::new();
        let limiter = RateLimiter::with_clock(RateLimiterConfig::new(max, window), clock.clone())
            .expect("valid config");
        (limiter, clock)
    }

    /// Validates `RateLimiter::try_acquire` behavior for the bucket bound
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms exactly `capacity` acquisitions succeed without time
    ///   passing.
    /// - Confirms one more succeeds after `window / capacity`.
    #[test]
    fn test_bucket_bound_and_refill() {
        let (limiter, clock) = limiter(5, Duration::from_secs(10));

        let granted = (0..20).filter(|_| limiter.try_acquire()).count();
        assert_eq!(granted, 5);
        assert_eq!(limiter.available_tokens(), 0);

        clock.advance(Duration::from_secs(2));
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    /// Validates `RateLimiter::refill` behavior for the partial progress
    /// scenario.
    ///
    /// Assertions:
    /// - Ensures time short of one interval adds nothing.
    /// - Ensures accumulated partial intervals combine into a token.
    #[test]
    fn test_partial_refill_progress_is_kept() {
        let (limiter, clock) = limiter(4, Duration::from_secs(4));
        while limiter.try_acquire() {}

        clock.advance_millis(1_500);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        // 500ms left over from the previous step plus 500ms now
        clock.advance_millis(500);
        assert!(limiter.try_acquire());
    }

    #[test]
    fn test_refill_caps_at_capacity() {
        let (limiter, clock) = limiter(3, Duration::from_secs(3));
        assert!(limiter.try_acquire());
        clock.advance(Duration::from_secs(3_600));
        assert_eq!(limiter.available_tokens(), 3);
    }

    /// Validates `RateLimiter::available_tokens` behavior for the disabled
    /// limiter scenario.
    ///
    /// Assertions:
    /// - Confirms a disabled limiter reports `-1`.
    /// - Confirms acquisition always succeeds and no wait is estimated.
    #[test]
    fn test_disabled_limiter() {
        let limiter = RateLimiter::new(RateLimiterConfig::disabled()).expect("valid config");
        assert_eq!(limiter.available_tokens(), -1);
        assert!((0..1_000).all(|_| limiter.try_acquire()));
        assert_eq!(limiter.estimate_wait_time(), Duration::ZERO);
    }

    #[test]
    fn test_estimate_wait_time() {
        let (limiter, _clock) = limiter(2, Duration::from_secs(1));
        assert_eq!(limiter.estimate_wait_time(), Duration::ZERO);

        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert_eq!(limiter.estimate_wait_time(), Duration::from_millis(510));
    }

    #[test]
    fn test_reset_restores_capacity() {
        let (limiter, _clock) = limiter(3, Duration::from_secs(60));
        while limiter.try_acquire() {}
        limiter.reset();
        assert_eq!(limiter.available_tokens(), 3);
    }

    /// Validates `RateLimiterConfig::validate` behavior for the invalid
    /// configuration scenario.
    ///
    /// Assertions:
    /// - Ensures zero capacity and zero window are rejected when enabled.
    /// - Ensures a disabled config skips validation.
    #[test]
    fn test_invalid_configs_rejected() {
        let zero_capacity = RateLimiter::new(RateLimiterConfig::new(0, Duration::from_secs(1)));
        assert!(matches!(zero_capacity, Err(ref e) if e.kind() == ErrorKind::Validation));

        let zero_window = RateLimiter::new(RateLimiterConfig::new(10, Duration::ZERO));
        assert!(matches!(zero_window, Err(ref e) if e.to_string() == "Window duration must be positive"));

        let disabled = RateLimiterConfig { enabled: false, max_requests: 0, window: Duration::ZERO };
        assert!(disabled.validate().is_ok());
    }

    #[test]
    fn test_concurrent_acquire_never_double_spends() {
        let limiter = Arc::new(
            RateLimiter::new(RateLimiterConfig::new(50, Duration::from_secs(3_600)))
                .expect("valid config"),
        );
        let granted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let granted = Arc::clone(&granted);
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        if limiter.try_acquire() {
                            granted.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread panicked");
        }

        assert_eq!(granted.load(Ordering::SeqCst), 50);
    }

    #[tokio::test]
    async fn test_wait_acquires_after_refill() {
        let limiter =
            RateLimiter::new(RateLimiterConfig::new(1, Duration::from_millis(50))).expect("valid config");
        assert!(limiter.try_acquire());

        let started = Instant::now();
        limiter.wait().await;
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    /// Validates `RateLimiter::wait_with_cancel` behavior for the cancelled
    /// wait scenario.
    ///
    /// Assertions:
    /// - Confirms a cancelled token returns a `Cancelled` error promptly.
    #[tokio::test]
    async fn test_wait_with_cancel_returns_cancelled() {
        let limiter =
            RateLimiter::new(RateLimiterConfig::new(1, Duration::from_secs(3_600))).expect("valid config");
        assert!(limiter.try_acquire());

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(Duration::from_secs(5), limiter.wait_with_cancel(&cancel))
            .await
            .expect("wait should observe cancellation");
        assert!(matches!(result, Err(ref e) if e.kind() == ErrorKind::Cancelled));
    }
}
