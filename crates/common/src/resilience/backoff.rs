//! Exponential backoff with multiplicative jitter
//!
//! Delay for retry `n` (zero-based) is `initial_delay * 2^n`, capped at
//! `max_delay`, then scaled by a random factor in `[0.75, 1.25]` and floored
//! at 100 ms.

use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::error::{KraError, KraResult};

/// Fraction of the base delay that jitter may add or remove
pub const JITTER_FACTOR: f64 = 0.25;

/// Lower bound on any jittered delay
pub const MIN_DELAY: Duration = Duration::from_millis(100);

/// Retry delay schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound on the un-jittered delay
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self { initial_delay: Duration::from_secs(1), max_delay: Duration::from_secs(32) }
    }
}

impl BackoffPolicy {
    /// Build a policy; callers validate `initial_delay <= max_delay`
    pub fn new(initial_delay: Duration, max_delay: Duration) -> Self {
        Self { initial_delay, max_delay }
    }

    /// Un-jittered delay before retry `attempt` (zero-based)
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.initial_delay.checked_mul(factor).map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Jittered delay before retry `attempt` using the thread-local RNG
    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_with_rng(attempt, &mut rand::thread_rng())
    }

    /// Jittered delay before retry `attempt` using `rng`
    pub fn delay_with_rng<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let base = self.base_delay(attempt);
        let factor = rng.gen_range((1.0 - JITTER_FACTOR)..=(1.0 + JITTER_FACTOR));
        // mul_f64 panics past Duration::MAX
        Duration::try_from_secs_f64(base.as_secs_f64() * factor).unwrap_or(Duration::MAX).max(MIN_DELAY)
    }
}

/// Sleep for `duration` unless `cancel` fires first
///
/// Returns a `Cancelled` error as soon as the token is triggered, including
/// when it was already triggered before the call.
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> KraResult<()> {
    if cancel.is_cancelled() {
        return Err(KraError::cancelled("cancelled before sleep"));
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(KraError::cancelled("cancelled during sleep")),
        () = tokio::time::sleep(duration) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::error::ErrorKind;

    /// Validates `BackoffPolicy::base_delay` behavior for the capped
    /// doubling scenario.
    ///
    /// Assertions:
    /// - Confirms delays double from the initial delay.
    /// - Ensures the sequence is non-decreasing and never exceeds the cap.
    #[test]
    fn test_base_delay_doubles_and_caps() {
        let policy = BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(10));
        assert_eq!(policy.base_delay(0), Duration::from_secs(1));
        assert_eq!(policy.base_delay(1), Duration::from_secs(2));
        assert_eq!(policy.base_delay(2), Duration::from_secs(4));
        assert_eq!(policy.base_delay(4), Duration::from_secs(10));

        let delays: Vec<_> = (0..64).map(|attempt| policy.base_delay(attempt)).collect();
        assert!(delays.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(delays.iter().all(|delay| *delay <= policy.max_delay));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = BackoffPolicy::new(Duration::from_secs(2), Duration::from_secs(32));
        let mut rng = StdRng::seed_from_u64(7);
        for attempt in 0..6 {
            let base = policy.base_delay(attempt);
            for _ in 0..50 {
                let delay = policy.delay_with_rng(attempt, &mut rng);
                assert!(delay >= base.mul_f64(0.75), "{delay:?} below jitter range of {base:?}");
                assert!(delay <= base.mul_f64(1.25), "{delay:?} above jitter range of {base:?}");
            }
        }
    }

    /// Validates `BackoffPolicy::delay_with_rng` behavior for the
    /// unbounded cap scenario.
    ///
    /// Assertions:
    /// - Confirms a cap of `Duration::MAX` saturates instead of panicking.
    #[test]
    fn test_jitter_saturates_at_duration_max() {
        let policy = BackoffPolicy::new(Duration::from_secs(1), Duration::MAX);
        let mut rng = StdRng::seed_from_u64(11);
        for attempt in [0, 10, 40, 63, u32::MAX] {
            let delay = policy.delay_with_rng(attempt, &mut rng);
            assert!(delay >= MIN_DELAY);
        }

        let capped = BackoffPolicy::new(Duration::MAX, Duration::MAX);
        assert_eq!(capped.base_delay(3), Duration::MAX);
        assert!(capped.delay_with_rng(3, &mut rng) >= Duration::from_secs(u64::MAX / 2));
    }

    #[test]
    fn test_delay_floor() {
        let policy = BackoffPolicy::new(Duration::from_millis(10), Duration::from_millis(20));
        assert!((0..20).all(|attempt| policy.delay(attempt) >= MIN_DELAY));
    }

    #[tokio::test]
    async fn test_sleep_or_cancel_completes() {
        let cancel = CancellationToken::new();
        assert!(sleep_or_cancel(Duration::from_millis(5), &cancel).await.is_ok());
    }

    /// Validates `sleep_or_cancel` behavior for the pre-cancelled token
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms a long sleep returns a `Cancelled` error immediately.
    #[tokio::test]
    async fn test_sleep_or_cancel_observes_token() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = tokio::time::timeout(
            Duration::from_secs(1),
            sleep_or_cancel(Duration::from_secs(3_600), &cancel),
        )
        .await
        .expect("cancelled sleep should return promptly");

        assert!(matches!(result, Err(ref e) if e.kind() == ErrorKind::Cancelled));
    }
}
