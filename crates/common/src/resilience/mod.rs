//! Resilience primitives for the request pipeline
//!
//! - **Clock**: injectable monotonic time source ([`SystemClock`],
//!   [`MockClock`])
//! - **Rate limiter**: lazily refilled token bucket guarding outbound calls
//! - **Backoff**: capped exponential delays with jitter, plus a cancellable
//!   sleep used as the retry suspension point
//!
//! The rate limiter is an owned value. Callers share it through `Arc`
//! rather than a process-wide instance.

pub mod backoff;
pub mod clock;
pub mod rate_limiter;

pub use backoff::{sleep_or_cancel, BackoffPolicy, JITTER_FACTOR, MIN_DELAY};
pub use clock::{Clock, MockClock, SystemClock};
pub use rate_limiter::{RateLimiter, RateLimiterConfig};
