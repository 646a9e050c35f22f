//! Building blocks shared across the KRA Connect crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error taxonomy, input validators, serde helpers
//! - `runtime`: async infrastructure (clock, rate limiter, backoff, cache)
//! - `observability`: tracing events (pulled in by `runtime`)
//! - `test-utils`: `tokio-test` for driving async helpers from sync tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod utils;
#[cfg(feature = "foundation")]
pub mod validation;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod cache;
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use cache::{generate_cache_key, Cache, CacheConfig, CacheStats};
#[cfg(feature = "foundation")]
pub use error::{ErrorClassification, ErrorKind, ErrorSeverity, KraError, KraResult};
#[cfg(feature = "runtime")]
pub use resilience::{
    sleep_or_cancel, BackoffPolicy, Clock, MockClock, RateLimiter, RateLimiterConfig, SystemClock,
};
#[cfg(feature = "foundation")]
pub use utils::serde::duration_millis;
