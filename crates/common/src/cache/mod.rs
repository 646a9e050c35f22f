//! In-memory TTL + LRU cache for API responses
//!
//! Every entry carries its own time-to-live, so one cache can hold results of
//! operations with different freshness requirements. Capacity is bounded and
//! the least recently used entry is evicted first; reads and writes both
//! count as use.
//!
//! # Features
//!
//! - **Thread-safe**: one `parking_lot::Mutex` around the store
//! - **Lazy expiry**: expired entries are removed when a lookup touches them;
//!   there is no background sweeper
//! - **Compute on miss**: [`Cache::get_or_set`] and
//!   [`Cache::get_or_set_async`] run the computation outside the lock
//! - **Metrics**: optional hit/miss/eviction/expiration counters
//! - **Testable**: clock abstraction for deterministic expiry tests
//! - **Disable switch**: a disabled cache turns every operation into a no-op
//!
//! # Examples
//!
//! ## Per-entry TTL
//! ```
//! use std::time::Duration;
//!
//! use kra_connect_common::cache::{generate_cache_key, Cache, CacheConfig};
//!
//! let cache: Cache<String, String> = Cache::new(CacheConfig::lru(1000));
//! let key = generate_cache_key("pin_verification", &["P051234567A"]);
//!
//! cache.set(key.clone(), "verified".to_string(), Duration::from_secs(3600));
//! assert_eq!(cache.get(&key).as_deref(), Some("verified"));
//! ```
//!
//! ## Get or Set with Lazy Computation
//! ```
//! use std::time::Duration;
//!
//! use kra_connect_common::cache::{Cache, CacheConfig};
//!
//! let cache: Cache<String, i32> = Cache::new(CacheConfig::lru(100));
//!
//! let value = cache.get_or_set("key".to_string(), Duration::from_secs(60), || {
//!     Ok::<_, std::io::Error>(expensive_computation())
//! });
//! assert_eq!(value.ok(), Some(42));
//! # fn expensive_computation() -> i32 { 42 }
//! ```
//!
//! ## Cache Statistics
//! ```
//! use std::time::Duration;
//!
//! use kra_connect_common::cache::{Cache, CacheConfig};
//!
//! let cache: Cache<String, i32> = Cache::new(CacheConfig::lru(100));
//! cache.set("key1".to_string(), 1, Duration::from_secs(60));
//! let _ = cache.get("key1");
//! let _ = cache.get("missing");
//!
//! let stats = cache.stats();
//! assert_eq!(stats.hits, 1);
//! assert_eq!(stats.misses, 1);
//! ```

mod config;
mod core;
mod stats;

// Re-export public API
pub use self::core::Cache;

pub use config::{CacheConfig, DEFAULT_MAX_ENTRIES};
pub use stats::CacheStats;

/// Build a cache key from an operation prefix and its identifying parts
///
/// # Example
/// ```
/// use kra_connect_common::cache::generate_cache_key;
///
/// assert_eq!(
///     generate_cache_key("tcc_verification", &["P051234567A", "TCC123456"]),
///     "tcc_verification:P051234567A:TCC123456"
/// );
/// ```
pub fn generate_cache_key(operation: &str, parts: &[&str]) -> String {
    let mut key = String::from(operation);
    for part in parts {
        key.push(':');
        key.push_str(part);
    }
    key
}
