//! TTL-aware LRU cache
//!
//! One mutex guards the store, so recency and expiry always change together.
//! Expired entries are dropped lazily when a lookup touches them; capacity
//! overflow evicts the least recently used entry.

use std::borrow::Borrow;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use super::config::{CacheConfig, DEFAULT_MAX_ENTRIES};
use super::stats::{CacheStats, MetricsCollector};
use crate::resilience::{Clock, SystemClock};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    /// `None` when `now + ttl` overflows, i.e. never expires in practice
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// Thread-safe cache with per-entry TTL and LRU eviction
///
/// # Type Parameters
/// - `K`: Key type
/// - `V`: Value type, cloned out on every hit
/// - `C`: Clock type (defaults to `SystemClock`)
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use kra_connect_common::cache::{Cache, CacheConfig};
///
/// let cache: Cache<String, i32> = Cache::new(CacheConfig::lru(100));
/// cache.set("key".to_string(), 42, Duration::from_secs(60));
/// assert_eq!(cache.get("key"), Some(42));
/// ```
pub struct Cache<K, V, C = SystemClock>
where
    K: Hash + Eq,
    C: Clock,
{
    store: Mutex<LruCache<K, CacheEntry<V>>>,
    capacity: NonZeroUsize,
    config: CacheConfig,
    metrics: MetricsCollector,
    clock: C,
}

impl<K, V> Cache<K, V, SystemClock>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: Clone,
{
    /// Cache driven by the system clock
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<K, V, C> Cache<K, V, C>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: Clone,
    C: Clock,
{
    /// Cache driven by a custom clock
    pub fn with_clock(config: CacheConfig, clock: C) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries)
            .or(NonZeroUsize::new(DEFAULT_MAX_ENTRIES))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            store: Mutex::new(LruCache::new(capacity)),
            capacity,
            metrics: MetricsCollector::new(config.track_metrics),
            config,
            clock,
        }
    }

    /// Configuration this cache was built with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Whether the cache stores anything at all
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Look up `key`, marking it most recently used
    ///
    /// An expired entry counts as a miss and is removed.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        if !self.config.enabled {
            return None;
        }

        let now = self.clock.now();
        let mut store = self.store.lock();

        let expired = match store.peek(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                self.metrics.record_miss();
                debug!(event = "cache.miss", ?key, "cache miss");
                return None;
            }
        };

        if expired {
            store.pop(key);
            self.metrics.record_expiration();
            self.metrics.record_miss();
            debug!(event = "cache.expired", ?key, "cache entry expired");
            return None;
        }

        let value = store.get(key).map(|entry| entry.value.clone());
        self.metrics.record_hit();
        debug!(event = "cache.hit", ?key, "cache hit");
        value
    }

    /// Store `value` under `key` for `ttl`
    ///
    /// A zero TTL stores an entry that is already expired. When the cache is
    /// full the least recently used entry is evicted; the entry just written
    /// is never the victim.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        if !self.config.enabled {
            return;
        }

        let entry = CacheEntry { value, expires_at: self.clock.now().checked_add(ttl) };
        let mut store = self.store.lock();
        let replacing = store.contains(&key);

        debug!(event = "cache.set", ?key, ttl_ms = ttl.as_millis() as u64, "cache set");
        if let Some((evicted, _)) = store.push(key, entry) {
            if !replacing {
                self.metrics.record_eviction();
                debug!(event = "cache.evict", key = ?evicted, "evicted least recently used entry");
            }
        }
        self.metrics.record_insert();
    }

    /// Remove `key`, returning whether it was present
    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        if !self.config.enabled {
            return false;
        }
        let removed = self.store.lock().pop(key).is_some();
        if removed {
            debug!(event = "cache.delete", ?key, "cache entry deleted");
        }
        removed
    }

    /// Drop every entry by swapping in a fresh store
    pub fn clear(&self) {
        if !self.config.enabled {
            return;
        }
        let previous = std::mem::replace(&mut *self.store.lock(), LruCache::new(self.capacity));
        debug!(event = "cache.clear", dropped = previous.len(), "cache cleared");
    }

    /// Return the cached value or compute, store and return a new one
    ///
    /// `compute` runs without the lock held, so two concurrent callers may
    /// both compute; the later store wins. Errors are passed through and
    /// nothing is stored.
    pub fn get_or_set<F, E>(&self, key: K, ttl: Duration, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = compute()?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }

    /// Async variant of [`Cache::get_or_set`] for network-backed values
    pub async fn get_or_set_async<F, Fut, E>(&self, key: K, ttl: Duration, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = compute().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }

    /// Number of unexpired entries, `0` when disabled
    pub fn size(&self) -> usize {
        if !self.config.enabled {
            return 0;
        }
        let now = self.clock.now();
        self.store.lock().iter().filter(|(_, entry)| !entry.is_expired(now)).count()
    }

    /// Counter snapshot
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot(self.size(), self.capacity.get())
    }
}

impl<K, V, C> fmt::Debug for Cache<K, V, C>
where
    K: Hash + Eq,
    C: Clock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("config", &self.config)
            .field("len", &self.store.lock().len())
            .finish_non_exhaustive()
    }
}
