//! Cache configuration

/// Capacity used when a configuration asks for zero entries
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// Configuration for [`Cache`](super::Cache)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// When `false` every cache operation is a no-op
    pub enabled: bool,

    /// Maximum number of live entries before LRU eviction
    pub max_entries: usize,

    /// Whether to collect hit/miss/eviction counters
    pub track_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true, max_entries: DEFAULT_MAX_ENTRIES, track_metrics: true }
    }
}

impl CacheConfig {
    /// Enabled cache holding at most `max_entries`
    ///
    /// # Example
    /// ```
    /// use kra_connect_common::cache::CacheConfig;
    ///
    /// let config = CacheConfig::lru(500);
    /// assert!(config.enabled);
    /// ```
    pub fn lru(max_entries: usize) -> Self {
        Self { max_entries, ..Self::default() }
    }

    /// Cache that stores nothing
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::default() }
    }

    /// Toggle counter collection
    #[must_use]
    pub fn with_metrics(mut self, track_metrics: bool) -> Self {
        self.track_metrics = track_metrics;
        self
    }
}
