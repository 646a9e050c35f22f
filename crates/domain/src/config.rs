//! Client configuration
//!
//! [`ClientConfig`] is a single, fully populated struct. It is validated once
//! when a client is built and never mutated afterwards. Every duration is
//! (de)serialized as milliseconds so TOML and JSON files stay unit-free.

use std::fmt;
use std::time::Duration;

use kra_connect_common::duration_millis;
use kra_connect_common::error::{KraError, KraResult};
use kra_connect_common::validation::{
    validate_api_key, validate_cache_capacity, validate_cache_ttl, validate_rate_limit,
    validate_retry, validate_timeout,
};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_ESLIP_TTL, DEFAULT_INITIAL_DELAY,
    DEFAULT_MAX_DELAY, DEFAULT_MAX_RETRIES, DEFAULT_NIL_RETURN_TTL, DEFAULT_PIN_TTL,
    DEFAULT_RATE_LIMIT_MAX_REQUESTS, DEFAULT_RATE_LIMIT_WINDOW, DEFAULT_TAXPAYER_TTL,
    DEFAULT_TCC_TTL, DEFAULT_TIMEOUT,
};

/* -------------------------------------------------------------------------- */
/* Client Configuration */
/* -------------------------------------------------------------------------- */

/// Complete client configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API key sent as a bearer token
    pub api_key: String,

    /// Base URL every endpoint path is appended to
    pub base_url: String,

    /// Per-request timeout
    #[serde(with = "duration_millis")]
    pub timeout: Duration,

    /// Retry bounds
    pub retry: RetrySettings,

    /// Outbound rate limiting
    pub rate_limit: RateLimitSettings,

    /// Response caching
    pub cache: CacheSettings,

    /// Log request and response bodies at debug level
    pub debug: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetrySettings::default(),
            rate_limit: RateLimitSettings::default(),
            cache: CacheSettings::default(),
            debug: false,
        }
    }
}

// The API key never reaches logs
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("rate_limit", &self.rate_limit)
            .field("cache", &self.cache)
            .field("debug", &self.debug)
            .finish()
    }
}

impl ClientConfig {
    /// Default configuration for `api_key`
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), ..Self::default() }
    }

    /// Override the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the retry bounds
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        self.retry = RetrySettings { max_retries, initial_delay, max_delay };
        self
    }

    /// Limit outbound calls to `max_requests` per `window`
    #[must_use]
    pub fn with_rate_limit(mut self, max_requests: u32, window: Duration) -> Self {
        self.rate_limit = RateLimitSettings { enabled: true, max_requests, window };
        self
    }

    /// Turn rate limiting off
    #[must_use]
    pub fn without_rate_limit(mut self) -> Self {
        self.rate_limit.enabled = false;
        self
    }

    /// Bound the cache at `max_entries`
    #[must_use]
    pub fn with_cache_capacity(mut self, max_entries: usize) -> Self {
        self.cache.enabled = true;
        self.cache.max_entries = max_entries;
        self
    }

    /// Override the per-operation cache TTLs
    #[must_use]
    pub fn with_cache_ttls(mut self, ttl: CacheTtls) -> Self {
        self.cache.ttl = ttl;
        self
    }

    /// Turn caching off
    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.cache.enabled = false;
        self
    }

    /// Toggle request/response body logging
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Reject any configuration the client cannot run with
    ///
    /// Checks run in field order and the first failure is returned as a
    /// `Validation` error.
    pub fn validate(&self) -> KraResult<()> {
        validate_api_key(&self.api_key)?;
        if self.base_url.trim().is_empty() {
            return Err(KraError::validation("base_url", "Base URL is required"));
        }
        validate_timeout(self.timeout)?;
        validate_retry(self.retry.max_retries, self.retry.initial_delay, self.retry.max_delay)?;

        if self.rate_limit.enabled {
            validate_rate_limit(self.rate_limit.max_requests, self.rate_limit.window)?;
        }

        if self.cache.enabled {
            validate_cache_capacity(self.cache.max_entries)?;
            for ttl in self.cache.ttl.all() {
                validate_cache_ttl(ttl)?;
            }
        }

        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }
}

/* -------------------------------------------------------------------------- */
/* Retry */
/* -------------------------------------------------------------------------- */

/// Retry bounds: `max_retries + 1` sends at most
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    #[serde(with = "duration_millis")]
    pub initial_delay: Duration,
    #[serde(with = "duration_millis")]
    pub max_delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Rate Limiting */
/* -------------------------------------------------------------------------- */

/// Token-bucket parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub max_requests: u32,
    #[serde(with = "duration_millis")]
    pub window: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            window: DEFAULT_RATE_LIMIT_WINDOW,
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Caching */
/* -------------------------------------------------------------------------- */

/// Cache capacity and per-operation TTLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub max_entries: usize,
    pub ttl: CacheTtls,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { enabled: true, max_entries: DEFAULT_CACHE_MAX_ENTRIES, ttl: CacheTtls::default() }
    }
}

/// Time-to-live for each cached operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheTtls {
    #[serde(with = "duration_millis")]
    pub pin_verification: Duration,
    #[serde(with = "duration_millis")]
    pub tcc_verification: Duration,
    #[serde(with = "duration_millis")]
    pub eslip_validation: Duration,
    #[serde(with = "duration_millis")]
    pub taxpayer_details: Duration,
    /// Filings are never served from cache; kept for configuration parity
    #[serde(with = "duration_millis")]
    pub nil_return: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            pin_verification: DEFAULT_PIN_TTL,
            tcc_verification: DEFAULT_TCC_TTL,
            eslip_validation: DEFAULT_ESLIP_TTL,
            taxpayer_details: DEFAULT_TAXPAYER_TTL,
            nil_return: DEFAULT_NIL_RETURN_TTL,
        }
    }
}

impl CacheTtls {
    /// Every configured TTL
    pub fn all(&self) -> [Duration; 5] {
        [
            self.pin_verification,
            self.tcc_verification,
            self.eslip_validation,
            self.taxpayer_details,
            self.nil_return,
        ]
    }
}
