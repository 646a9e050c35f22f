//! Domain constants
//!
//! Endpoints, cache-key prefixes and configuration defaults for the
//! GavaConnect API.

use std::time::Duration;

// API endpoints (relative to the base URL)
pub const ENDPOINT_PIN_VERIFICATION: &str = "/checker/v1/pinbypin";
pub const ENDPOINT_TCC_VERIFICATION: &str = "/v1/kra-tcc/validate";
pub const ENDPOINT_ESLIP_VALIDATION: &str = "/payment/checker/v1/eslip";
pub const ENDPOINT_NIL_RETURN: &str = "/dtd/return/v1/nil";
pub const ENDPOINT_TAXPAYER_OBLIGATIONS: &str = "/dtd/checker/v1/obligation";

// Request identity
pub const USER_AGENT: &str = concat!("KRA-Connect-Rust-SDK/", env!("CARGO_PKG_VERSION"));
pub const CONTENT_TYPE_JSON: &str = "application/json";

// Cache-key prefixes, one per cached operation
pub const CACHE_PREFIX_PIN: &str = "pin_verification";
pub const CACHE_PREFIX_TCC: &str = "tcc_verification";
pub const CACHE_PREFIX_ESLIP: &str = "eslip_validation";
pub const CACHE_PREFIX_TAXPAYER: &str = "taxpayer_details";

// Client defaults
pub const DEFAULT_BASE_URL: &str = "https://api.kra.go.ke/gavaconnect/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);

// Rate limiting defaults
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 100;
pub const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
/// Retry hint used when a 429 response carries no `Retry-After`
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

// Cache defaults
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1024;
pub const DEFAULT_PIN_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_TCC_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_ESLIP_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_TAXPAYER_TTL: Duration = Duration::from_secs(2 * 60 * 60);
pub const DEFAULT_NIL_RETURN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

// Date format used by every date string the API returns
pub const API_DATE_FORMAT: &str = "%Y-%m-%d";

// NIL return bounds
pub const MIN_FILING_YEAR: u32 = 2000;
