//! Input and configuration validators
//!
//! Identifier validators trim and uppercase their input before matching and
//! return the normalized form, so callers cache and send one canonical
//! spelling. Every failure is a [`KraError::Validation`] naming the field.
//!
//! | Input | Format |
//! |-------|--------|
//! | PIN | `P` + 9 digits + letter, e.g. `P051234567A` |
//! | TCC | `TCC` + digits, e.g. `TCC123456` |
//! | E-slip | digits only |
//! | Period | `YYYYMM`, year 1900-2100, month 01-12 |
//! | Obligation ID | uppercase letters, digits, `-`, `_` |

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{KraError, KraResult};

static PIN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^P\d{9}[A-Z]$").expect("PIN_REGEX pattern is valid"));
static TCC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^TCC\d+$").expect("TCC_REGEX pattern is valid"));
static ESLIP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+$").expect("ESLIP_REGEX pattern is valid"));
static PERIOD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{6}$").expect("PERIOD_REGEX pattern is valid"));
static OBLIGATION_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9_-]+$").expect("OBLIGATION_ID_REGEX pattern is valid"));

/// Minimum accepted API key length after trimming
pub const MIN_API_KEY_LEN: usize = 16;
/// Upper bound on the request timeout
pub const MAX_TIMEOUT: Duration = Duration::from_secs(10 * 60);
/// Upper bound on the retry count
pub const MAX_RETRIES: u32 = 10;
/// Upper bound on the retry delay cap
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(10 * 60);
/// Upper bound on any cache TTL
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Validate a KRA PIN and return it trimmed and uppercased
pub fn validate_pin(pin: &str) -> KraResult<String> {
    if pin.is_empty() {
        return Err(KraError::validation("pin", "PIN number is required"));
    }
    let normalized = pin.trim().to_uppercase();
    if !PIN_REGEX.is_match(&normalized) {
        return Err(KraError::invalid_pin_format(pin));
    }
    Ok(normalized)
}

/// Validate a tax compliance certificate number and return it normalized
pub fn validate_tcc(tcc: &str) -> KraResult<String> {
    if tcc.is_empty() {
        return Err(KraError::validation("tcc", "TCC number is required"));
    }
    let normalized = tcc.trim().to_uppercase();
    if !TCC_REGEX.is_match(&normalized) {
        return Err(KraError::invalid_tcc_format(tcc));
    }
    Ok(normalized)
}

/// Validate an e-slip number and return it trimmed
pub fn validate_eslip(eslip: &str) -> KraResult<String> {
    if eslip.is_empty() {
        return Err(KraError::validation("eslip", "E-slip number is required"));
    }
    let trimmed = eslip.trim();
    if !ESLIP_REGEX.is_match(trimmed) {
        return Err(KraError::validation(
            "eslip",
            format!("Invalid e-slip format: '{eslip}'. Expected digits only"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate a `YYYYMM` tax period
pub fn validate_period(period: &str) -> KraResult<()> {
    if period.is_empty() {
        return Err(KraError::validation("period", "Period is required"));
    }
    let trimmed = period.trim();
    if !PERIOD_REGEX.is_match(trimmed) {
        return Err(KraError::validation(
            "period",
            format!("Invalid period format: '{period}'. Expected YYYYMM (e.g., 202401)"),
        ));
    }

    // six ASCII digits, so byte slicing is safe
    let (year, month) = trimmed.split_at(4);
    if !("1900"..="2100").contains(&year) {
        return Err(KraError::validation(
            "period",
            format!("Invalid year in period: {year}. Year must be between 1900 and 2100"),
        ));
    }
    if !("01"..="12").contains(&month) {
        return Err(KraError::validation(
            "period",
            format!("Invalid month in period: {month}. Month must be between 01 and 12"),
        ));
    }
    Ok(())
}

/// Validate an obligation identifier and return it normalized
pub fn validate_obligation_id(obligation_id: &str) -> KraResult<String> {
    if obligation_id.is_empty() {
        return Err(KraError::validation("obligation_id", "Obligation ID is required"));
    }
    let normalized = obligation_id.trim().to_uppercase();
    if !OBLIGATION_ID_REGEX.is_match(&normalized) {
        return Err(KraError::validation(
            "obligation_id",
            format!(
                "Invalid obligation ID format: '{obligation_id}'. Expected alphanumeric with \
                 optional hyphens/underscores"
            ),
        ));
    }
    Ok(normalized)
}

/// Validate an API key's presence and length
pub fn validate_api_key(api_key: &str) -> KraResult<()> {
    let trimmed = api_key.trim();
    if trimmed.is_empty() {
        return Err(KraError::validation("api_key", "API key is required"));
    }
    if trimmed.chars().count() < MIN_API_KEY_LEN {
        return Err(KraError::validation(
            "api_key",
            "API key must be at least 16 characters long",
        ));
    }
    Ok(())
}

/// Validate the per-request timeout
pub fn validate_timeout(timeout: Duration) -> KraResult<()> {
    if timeout.is_zero() {
        return Err(KraError::validation("timeout", "Timeout must be positive"));
    }
    if timeout > MAX_TIMEOUT {
        return Err(KraError::validation("timeout", "Timeout cannot exceed 10 minutes"));
    }
    Ok(())
}

/// Validate retry bounds
pub fn validate_retry(max_retries: u32, initial_delay: Duration, max_delay: Duration) -> KraResult<()> {
    if max_retries > MAX_RETRIES {
        return Err(KraError::validation("max_retries", "Max retries cannot exceed 10"));
    }
    if initial_delay.is_zero() {
        return Err(KraError::validation("initial_delay", "Initial delay must be positive"));
    }
    if max_delay < initial_delay {
        return Err(KraError::validation(
            "max_delay",
            "Max delay cannot be less than initial delay",
        ));
    }
    if max_delay > MAX_RETRY_DELAY {
        return Err(KraError::validation("max_delay", "Max delay cannot exceed 10 minutes"));
    }
    Ok(())
}

/// Validate token-bucket parameters
pub fn validate_rate_limit(max_requests: u32, window: Duration) -> KraResult<()> {
    if max_requests == 0 {
        return Err(KraError::validation("max_requests", "Max requests must be positive"));
    }
    if window.is_zero() {
        return Err(KraError::validation("window", "Window duration must be positive"));
    }
    Ok(())
}

/// Validate a cache TTL
pub fn validate_cache_ttl(ttl: Duration) -> KraResult<()> {
    if ttl > MAX_CACHE_TTL {
        return Err(KraError::validation("cache_ttl", "Cache TTL cannot exceed 24 hours"));
    }
    Ok(())
}

/// Validate cache capacity
pub fn validate_cache_capacity(max_entries: usize) -> KraResult<()> {
    if max_entries == 0 {
        return Err(KraError::validation("max_entries", "Cache max entries must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn field_of(err: &KraError) -> &str {
        match err {
            KraError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    /// Validates `validate_pin` behavior for the normalization scenario.
    ///
    /// Assertions:
    /// - Confirms surrounding whitespace is trimmed and letters uppercased.
    /// - Ensures malformed PINs fail with the `pin` field.
    #[test]
    fn test_validate_pin() {
        assert_eq!(validate_pin("  p051234567a ").ok().as_deref(), Some("P051234567A"));

        for bad in ["A051234567B", "P12345678A", "P0512345678", "P051234567AB"] {
            let err = validate_pin(bad).expect_err(bad);
            assert_eq!(field_of(&err), "pin");
            assert!(err.to_string().contains(bad));
        }
        assert_eq!(validate_pin("").expect_err("empty").to_string(), "PIN number is required");
    }

    #[test]
    fn test_validate_tcc() {
        assert_eq!(validate_tcc(" tcc123456").ok().as_deref(), Some("TCC123456"));
        assert!(validate_tcc("TCC").is_err());
        assert!(validate_tcc("123456").is_err());
        assert_eq!(field_of(&validate_tcc("X").expect_err("bad tcc")), "tcc");
    }

    #[test]
    fn test_validate_eslip() {
        assert_eq!(validate_eslip(" 1234567890 ").ok().as_deref(), Some("1234567890"));
        let err = validate_eslip("12AB").expect_err("letters");
        assert_eq!(err.to_string(), "Invalid e-slip format: '12AB'. Expected digits only");
    }

    /// Validates `validate_period` behavior for the range checks scenario.
    ///
    /// Assertions:
    /// - Confirms a well-formed period passes.
    /// - Ensures out-of-range years and months are rejected with distinct
    ///   messages.
    #[test]
    fn test_validate_period() {
        assert!(validate_period("202401").is_ok());
        assert!(validate_period("190001").is_ok());
        assert!(validate_period("2024-1").is_err());

        let year = validate_period("189912").expect_err("year");
        assert!(year.to_string().starts_with("Invalid year in period: 1899"));

        let month = validate_period("202413").expect_err("month");
        assert!(month.to_string().starts_with("Invalid month in period: 13"));
        assert!(validate_period("202400").is_err());
    }

    #[test]
    fn test_validate_obligation_id() {
        assert_eq!(validate_obligation_id("vat_01-a").ok().as_deref(), Some("VAT_01-A"));
        assert!(validate_obligation_id("VAT 01").is_err());
    }

    #[test]
    fn test_validate_api_key() {
        assert!(validate_api_key("0123456789abcdef").is_ok());
        assert!(validate_api_key("   short key    ").is_err());
        assert_eq!(validate_api_key("  ").expect_err("blank").to_string(), "API key is required");
    }

    /// Validates the configuration validators for the boundary scenario.
    ///
    /// Assertions:
    /// - Ensures zero and over-limit values fail as `Validation`.
    /// - Ensures boundary values pass.
    #[test]
    fn test_config_bounds() {
        assert!(validate_timeout(Duration::ZERO).is_err());
        assert!(validate_timeout(MAX_TIMEOUT).is_ok());
        assert!(validate_timeout(MAX_TIMEOUT + Duration::from_millis(1)).is_err());

        let second = Duration::from_secs(1);
        assert!(validate_retry(10, second, second).is_ok());
        assert!(validate_retry(11, second, second).is_err());
        assert!(validate_retry(3, Duration::ZERO, second).is_err());
        let inverted = validate_retry(3, second * 2, second).expect_err("inverted delays");
        assert_eq!(inverted.kind(), ErrorKind::Validation);
        assert_eq!(field_of(&inverted), "max_delay");
        assert!(validate_retry(3, second, MAX_RETRY_DELAY).is_ok());
        let huge = validate_retry(3, second, Duration::MAX).expect_err("unbounded cap");
        assert_eq!(field_of(&huge), "max_delay");
        assert_eq!(huge.to_string(), "Max delay cannot exceed 10 minutes");

        assert!(validate_rate_limit(0, second).is_err());
        assert!(validate_rate_limit(1, Duration::ZERO).is_err());
        assert!(validate_cache_ttl(MAX_CACHE_TTL).is_ok());
        assert!(validate_cache_ttl(MAX_CACHE_TTL + second).is_err());
        assert!(validate_cache_ttl(Duration::ZERO).is_ok());
        assert!(validate_cache_capacity(0).is_err());
    }
}
