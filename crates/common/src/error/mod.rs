//! Error taxonomy shared by every KRA Connect component
//!
//! Every failure that leaves the request pipeline is classified into exactly
//! one [`KraError`] variant. Callers branch on [`KraError::kind`] instead of
//! matching on message text.
//!
//! # Classification
//!
//! HTTP status codes are mapped to an [`ErrorKind`] by a single total table
//! ([`ErrorKind::for_status`]). Retry eligibility is a property of the kind
//! alone, so the executor never re-inspects status codes when deciding
//! whether to try again:
//!
//! | Status | Kind | Retryable |
//! |--------|------|-----------|
//! | 401, 403 | `Authentication` | no |
//! | 408 | `Timeout` | yes |
//! | 429 | `RateLimit` | yes |
//! | other 4xx | `ClientFailure` | no |
//! | anything else | `ServerFailure` | yes |
//!
//! Statuses outside the 4xx range include 5xx responses and successful
//! responses whose body could not be parsed or reported an application-level
//! failure.
//!
//! ## ErrorClassification Trait
//!
//! [`KraError`] implements [`ErrorClassification`] so monitoring code can ask
//! for `is_retryable()`, `severity()`, `is_critical()` and `retry_after()`
//! without knowing the concrete variant.
//!
//! ## Examples
//!
//! ```rust
//! use kra_connect_common::error::{ErrorClassification, ErrorKind, KraError};
//!
//! let err = KraError::api(503, "/checker/v1/pinbypin", "Service unavailable", None);
//! assert_eq!(err.kind(), ErrorKind::ServerFailure);
//! assert!(err.is_retryable());
//! assert!(err.is_server_error());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Standard result type using [`KraError`]
pub type KraResult<T> = Result<T, KraError>;

/// Shared, cloneable underlying cause of a transport failure
pub type BoxedCause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Stable classification of a [`KraError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing input, rejected before any request is sent
    Validation,
    /// Credentials rejected by the API (401/403)
    Authentication,
    /// Request rejected because a rate limit was exceeded (429)
    RateLimit,
    /// Request timed out locally or the server answered 408
    Timeout,
    /// Transport-level failure (DNS, connect, reset)
    Network,
    /// 4xx response other than 401/403/408/429
    ClientFailure,
    /// 5xx response, unparseable body, or application-level failure
    ServerFailure,
    /// Cache operation failed
    Cache,
    /// Caller cancelled the operation
    Cancelled,
    /// Operation attempted on a closed client
    ClientClosed,
}

impl ErrorKind {
    /// Total mapping from an HTTP status code to an error kind
    pub const fn for_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            408 => Self::Timeout,
            429 => Self::RateLimit,
            400..=499 => Self::ClientFailure,
            _ => Self::ServerFailure,
        }
    }

    /// Whether an operation failing with this kind may be attempted again
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimit | Self::Timeout | Self::Network | Self::ServerFailure)
    }

    /// Short machine-readable name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::RateLimit => "rate_limit",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::ClientFailure => "client_failure",
            Self::ServerFailure => "server_failure",
            Self::Cache => "cache",
            Self::Cancelled => "cancelled",
            Self::ClientClosed => "client_closed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by the KRA Connect client
#[derive(Debug, Clone, Error)]
pub enum KraError {
    /// Input failed validation
    #[error("{message}")]
    Validation { field: String, message: String },

    /// Credentials were rejected
    #[error("{message}")]
    Authentication { message: String, status_code: u16 },

    /// Rate limit exceeded
    #[error("{}", rate_limit_message(.retry_after, .limit, .window))]
    RateLimit { retry_after: Duration, limit: Option<u32>, window: Option<Duration> },

    /// Request timed out
    #[error("Request to '{endpoint}' timed out after {timeout:?} (attempt {attempt})")]
    Timeout { endpoint: String, timeout: Duration, attempt: u32 },

    /// API answered with a failure status or payload
    #[error("{message}")]
    Api { status_code: u16, endpoint: String, message: String, response_body: Option<String> },

    /// Transport-level failure
    #[error("Network error while calling '{endpoint}': {source}")]
    Network {
        endpoint: String,
        #[source]
        source: BoxedCause,
    },

    /// Cache operation failed
    #[error("Cache {operation} failed for key '{key}': {reason}")]
    Cache { operation: String, key: String, reason: String },

    /// Operation cancelled by the caller
    #[error("Operation cancelled: {reason}")]
    Cancelled { reason: String },

    /// Client was closed
    #[error("client is closed")]
    ClientClosed,
}

fn rate_limit_message(
    retry_after: &Duration,
    limit: &Option<u32>,
    window: &Option<Duration>,
) -> String {
    let mut message = format!("Rate limit exceeded. Retry after {retry_after:?}");
    if let (Some(limit), Some(window)) = (limit, window) {
        message.push_str(&format!(" (Limit: {limit} requests per {window:?})"));
    }
    message
}

impl KraError {
    /// Input validation failure for `field`
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), message: message.into() }
    }

    /// PIN did not match `P` + 9 digits + letter
    pub fn invalid_pin_format(pin: &str) -> Self {
        Self::validation(
            "pin",
            format!(
                "Invalid PIN format: '{pin}'. Expected format: P followed by 9 digits and a \
                 letter (e.g., P051234567A)"
            ),
        )
    }

    /// TCC did not match `TCC` + digits
    pub fn invalid_tcc_format(tcc: &str) -> Self {
        Self::validation(
            "tcc",
            format!(
                "Invalid TCC format: '{tcc}'. Expected format: TCC followed by digits (e.g., \
                 TCC123456)"
            ),
        )
    }

    /// Credentials rejected
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication { message: message.into(), status_code: 401 }
    }

    /// Rate limit exceeded
    pub fn rate_limited(
        retry_after: Duration,
        limit: Option<u32>,
        window: Option<Duration>,
    ) -> Self {
        Self::RateLimit { retry_after, limit, window }
    }

    /// Request to `endpoint` timed out on `attempt`
    pub fn timeout(endpoint: impl Into<String>, timeout: Duration, attempt: u32) -> Self {
        Self::Timeout { endpoint: endpoint.into(), timeout, attempt }
    }

    /// API failure with the given status
    pub fn api(
        status_code: u16,
        endpoint: impl Into<String>,
        message: impl Into<String>,
        response_body: Option<String>,
    ) -> Self {
        Self::Api {
            status_code,
            endpoint: endpoint.into(),
            message: message.into(),
            response_body,
        }
    }

    /// Transport failure while calling `endpoint`
    pub fn network<E>(endpoint: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network { endpoint: endpoint.into(), source: Arc::new(source) }
    }

    /// Cache failure
    pub fn cache(
        operation: impl Into<String>,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Cache { operation: operation.into(), key: key.into(), reason: reason.into() }
    }

    /// Cancellation
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled { reason: reason.into() }
    }

    /// Classification of this error
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::RateLimit { .. } => ErrorKind::RateLimit,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Api { status_code, .. } => ErrorKind::for_status(*status_code),
            Self::Network { .. } => ErrorKind::Network,
            Self::Cache { .. } => ErrorKind::Cache,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::ClientClosed => ErrorKind::ClientClosed,
        }
    }

    /// HTTP status associated with the error, if any
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Authentication { status_code, .. } | Self::Api { status_code, .. } => {
                Some(*status_code)
            }
            Self::RateLimit { .. } => Some(429),
            Self::Timeout { .. } => Some(408),
            _ => None,
        }
    }

    /// `true` for API failures with a 4xx status
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Api { status_code: 400..=499, .. })
    }

    /// `true` for API failures with a 5xx status
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Api { status_code: 500..=599, .. })
    }

    /// `true` when the caller cancelled the operation
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Endpoint the error relates to, if any
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Timeout { endpoint, .. }
            | Self::Api { endpoint, .. }
            | Self::Network { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }

    /// Structured detail map for logging and programmatic inspection
    pub fn details(&self) -> BTreeMap<String, String> {
        let mut details = BTreeMap::new();
        details.insert("kind".to_string(), self.kind().to_string());
        if let Some(status) = self.status_code() {
            details.insert("status_code".to_string(), status.to_string());
        }

        match self {
            Self::Validation { field, .. } => {
                details.insert("field".to_string(), field.clone());
            }
            Self::RateLimit { retry_after, limit, window } => {
                details.insert("retry_after_ms".to_string(), retry_after.as_millis().to_string());
                if let Some(limit) = limit {
                    details.insert("limit".to_string(), limit.to_string());
                }
                if let Some(window) = window {
                    details.insert("window_ms".to_string(), window.as_millis().to_string());
                }
            }
            Self::Timeout { endpoint, timeout, attempt } => {
                details.insert("endpoint".to_string(), endpoint.clone());
                details.insert("timeout_ms".to_string(), timeout.as_millis().to_string());
                details.insert("attempt".to_string(), attempt.to_string());
            }
            Self::Api { endpoint, response_body, .. } => {
                details.insert("endpoint".to_string(), endpoint.clone());
                if let Some(body) = response_body {
                    details.insert("response_body".to_string(), body.clone());
                }
            }
            Self::Network { endpoint, source } => {
                details.insert("endpoint".to_string(), endpoint.clone());
                details.insert("cause".to_string(), source.to_string());
            }
            Self::Cache { operation, key, reason } => {
                details.insert("operation".to_string(), operation.clone());
                details.insert("key".to_string(), key.clone());
                details.insert("reason".to_string(), reason.clone());
            }
            Self::Cancelled { reason } => {
                details.insert("reason".to_string(), reason.clone());
            }
            Self::Authentication { .. } | Self::ClientClosed => {}
        }

        details
    }
}

/// Standard interface for classifying errors by their characteristics
pub trait ErrorClassification {
    /// Check if this error is retryable
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Suggested retry delay, when the server supplied one
    fn retry_after(&self) -> Option<Duration>;
}

impl ErrorClassification for KraError {
    fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    fn severity(&self) -> ErrorSeverity {
        match self.kind() {
            ErrorKind::Cancelled => ErrorSeverity::Info,
            ErrorKind::RateLimit
            | ErrorKind::Timeout
            | ErrorKind::ServerFailure
            | ErrorKind::Cache => ErrorSeverity::Warning,
            ErrorKind::Validation
            | ErrorKind::Network
            | ErrorKind::ClientFailure
            | ErrorKind::ClientClosed => ErrorSeverity::Error,
            ErrorKind::Authentication => ErrorSeverity::Critical,
        }
    }

    fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimit { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Expected condition, typically caller-initiated
    Info,
    /// Transient, usually recovers on retry
    Warning,
    /// Failure requiring caller action
    Error,
    /// Every subsequent call will fail until fixed
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
