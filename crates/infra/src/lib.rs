//! # KRA Connect
//!
//! Async client for the Kenya Revenue Authority GavaConnect API.
//!
//! This crate contains:
//! - `KraClient` with PIN, TCC, e-slip, NIL return and taxpayer operations
//! - The request executor (rate limiting, retry with backoff, cancellation)
//! - A reqwest-backed transport behind the `Transport` trait
//! - Configuration loading from the environment or TOML/JSON files
//!
//! ## Architecture
//! - Validation, errors, rate limiting and caching live in
//!   `kra-connect-common`
//! - Configuration and result models live in `kra-connect-domain`
//! - Contains all I/O (HTTP, environment, files)
//!
//! ```no_run
//! use kra_connect::{CancellationToken, ClientConfig, KraClient};
//!
//! # async fn run() -> kra_connect::KraResult<()> {
//! let client = KraClient::new(ClientConfig::new("my-gavaconnect-api-key"))?;
//! let cancel = CancellationToken::new();
//! let result = client.verify_pin("P051234567A", &cancel).await?;
//! println!("{} valid={}", result.pin_number, result.is_valid);
//! client.close()?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{CachedResult, KraClient, KraClientBuilder, StaticTokenProvider, TokenProvider};
pub use http::{
    ApiResponse, ExecutorSettings, RequestExecutor, ReqwestTransport, Transport, TransportError,
    TransportRequest, TransportResponse,
};
pub use kra_connect_common::{CacheStats, ErrorKind, KraError, KraResult};
pub use kra_connect_domain::{
    CacheTtls, ClientConfig, EslipValidationResult, NilReturnRequest, NilReturnResult, PinVerificationResult,
    ResponseMetadata, TaxObligation, TaxpayerDetails, TccVerificationRequest, TccVerificationResult,
};
pub use observability::init_tracing;
pub use tokio_util::sync::CancellationToken;
