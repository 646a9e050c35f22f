//! Bearer token supply
//!
//! The executor asks a [`TokenProvider`] for a token before every attempt,
//! so a provider that refreshes credentials can be swapped in without
//! touching the request pipeline.

use std::fmt;

use async_trait::async_trait;
use kra_connect_common::error::KraResult;
use kra_connect_common::validation::validate_api_key;

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Token to send as `Authorization: Bearer <token>`
    async fn access_token(&self) -> KraResult<String>;
}

/// Provider that always returns the configured API key
#[derive(Clone)]
pub struct StaticTokenProvider {
    api_key: String,
}

impl StaticTokenProvider {
    /// Wrap an API key, rejecting keys shorter than 16 characters
    pub fn new(api_key: impl Into<String>) -> KraResult<Self> {
        let api_key = api_key.into().trim().to_string();
        validate_api_key(&api_key)?;
        Ok(Self { api_key })
    }
}

impl fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenProvider").field("api_key", &"<redacted>").finish()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> KraResult<String> {
        Ok(self.api_key.clone())
    }
}
