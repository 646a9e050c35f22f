//! KRA GavaConnect client
//!
//! Validates and normalizes input, consults the TTL cache, and sends
//! through the shared [`RequestExecutor`]. Cloning a [`KraClient`] is cheap
//! and every clone shares the same limiter, cache and closed flag.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use kra_connect_common::cache::{generate_cache_key, Cache, CacheConfig, CacheStats};
use kra_connect_common::error::{KraError, KraResult};
use kra_connect_common::resilience::RateLimiter;
use kra_connect_common::validation::{validate_eslip, validate_pin, validate_tcc};
use kra_connect_domain::constants::{
    CACHE_PREFIX_ESLIP, CACHE_PREFIX_PIN, CACHE_PREFIX_TAXPAYER, CACHE_PREFIX_TCC, ENDPOINT_ESLIP_VALIDATION,
    ENDPOINT_NIL_RETURN, ENDPOINT_PIN_VERIFICATION, ENDPOINT_TAXPAYER_OBLIGATIONS, ENDPOINT_TCC_VERIFICATION,
    USER_AGENT,
};
use kra_connect_domain::{
    ClientConfig, EslipValidationResult, NilReturnRequest, NilReturnResult, PinVerificationResult, TaxpayerDetails,
    TccVerificationRequest, TccVerificationResult,
};
use reqwest::Method;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::auth::{StaticTokenProvider, TokenProvider};
use super::mapping;
use crate::http::{ApiResponse, ExecutorSettings, ReqwestTransport, RequestExecutor, Transport};

/// Value stored in the client cache, one variant per cached operation
#[derive(Debug, Clone)]
pub enum CachedResult {
    Pin(PinVerificationResult),
    Tcc(TccVerificationResult),
    Eslip(EslipValidationResult),
    Taxpayer(TaxpayerDetails),
}

impl CachedResult {
    fn into_pin(self) -> Option<PinVerificationResult> {
        match self {
            Self::Pin(result) => Some(result),
            _ => None,
        }
    }

    fn into_tcc(self) -> Option<TccVerificationResult> {
        match self {
            Self::Tcc(result) => Some(result),
            _ => None,
        }
    }

    fn into_eslip(self) -> Option<EslipValidationResult> {
        match self {
            Self::Eslip(result) => Some(result),
            _ => None,
        }
    }

    fn into_taxpayer(self) -> Option<TaxpayerDetails> {
        match self {
            Self::Taxpayer(result) => Some(result),
            _ => None,
        }
    }
}

struct ClientInner {
    config: ClientConfig,
    executor: RequestExecutor,
    cache: Cache<String, CachedResult>,
    closed: AtomicBool,
}

/// Client for the KRA GavaConnect API
#[derive(Clone)]
pub struct KraClient {
    inner: Arc<ClientInner>,
}

impl KraClient {
    /// Client with the reqwest transport and the configured API key
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error if `config` is invalid.
    pub fn new(config: ClientConfig) -> KraResult<Self> {
        Self::builder(config).build()
    }

    /// Create a builder for injecting a transport or token provider
    pub fn builder(config: ClientConfig) -> KraClientBuilder {
        KraClientBuilder { config, transport: None, token_provider: None }
    }

    /// Validated configuration the client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Whether [`KraClient::close`] has been called
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Rate-limit tokens left, `-1` when rate limiting is disabled
    pub fn available_tokens(&self) -> i64 {
        self.inner.executor.limiter().available_tokens()
    }

    /// Snapshot of the response cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    fn ensure_open(&self) -> KraResult<()> {
        if self.is_closed() {
            return Err(KraError::ClientClosed);
        }
        Ok(())
    }

    /// Verify a KRA PIN
    ///
    /// The PIN is trimmed and uppercased before validation. Results are
    /// cached for the PIN TTL.
    ///
    /// # Errors
    ///
    /// `Validation` for a malformed PIN, `ClientClosed` after [`close`], or
    /// any error the executor classifies.
    ///
    /// [`close`]: KraClient::close
    #[instrument(skip(self, cancel))]
    pub async fn verify_pin(&self, pin: &str, cancel: &CancellationToken) -> KraResult<PinVerificationResult> {
        self.ensure_open()?;
        let pin = validate_pin(pin)?;
        let key = generate_cache_key(CACHE_PREFIX_PIN, &[&pin]);
        let ttl = self.inner.config.cache.ttl.pin_verification;

        self.cached(key, ttl, CachedResult::Pin, CachedResult::into_pin, move || async move {
            let response = self.post(ENDPOINT_PIN_VERIFICATION, json!({ "KRAPIN": pin }), cancel).await?;
            Ok(mapping::pin_result(&pin, response))
        })
        .await
    }

    /// Verify a tax compliance certificate against a PIN
    #[instrument(skip(self, request, cancel), fields(tcc = %request.tcc_number))]
    pub async fn verify_tcc(
        &self,
        request: &TccVerificationRequest,
        cancel: &CancellationToken,
    ) -> KraResult<TccVerificationResult> {
        self.ensure_open()?;
        let pin = validate_pin(&request.kra_pin)?;
        let tcc = validate_tcc(&request.tcc_number)?;
        let key = generate_cache_key(CACHE_PREFIX_TCC, &[&format!("{pin}_{tcc}")]);
        let ttl = self.inner.config.cache.ttl.tcc_verification;

        self.cached(key, ttl, CachedResult::Tcc, CachedResult::into_tcc, move || async move {
            let body = json!({ "kraPIN": pin, "tccNumber": tcc });
            let response = self.post(ENDPOINT_TCC_VERIFICATION, body, cancel).await?;
            Ok(mapping::tcc_result(&pin, &tcc, response))
        })
        .await
    }

    /// Validate an electronic payment slip
    #[instrument(skip(self, cancel))]
    pub async fn validate_eslip(
        &self,
        eslip_number: &str,
        cancel: &CancellationToken,
    ) -> KraResult<EslipValidationResult> {
        self.ensure_open()?;
        let eslip = validate_eslip(eslip_number)?;
        let key = generate_cache_key(CACHE_PREFIX_ESLIP, &[&eslip]);
        let ttl = self.inner.config.cache.ttl.eslip_validation;

        self.cached(key, ttl, CachedResult::Eslip, CachedResult::into_eslip, move || async move {
            let response = self.post(ENDPOINT_ESLIP_VALIDATION, json!({ "EslipNumber": eslip }), cancel).await?;
            Ok(mapping::eslip_result(&eslip, response))
        })
        .await
    }

    /// File a NIL return; filings are never cached
    #[instrument(skip(self, request, cancel), fields(period = %request.period()))]
    pub async fn file_nil_return(
        &self,
        request: &NilReturnRequest,
        cancel: &CancellationToken,
    ) -> KraResult<NilReturnResult> {
        self.ensure_open()?;
        let request = request.validated()?;
        let body = json!({
            "TAXPAYERDETAILS": {
                "TaxpayerPIN": request.pin_number,
                "ObligationCode": request.obligation_code,
                "Month": request.month,
                "Year": request.year,
            }
        });

        let response = self.post(ENDPOINT_NIL_RETURN, body, cancel).await?;
        let result = mapping::nil_return_result(&request, response);
        info!(pin = %result.pin_number, status = ?result.status, "NIL return filed");
        Ok(result)
    }

    /// Taxpayer profile plus registered obligations
    ///
    /// Issues the PIN lookup and then the obligation lookup; either failing
    /// fails the call and nothing is cached.
    #[instrument(skip(self, cancel))]
    pub async fn get_taxpayer_details(&self, pin: &str, cancel: &CancellationToken) -> KraResult<TaxpayerDetails> {
        self.ensure_open()?;
        let pin = validate_pin(pin)?;
        let key = generate_cache_key(CACHE_PREFIX_TAXPAYER, &[&pin]);
        let ttl = self.inner.config.cache.ttl.taxpayer_details;

        self.cached(key, ttl, CachedResult::Taxpayer, CachedResult::into_taxpayer, move || async move {
            let profile = self.post(ENDPOINT_PIN_VERIFICATION, json!({ "KRAPIN": pin }), cancel).await?;
            let obligations =
                self.post(ENDPOINT_TAXPAYER_OBLIGATIONS, json!({ "taxPayerPin": pin }), cancel).await?;
            Ok(mapping::taxpayer_details(&pin, profile, &obligations))
        })
        .await
    }

    /// Verify many PINs concurrently
    ///
    /// Every verification runs to completion; the first error in input
    /// order is returned.
    pub async fn verify_pins_batch<S: AsRef<str>>(
        &self,
        pins: &[S],
        cancel: &CancellationToken,
    ) -> KraResult<Vec<PinVerificationResult>> {
        self.ensure_open()?;
        debug!(count = pins.len(), "verifying PIN batch");
        join_all(pins.iter().map(|pin| self.verify_pin(pin.as_ref(), cancel))).await.into_iter().collect()
    }

    /// Verify many certificates concurrently, with the same error rule as
    /// [`KraClient::verify_pins_batch`]
    pub async fn verify_tccs_batch(
        &self,
        requests: &[TccVerificationRequest],
        cancel: &CancellationToken,
    ) -> KraResult<Vec<TccVerificationResult>> {
        self.ensure_open()?;
        debug!(count = requests.len(), "verifying TCC batch");
        join_all(requests.iter().map(|request| self.verify_tcc(request, cancel))).await.into_iter().collect()
    }

    /// Drop every cached result
    pub fn clear_cache(&self) -> KraResult<()> {
        self.ensure_open()?;
        self.inner.cache.clear();
        Ok(())
    }

    /// Close the client and drop its cache
    ///
    /// Every later operation fails with `ClientClosed`, including a second
    /// `close`.
    pub fn close(&self) -> KraResult<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Err(KraError::ClientClosed);
        }
        self.inner.cache.clear();
        info!("KRA client closed");
        Ok(())
    }

    async fn post(&self, endpoint: &str, body: Value, cancel: &CancellationToken) -> KraResult<ApiResponse> {
        self.inner.executor.execute(Method::POST, endpoint, Some(&body), cancel).await
    }

    /// Serve from the cache or fetch and store under `key`
    async fn cached<T, F, Fut>(
        &self,
        key: String,
        ttl: Duration,
        wrap: fn(T) -> CachedResult,
        unwrap: fn(CachedResult) -> Option<T>,
        fetch: F,
    ) -> KraResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = KraResult<T>>,
    {
        let value = self
            .inner
            .cache
            .get_or_set_async(key.clone(), ttl, move || async move { fetch().await.map(wrap) })
            .await?;
        unwrap(value).ok_or_else(|| KraError::cache("get", key, "cached value has an unexpected type"))
    }
}

impl fmt::Debug for KraClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KraClient")
            .field("base_url", &self.inner.config.normalized_base_url())
            .field("closed", &self.is_closed())
            .field("cache", &self.inner.cache)
            .finish_non_exhaustive()
    }
}

/// Builder for [`KraClient`]
pub struct KraClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    token_provider: Option<Arc<dyn TokenProvider>>,
}

impl KraClientBuilder {
    /// Send requests through `transport` instead of reqwest
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Take bearer tokens from `provider` instead of the API key
    pub fn token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error if the configuration is invalid, or a
    /// `Network` error if the HTTP client cannot be created.
    pub fn build(self) -> KraResult<KraClient> {
        let config = self.config;
        config.validate()?;
        let settings = ExecutorSettings::from_config(&config)?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::builder()
                    .timeout(config.timeout)
                    .user_agent(USER_AGENT)
                    .build()
                    .map_err(|err| KraError::network(config.normalized_base_url(), err))?,
            ),
        };
        let tokens: Arc<dyn TokenProvider> = match self.token_provider {
            Some(provider) => provider,
            None => Arc::new(StaticTokenProvider::new(config.api_key.clone())?),
        };

        let limiter = Arc::new(RateLimiter::new(settings.rate_limit.clone())?);
        let cache = Cache::new(CacheConfig {
            enabled: config.cache.enabled,
            max_entries: config.cache.max_entries,
            track_metrics: true,
        });

        info!(
            base_url = %settings.base_url,
            rate_limit = settings.rate_limit.enabled,
            cache = config.cache.enabled,
            "KRA client created"
        );

        let executor = RequestExecutor::new(settings, transport, tokens, limiter);
        Ok(KraClient {
            inner: Arc::new(ClientInner { config, executor, cache, closed: AtomicBool::new(false) }),
        })
    }
}
