//! Request executor
//!
//! One call to [`RequestExecutor::execute`] is one logical request. Each
//! attempt waits for a rate-limit token, sends through the [`Transport`],
//! and classifies the outcome into a [`KraError`] kind. Retryable kinds are
//! retried with jittered exponential backoff until `max_retries` is spent.
//! Every suspension point observes the caller's cancellation token.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kra_connect_common::error::{KraError, KraResult};
use kra_connect_common::resilience::{sleep_or_cancel, BackoffPolicy, RateLimiter, RateLimiterConfig};
use kra_connect_domain::constants::{CONTENT_TYPE_JSON, DEFAULT_RETRY_AFTER, USER_AGENT};
use kra_connect_domain::ClientConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT as USER_AGENT_HEADER};
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::response::{error_detail, parse_object, ApiResponse};
use super::transport::{Transport, TransportError, TransportRequest, TransportResponse};
use crate::api::auth::TokenProvider;

const AUTH_FAILED: &str = "Authentication failed. Please check your API key.";
const ACCESS_FORBIDDEN: &str = "Access forbidden. Your API key may not have the required permissions.";
const PARSE_FAILED: &str = "Failed to parse API response";

/// Executor settings derived from a validated [`ClientConfig`]
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Base URL without a trailing slash
    pub base_url: String,
    /// Deadline for a single attempt
    pub timeout: Duration,
    /// Retries after the first send
    pub max_retries: u32,
    /// Delay schedule between retries
    pub backoff: BackoffPolicy,
    /// Reported back in rate-limit errors
    pub rate_limit: RateLimiterConfig,
    /// Log request and response bodies
    pub debug: bool,
}

impl ExecutorSettings {
    /// Derive settings, rejecting a base URL that does not parse
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error on `base_url`.
    pub fn from_config(config: &ClientConfig) -> KraResult<Self> {
        let base_url = config.normalized_base_url().to_string();
        Url::parse(&base_url).map_err(|err| {
            KraError::validation("base_url", format!("Invalid base URL '{base_url}': {err}"))
        })?;

        Ok(Self {
            base_url,
            timeout: config.timeout,
            max_retries: config.retry.max_retries,
            backoff: BackoffPolicy::new(config.retry.initial_delay, config.retry.max_delay),
            rate_limit: RateLimiterConfig {
                enabled: config.rate_limit.enabled,
                max_requests: config.rate_limit.max_requests,
                window: config.rate_limit.window,
            },
            debug: config.debug,
        })
    }
}

/// One send of a logical request, kept for logging and error context
#[derive(Debug, Clone)]
pub struct RequestAttempt {
    pub method: Method,
    /// Path relative to the base URL
    pub endpoint: String,
    /// Size of the encoded JSON body, zero when absent
    pub body_bytes: usize,
    /// One-based
    pub number: u32,
    /// Taken just before the send
    pub started_at: Instant,
}

impl RequestAttempt {
    fn start(method: &Method, endpoint: &str, body: Option<&[u8]>, number: u32) -> Self {
        Self {
            method: method.clone(),
            endpoint: endpoint.to_string(),
            body_bytes: body.map_or(0, <[u8]>::len),
            number,
            started_at: Instant::now(),
        }
    }

    /// Time since the attempt started
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Rate-limited, retrying request pipeline over a [`Transport`]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenProvider>,
    limiter: Arc<RateLimiter>,
    settings: ExecutorSettings,
}

impl RequestExecutor {
    /// Assemble an executor; the limiter is shared with the owning client
    pub fn new(
        settings: ExecutorSettings,
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenProvider>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self { transport, tokens, limiter, settings }
    }

    /// Settings in effect for every request
    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Limiter consulted before every attempt
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Run one logical request to completion
    ///
    /// Sends at most `max_retries + 1` times. Returns the normalized payload
    /// on success, the last classified error once retries are spent, or a
    /// `Cancelled` error as soon as `cancel` fires.
    ///
    /// # Errors
    ///
    /// Any [`KraError`] kind except `Validation` of the inputs, `Cache` and
    /// `ClientClosed`.
    #[instrument(skip(self, body, cancel), fields(method = %method, endpoint = %endpoint))]
    pub async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        cancel: &CancellationToken,
    ) -> KraResult<ApiResponse> {
        let payload = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|err| KraError::validation("body", format!("Failed to serialize request body: {err}")))?;

        let mut retry: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(KraError::cancelled("request cancelled"));
            }
            self.limiter.wait_with_cancel(cancel).await?;

            let attempt = RequestAttempt::start(&method, endpoint, payload.as_deref(), retry + 1);
            let err = match self.send_once(&attempt, payload.clone(), cancel).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if err.is_cancelled() {
                return Err(err);
            }
            if !err.kind().is_retryable() || retry >= self.settings.max_retries {
                warn!(
                    attempt = attempt.number,
                    kind = %err.kind(),
                    status = ?err.status_code(),
                    error = %err,
                    "request failed"
                );
                return Err(err);
            }

            let delay = self.settings.backoff.delay(retry);
            warn!(
                attempt = attempt.number,
                max_attempts = self.settings.max_retries + 1,
                delay_ms = delay.as_millis() as u64,
                kind = %err.kind(),
                error = %err,
                "retrying request"
            );
            sleep_or_cancel(delay, cancel).await?;
            retry += 1;
        }
    }

    async fn send_once(
        &self,
        attempt: &RequestAttempt,
        body: Option<Vec<u8>>,
        cancel: &CancellationToken,
    ) -> KraResult<ApiResponse> {
        let token = self.tokens.access_token().await?;
        if self.settings.debug {
            if let Some(body) = body.as_deref() {
                debug!(event = "http.request_body", body = %String::from_utf8_lossy(body));
            }
        }

        let request = TransportRequest {
            method: attempt.method.clone(),
            url: self.url_for(&attempt.endpoint)?,
            headers: request_headers(&token)?,
            body,
            timeout: self.settings.timeout,
        };
        debug!(
            event = "http.send",
            attempt = attempt.number,
            body_bytes = attempt.body_bytes,
            "sending request"
        );

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(KraError::cancelled("request cancelled during send")),
            outcome = self.transport.send(request) => outcome,
        };

        match outcome {
            Ok(response) => {
                debug!(
                    event = "http.response",
                    attempt = attempt.number,
                    status = response.status.as_u16(),
                    elapsed_ms = attempt.elapsed().as_millis() as u64,
                    "received response"
                );
                if self.settings.debug {
                    debug!(event = "http.response_body", body = %response.body);
                }
                self.classify(attempt, response)
            }
            Err(TransportError::Timeout(timeout)) => {
                Err(KraError::timeout(&attempt.endpoint, timeout, attempt.number))
            }
            Err(err) => {
                debug!(
                    event = "http.transport_error",
                    attempt = attempt.number,
                    elapsed_ms = attempt.elapsed().as_millis() as u64,
                    error = %err,
                    "transport failed"
                );
                Err(KraError::network(&attempt.endpoint, err))
            }
        }
    }

    fn url_for(&self, endpoint: &str) -> KraResult<Url> {
        let url = format!("{}{}", self.settings.base_url, endpoint);
        Url::parse(&url).map_err(|err| KraError::validation("endpoint", format!("Invalid request URL '{url}': {err}")))
    }

    /// Map a received response to a payload or a classified error
    fn classify(&self, attempt: &RequestAttempt, response: TransportResponse) -> KraResult<ApiResponse> {
        let endpoint = attempt.endpoint.as_str();
        let status = response.status;

        if status.is_success() {
            let Some(raw) = parse_object(&response.body) else {
                return Err(KraError::api(status.as_u16(), endpoint, PARSE_FAILED, Some(response.body)));
            };
            let parsed = ApiResponse::from_raw(raw);
            if parsed.is_failure() {
                let message = parsed.failure_message().to_string();
                return Err(KraError::api(status.as_u16(), endpoint, message, Some(response.body)));
            }
            return Ok(parsed);
        }

        Err(self.status_error(attempt, &response))
    }

    fn status_error(&self, attempt: &RequestAttempt, response: &TransportResponse) -> KraError {
        let endpoint = attempt.endpoint.as_str();
        let body = response.body.clone();
        let detail = error_detail(&body).unwrap_or_else(|| body.clone());

        match response.status {
            StatusCode::UNAUTHORIZED => KraError::authentication(AUTH_FAILED),
            StatusCode::FORBIDDEN => {
                KraError::Authentication { message: ACCESS_FORBIDDEN.to_string(), status_code: 403 }
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .header("retry-after")
                    .and_then(|value| value.trim().parse::<u64>().ok())
                    .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs);
                KraError::rate_limited(
                    retry_after,
                    Some(self.settings.rate_limit.max_requests),
                    Some(self.settings.rate_limit.window),
                )
            }
            StatusCode::REQUEST_TIMEOUT => KraError::timeout(endpoint, self.settings.timeout, attempt.number),
            StatusCode::BAD_REQUEST => KraError::api(400, endpoint, format!("Bad request: {detail}"), Some(body)),
            StatusCode::NOT_FOUND => {
                KraError::api(404, endpoint, format!("Endpoint not found: {endpoint}"), Some(body))
            }
            status => {
                let message = if detail.trim().is_empty() {
                    format!("API request failed with status {}", status.as_u16())
                } else {
                    detail
                };
                KraError::api(status.as_u16(), endpoint, message, Some(body))
            }
        }
    }
}

fn request_headers(token: &str) -> KraResult<HeaderMap> {
    let authorization = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| KraError::authentication("API key contains characters not allowed in a header"))?;

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, authorization);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
    headers.insert(ACCEPT, HeaderValue::from_static(CONTENT_TYPE_JSON));
    headers.insert(USER_AGENT_HEADER, HeaderValue::from_static(USER_AGENT));
    Ok(headers)
}
