//! Client for the upstream headless-CMS catalog API.
//!
//! Every read goes through [`UpstreamClient::with_retry`]: network errors,
//! timeouts, non-2xx statuses and bodies without a top-level `data` field are
//! retried with exponential backoff before the failure is surfaced.
//! Each inbound request runs its own retry loop; nothing is shared or
//! coalesced between requests.

pub mod retry;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::UpstreamConfig;

pub use retry::{RecordingSleeper, RetryPolicy, Sleeper, TokioSleeper};

/// Longest body excerpt kept in errors and logs.
const BODY_EXCERPT_CHARS: usize = 200;

/// Errors that can occur when talking to the upstream API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection or protocol failure.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// The per-request timeout elapsed.
    #[error("upstream request timed out")]
    Timeout,

    /// Upstream answered with a non-2xx status.
    #[error("upstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// Upstream answered 2xx with a body we cannot use.
    #[error("malformed upstream response: {0}")]
    Malformed(String),

    /// All attempts failed; carries the last failure.
    #[error("upstream failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<UpstreamError>,
    },

    /// A request URL could not be built.
    #[error("invalid upstream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

impl UpstreamError {
    /// Whether another attempt could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Timeout | Self::Status { .. } | Self::Malformed(_)
        )
    }
}

/// Client for the upstream catalog API.
///
/// Cheaply cloneable; clones share the connection pool and timer.
#[derive(Clone)]
pub struct UpstreamClient {
    inner: Arc<UpstreamClientInner>,
}

struct UpstreamClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<SecretString>,
    timeout: Duration,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl UpstreamClient {
    /// Create a client that backs off on the tokio clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        Self::with_sleeper(config, Arc::new(TokioSleeper))
    }

    /// Create a client with a custom backoff timer.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_sleeper(
        config: &UpstreamConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, UpstreamError> {
        // No whole-response timeout: media bodies stream for as long as they take.
        let client = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(UpstreamError::Http)?;

        Ok(Self {
            inner: Arc::new(UpstreamClientInner {
                client,
                base_url: config.base_url.clone(),
                api_token: config.api_token.clone(),
                timeout: config.timeout,
                retry: config.retry,
                sleeper,
            }),
        })
    }

    /// The retry policy applied to reads.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.inner.retry
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// List products with every relation expanded.
    ///
    /// `query` is the raw query string from the inbound request; its pairs
    /// (filters, pagination, sort) are forwarded after `populate=*`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Exhausted`] once every attempt has failed.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: Option<&str>) -> Result<Value, UpstreamError> {
        let url = self.products_url(query)?;
        self.with_retry("list_products", || self.get_json(url.clone()))
            .await
    }

    /// Open a media download, retrying until upstream answers 2xx.
    ///
    /// The body is left unread so the caller can stream it.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Exhausted`] once every attempt has failed.
    #[instrument(skip(self))]
    pub async fn fetch_media(&self, path: &str) -> Result<reqwest::Response, UpstreamError> {
        let url = self.inner.base_url.join(&format!("uploads/{path}"))?;
        self.with_retry("fetch_media", || self.get_ok(url.clone()))
            .await
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    fn products_url(&self, query: Option<&str>) -> Result<Url, UpstreamError> {
        let mut url = self.inner.base_url.join("api/products")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("populate", "*");
            if let Some(query) = query {
                for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                    if key != "populate" {
                        pairs.append_pair(&key, &value);
                    }
                }
            }
        }
        Ok(url)
    }

    async fn get_ok(&self, url: Url) -> Result<reqwest::Response, UpstreamError> {
        let mut request = self.inner.client.get(url);
        if let Some(token) = &self.inner.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = self.bounded(request.send()).await?;
        let status = response.status();
        if !status.is_success() {
            let body = self.bounded(response.text()).await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status,
                body: excerpt(&body),
            });
        }

        Ok(response)
    }

    async fn get_json(&self, url: Url) -> Result<Value, UpstreamError> {
        let text = self
            .bounded(async { self.get_ok(url).await?.text().await.map_err(UpstreamError::from) })
            .await?;

        let value: Value = serde_json::from_str(&text).map_err(|e| {
            UpstreamError::Malformed(format!("invalid JSON ({e}): {}", excerpt(&text)))
        })?;

        if value.get("data").is_none() {
            return Err(UpstreamError::Malformed(
                "response has no top-level `data` field".to_string(),
            ));
        }

        Ok(value)
    }

    /// Bound `fut` by the per-attempt timeout.
    async fn bounded<T, E>(
        &self,
        fut: impl Future<Output = Result<T, E>>,
    ) -> Result<T, UpstreamError>
    where
        UpstreamError: From<E>,
    {
        tokio::time::timeout(self.inner.timeout, fut)
            .await
            .map_err(|_| UpstreamError::Timeout)?
            .map_err(UpstreamError::from)
    }

    /// Run `attempt` until it succeeds, fails permanently, or the policy's
    /// attempt ceiling is reached.
    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        mut attempt: F,
    ) -> Result<T, UpstreamError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let policy = self.inner.retry;
        let mut attempt_no = 1;

        loop {
            match attempt().await {
                Ok(value) => {
                    if attempt_no > 1 {
                        debug!(operation, attempt = attempt_no, "upstream recovered");
                    }
                    return Ok(value);
                }
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) if attempt_no >= policy.max_attempts => {
                    warn!(
                        operation,
                        attempts = attempt_no,
                        error = %err,
                        "upstream retries exhausted"
                    );
                    return Err(UpstreamError::Exhausted {
                        attempts: attempt_no,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    let delay = policy.delay_for(attempt_no);
                    warn!(
                        operation,
                        attempt = attempt_no,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "upstream attempt failed, backing off"
                    );
                    self.inner.sleeper.sleep(delay).await;
                    attempt_no += 1;
                }
            }
        }
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
