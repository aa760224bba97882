//! Gateway configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `UPSTREAM_API_URL` - Base URL of the catalog API (e.g., `http://cms.internal:1337`)
//!
//! ## Optional
//! - `SHOPFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOPFRONT_PORT` - Listen port (default: 5000)
//! - `UPSTREAM_API_TOKEN` - Bearer token for the catalog API (never sent to browsers)
//! - `UPSTREAM_TIMEOUT_SECS` - Per-attempt timeout (default: 30)
//! - `UPSTREAM_MAX_ATTEMPTS` - Attempts per upstream read, including the first (default: 3)
//! - `UPSTREAM_BACKOFF_BASE_MS` - First backoff delay (default: 1000)
//! - `UPSTREAM_BACKOFF_MAX_MS` - Backoff ceiling (default: 10000)
//! - `SHOPFRONT_STATIC_DIR` - Directory with the built storefront UI to serve
//! - `SHOPFRONT_LOG_FORMAT` - `pretty` (default) or `json`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::upstream::RetryPolicy;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Gateway application configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Upstream catalog API configuration
    pub upstream: UpstreamConfig,
    /// Built UI bundle to serve, with `index.html` fallback
    pub static_dir: Option<PathBuf>,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., production, staging)
    pub sentry_environment: Option<String>,
}

/// Upstream catalog API configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct UpstreamConfig {
    /// Base URL; API paths are resolved against it
    pub base_url: Url,
    /// Bearer token attached to every upstream request
    pub api_token: Option<SecretString>,
    /// Per-attempt request timeout
    pub timeout: Duration,
    /// Retry and backoff policy for reads
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected `pretty` or `json`, got `{other}`")),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        Ok(Self {
            host: env.parse_or("SHOPFRONT_HOST", "127.0.0.1")?,
            port: env.parse_or("SHOPFRONT_PORT", "5000")?,
            upstream: UpstreamConfig::from_env(&env)?,
            static_dir: env.optional("SHOPFRONT_STATIC_DIR").map(PathBuf::from),
            log_format: env.parse_or("SHOPFRONT_LOG_FORMAT", "pretty")?,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl UpstreamConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let raw = env.required("UPSTREAM_API_URL")?;
        let base_url = parse_base_url(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar("UPSTREAM_API_URL".to_string(), e))?;

        let max_attempts: u32 = env.parse_or("UPSTREAM_MAX_ATTEMPTS", "3")?;
        if max_attempts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "UPSTREAM_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            api_token: env.optional("UPSTREAM_API_TOKEN").map(SecretString::from),
            timeout: Duration::from_secs(env.parse_or("UPSTREAM_TIMEOUT_SECS", "30")?),
            retry: RetryPolicy {
                max_attempts,
                base_delay: Duration::from_millis(env.parse_or("UPSTREAM_BACKOFF_BASE_MS", "1000")?),
                max_delay: Duration::from_millis(env.parse_or("UPSTREAM_BACKOFF_MAX_MS", "10000")?),
            },
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the upstream base URL, normalising it to end in `/` so relative
/// joins keep any path prefix.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme `{}`", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Variable lookup with typed helpers.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable; empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.optional(key).unwrap_or_else(|| default.to_string());
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}
