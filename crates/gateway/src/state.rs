//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::upstream::{Sleeper, UpstreamClient, UpstreamError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: GatewayConfig,
    upstream: UpstreamClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, UpstreamError> {
        let upstream = UpstreamClient::new(&config.upstream)?;
        Ok(Self::from_parts(config, upstream))
    }

    /// Create a state whose upstream client backs off through `sleeper`.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream HTTP client cannot be built.
    pub fn with_sleeper(
        config: GatewayConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, UpstreamError> {
        let upstream = UpstreamClient::with_sleeper(&config.upstream, sleeper)?;
        Ok(Self::from_parts(config, upstream))
    }

    fn from_parts(config: GatewayConfig, upstream: UpstreamClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, upstream }),
        }
    }

    /// Get a reference to the gateway configuration.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Get a reference to the upstream catalog client.
    #[must_use]
    pub fn upstream(&self) -> &UpstreamClient {
        &self.inner.upstream
    }
}
