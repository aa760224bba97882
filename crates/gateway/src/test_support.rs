//! Shared fixtures for handler tests: a fake upstream and a gateway wired to it.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::response::Response;
use serde_json::Value;
use url::Url;

use crate::config::{GatewayConfig, LogFormat, UpstreamConfig};
use crate::state::AppState;
use crate::upstream::{RecordingSleeper, RetryPolicy};

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_upstream(app: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake upstream");
    let addr = listener.local_addr().expect("fake upstream address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/").parse().expect("fake upstream URL")
}

pub fn upstream_config(base_url: Url) -> UpstreamConfig {
    UpstreamConfig {
        base_url,
        api_token: None,
        timeout: Duration::from_secs(5),
        retry: RetryPolicy::default(),
    }
}

pub fn gateway_config(base_url: Url) -> GatewayConfig {
    GatewayConfig {
        host: "127.0.0.1".parse().expect("loopback"),
        port: 0,
        upstream: upstream_config(base_url),
        static_dir: None,
        log_format: LogFormat::Pretty,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Gateway router pointed at `base_url`, with a recording backoff timer.
pub fn gateway_app(base_url: Url) -> (Router, RecordingSleeper) {
    let sleeper = RecordingSleeper::new();
    let state = AppState::with_sleeper(gateway_config(base_url), Arc::new(sleeper.clone()))
        .expect("gateway state");
    (crate::routes::app(state), sleeper)
}

pub async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
