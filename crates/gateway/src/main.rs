//! Shopfront Gateway - proxy between the storefront and the catalog API.
//!
//! Serves the storefront's API surface (port 5000 by default):
//!
//! - `GET /api/products`, `GET /api/products/{id}` - catalog reads, retried upstream
//! - `GET /uploads/{*path}` - product media, streamed from upstream
//! - `POST /api/orders` - order acknowledgement (logged, not stored)
//! - `GET /health` - liveness
//!
//! The upstream API token never leaves this process.

#![cfg_attr(not(test), forbid(unsafe_code))]

use shopfront_gateway::{AppState, GatewayConfig, telemetry};

#[tokio::main]
async fn main() {
    let config = GatewayConfig::from_env().expect("Failed to load configuration");

    // Sentry before the subscriber, so the tracing layer finds a client
    let _sentry = telemetry::init_sentry(&config);
    telemetry::init_tracing(config.log_format);

    tracing::info!(
        upstream = %config.upstream.base_url,
        sentry = config.sentry_dsn.is_some(),
        static_dir = ?config.static_dir,
        "starting gateway"
    );

    let addr = config.socket_addr();
    let state = AppState::new(config).expect("Failed to build upstream client");

    let app = shopfront_gateway::app(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!(%addr, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("gateway stopped");
}

/// Resolve on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.expect("Failed to install Ctrl+C handler"),
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");

    tracing::info!("shutdown requested, draining connections");
}
