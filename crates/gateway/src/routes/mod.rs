//! HTTP route handlers for the gateway.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check (no upstream call)
//!
//! # Catalog
//! GET  /api/products           - Product listing, relations expanded
//! GET  /api/products/{id}      - One product by numeric ID or document key
//! GET  /uploads/{*path}        - Uploaded media, streamed from upstream
//!
//! # Orders
//! POST /api/orders             - Accept an order, return its ID
//!
//! # UI (when SHOPFRONT_STATIC_DIR is set)
//! GET  /*                      - Built storefront, index.html fallback
//! ```

pub mod media;
pub mod orders;
pub mod products;

use axum::{
    Router,
    http::Request,
    routing::{get, post},
};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the catalog API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/orders", post(orders::create))
}

/// Create all routes for the gateway.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api", api_routes())
        .route("/uploads/{*path}", get(media::show))
}

/// Build the complete application: routes, static UI, request IDs and
/// request tracing.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .merge(routes());

    if let Some(dir) = &state.config().static_dir {
        let index = ServeFile::new(dir.join("index.html"));
        router = router.fallback_service(ServeDir::new(dir).fallback(index));
    }

    router
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the upstream.
async fn health() -> &'static str {
    "ok"
}
