//! Integration tests for Shopfront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! Each test starts its own world on loopback ports: a fake upstream catalog,
//! the real gateway pointed at it, and a [`CatalogClient`] pointed at the
//! gateway. Nothing external is required.
//!
//! # Test Categories
//!
//! - `storefront_flow` - browse, cart and checkout through the gateway
//! - `gateway_failures` - not-found, retry exhaustion and media proxying

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::RawQuery;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use serde_json::{Value, json};
use shopfront_client::CatalogClient;
use shopfront_gateway::upstream::RecordingSleeper;
use shopfront_gateway::{AppState, GatewayConfig};
use url::Url;

/// Upstream catalog used by the fake CMS.
#[must_use]
pub fn sample_catalog() -> Value {
    json!({
        "data": [
            {
                "id": 1, "documentId": "tee-doc", "title": "Tee", "price": 20,
                "desc": "Organic cotton tee", "type": "featured", "isNew": true,
                "img": [{"id": 10, "documentId": "img-tee", "name": "tee.png",
                         "url": "/uploads/tee.png", "mime": "image/png"}],
                "img2": null,
                "categories": [{"id": 1, "documentId": "cat-shirts", "title": "Shirts"}]
            },
            {
                "id": 2, "documentId": "cap-doc", "title": "Cap", "price": 12.5,
                "desc": "", "type": "trending", "isNew": null,
                "img": [], "img2": [],
                "categories": [{"id": 2, "documentId": "cat-hats", "title": "Hats"}]
            }
        ],
        "meta": {"pagination": {"page": 1, "pageSize": 25, "pageCount": 1, "total": 2}}
    })
}

/// How the fake upstream answers product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamMode {
    Healthy,
    /// Every request fails with 500.
    Failing,
}

/// A running fake upstream, gateway and client.
pub struct TestContext {
    pub client: CatalogClient,
    pub gateway_url: Url,
    pub sleeper: RecordingSleeper,
    upstream_hits: Arc<AtomicUsize>,
}

impl TestContext {
    /// Start everything with a healthy upstream.
    pub async fn new() -> Self {
        Self::with_mode(UpstreamMode::Healthy).await
    }

    pub async fn with_mode(mode: UpstreamMode) -> Self {
        let upstream_hits = Arc::new(AtomicUsize::new(0));
        let upstream_url = serve(fake_upstream(mode, Arc::clone(&upstream_hits))).await;

        let config = GatewayConfig::from_lookup(|key| match key {
            "UPSTREAM_API_URL" => Some(upstream_url.to_string()),
            "UPSTREAM_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        })
        .expect("gateway config");

        let sleeper = RecordingSleeper::new();
        let state = AppState::with_sleeper(config, Arc::new(sleeper.clone())).expect("gateway state");
        let gateway_url = serve(shopfront_gateway::app(state)).await;

        let client = CatalogClient::new(gateway_url.as_str()).expect("catalog client");

        Self {
            client,
            gateway_url,
            sleeper,
            upstream_hits,
        }
    }

    /// Requests the fake upstream has received so far.
    #[must_use]
    pub fn upstream_hits(&self) -> usize {
        self.upstream_hits.load(Ordering::SeqCst)
    }

    /// Absolute gateway URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> Url {
        self.gateway_url.join(path).expect("gateway URL")
    }
}

async fn serve(app: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().expect("local address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/").parse().expect("loopback URL")
}

fn fake_upstream(mode: UpstreamMode, hits: Arc<AtomicUsize>) -> Router {
    let media_hits = Arc::clone(&hits);
    Router::new()
        .route(
            "/api/products",
            get(move |RawQuery(query): RawQuery| {
                hits.fetch_add(1, Ordering::SeqCst);
                async move {
                    if mode == UpstreamMode::Failing {
                        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
                    }
                    // The gateway always asks for expanded relations.
                    if !query.unwrap_or_default().contains("populate=") {
                        return (StatusCode::BAD_REQUEST, "populate missing").into_response();
                    }
                    axum::Json(sample_catalog()).into_response()
                }
            }),
        )
        .route(
            "/uploads/tee.png",
            get(move || {
                media_hits.fetch_add(1, Ordering::SeqCst);
                async { ([(header::CONTENT_TYPE, "image/png")], &b"\x89PNGtee"[..]).into_response() }
            }),
        )
}
