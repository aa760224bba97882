//! HTTP client for the gateway's catalog and order endpoints.
//!
//! Listings are cached with `moka` for five minutes. Concurrent identical
//! fetches are not coalesced; the last response to arrive wins the cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use shopfront_core::{Image, OrderResult, OrderSubmission, Product, ProductList, ProductType};
use tracing::{debug, instrument};
use url::Url;

use crate::checkout::OrderApi;
use crate::error::{ClientError, Result};

/// Cache key for listing responses: the query string sent with the request.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Products(Option<String>),
}

/// Client for the gateway API.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    http: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, Arc<ProductList>>,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Client for the gateway at `base_url` (e.g. `http://127.0.0.1:5000`).
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid absolute URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self::with_http(base_url, reqwest::Client::new()))
    }

    /// Client using a preconfigured `reqwest::Client`.
    #[must_use]
    pub fn with_http(base_url: Url, http: reqwest::Client) -> Self {
        let cache = Cache::builder()
            .max_capacity(100)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                http,
                base_url,
                cache,
            }),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Absolute URL for an image, or an empty string without one.
    #[must_use]
    pub fn image_url(&self, image: Option<&Image>) -> String {
        shopfront_core::image_url(self.inner.base_url.as_str(), image)
    }

    /// Drop every cached listing.
    pub fn invalidate(&self) {
        self.inner.cache.invalidate_all();
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// All products, relations expanded.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a listing.
    pub async fn list_products(&self) -> Result<Arc<ProductList>> {
        self.list_products_query(None).await
    }

    /// Products matching an upstream filter query (e.g. `filters[type][$eq]=featured`).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a listing.
    #[instrument(skip(self))]
    pub async fn list_products_query(&self, query: Option<&str>) -> Result<Arc<ProductList>> {
        let key = CacheKey::Products(query.map(str::to_string));
        if let Some(listing) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product listing");
            return Ok(listing);
        }

        let mut url = self.inner.base_url.join("api/products")?;
        url.set_query(query);

        let listing: ProductList = self.get_json(url).await?;
        let listing = Arc::new(listing);
        self.inner.cache.insert(key, Arc::clone(&listing)).await;
        Ok(listing)
    }

    /// One product by numeric ID or document key.
    ///
    /// Served from the cached full listing when it is present.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if no product matches.
    #[instrument(skip(self))]
    pub async fn get_product(&self, key: &str) -> Result<Product> {
        if let Some(listing) = self.inner.cache.get(&CacheKey::Products(None)).await
            && let Some(product) = listing.data.iter().find(|p| p.matches_key(key))
        {
            debug!("Cache hit for product");
            return Ok(product.clone());
        }

        let url = self.product_url(key)?;
        let listing: ProductList = self.get_json(url).await?;
        listing
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::NotFound(format!("product {key}")))
    }

    /// Products tagged `featured`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched.
    pub async fn featured(&self) -> Result<Vec<Product>> {
        Ok(of_type(&self.list_products().await?.data, &ProductType::Featured))
    }

    /// Products tagged `trending`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched.
    pub async fn trending(&self) -> Result<Vec<Product>> {
        Ok(of_type(&self.list_products().await?.data, &ProductType::Trending))
    }

    /// Products in `category`, or every product when `category` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched.
    pub async fn filtered(&self, category: Option<&str>) -> Result<Vec<Product>> {
        Ok(in_category(&self.list_products().await?.data, category))
    }

    /// Category titles across all products.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be fetched.
    pub async fn categories(&self) -> Result<Vec<String>> {
        Ok(category_titles(&self.list_products().await?.data))
    }

    // =========================================================================
    // HTTP helpers
    // =========================================================================

    /// `api/products/{key}`, with the key encoded as one path segment.
    fn product_url(&self, key: &str) -> Result<Url> {
        let mut url = self.inner.base_url.join("api/products")?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(key);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.inner.http.get(url).send().await?;
        let body = success_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl OrderApi for CatalogClient {
    #[instrument(skip_all, fields(lines = order.order_items.len()))]
    async fn create_order(&self, order: &OrderSubmission) -> Result<OrderResult> {
        let url = self.inner.base_url.join("api/orders")?;
        let response = self.inner.http.post(url).json(order).send().await?;
        let body = success_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Gateway error body.
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Read the body of a successful response, mapping failures to errors.
async fn success_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    let path = response.url().path().to_string();
    let body = response.text().await?;

    if status == reqwest::StatusCode::NOT_FOUND {
        let message = serde_json::from_str::<ErrorBody>(&body).map_or(path, |e| e.message);
        return Err(ClientError::NotFound(message));
    }
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map_or_else(|_| body.chars().take(200).collect(), |e| e.message);
        return Err(ClientError::Status { status, message });
    }
    Ok(body)
}

// =============================================================================
// Derived views
// =============================================================================

fn of_type(products: &[Product], tag: &ProductType) -> Vec<Product> {
    products
        .iter()
        .filter(|p| &p.product_type == tag)
        .cloned()
        .collect()
}

/// Products in `category`; all of them when no category is selected.
#[must_use]
pub fn in_category(products: &[Product], category: Option<&str>) -> Vec<Product> {
    match category {
        None => products.to_vec(),
        Some(title) => products
            .iter()
            .filter(|p| p.in_category(title))
            .cloned()
            .collect(),
    }
}

/// Unique category titles in first-seen order.
#[must_use]
pub fn category_titles(products: &[Product]) -> Vec<String> {
    let mut titles: Vec<String> = Vec::new();
    for category in products.iter().flat_map(|p| &p.categories) {
        if !titles.contains(&category.title) {
            titles.push(category.title.clone());
        }
    }
    titles
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::extract::{Path, RawQuery};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use rust_decimal::Decimal;
    use serde_json::{Value, json};
    use shopfront_core::{CustomerInfo, Email, ProductId};

    use super::*;

    fn catalog() -> Value {
        json!({
            "data": [
                {"id": 1, "documentId": "tee", "title": "Tee", "price": 20, "type": "featured",
                 "categories": [{"id": 1, "documentId": "c1", "title": "Shirts"}]},
                {"id": 2, "documentId": "cap", "title": "Cap", "price": 12.5, "type": "trending",
                 "categories": [{"id": 2, "documentId": "c2", "title": "Hats"},
                                {"id": 1, "documentId": "c1", "title": "Shirts"}]},
                {"id": 3, "documentId": "mug", "title": "Mug", "price": 9, "type": null,
                 "categories": null}
            ],
            "meta": {"pagination": {"page": 1, "pageSize": 25, "pageCount": 1, "total": 3}}
        })
    }

    async fn spawn(router: Router) -> CatalogClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        CatalogClient::new(&format!("http://{addr}")).unwrap()
    }

    fn counting_gateway(hits: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/api/products",
                get(move |RawQuery(query): RawQuery| {
                    hits.fetch_add(1, Ordering::SeqCst);
                    async move {
                        match query.as_deref() {
                            Some("filters[type][$eq]=featured") => {
                                let mut body = catalog();
                                body["data"].as_array_mut().unwrap().truncate(1);
                                Json(body)
                            }
                            _ => Json(catalog()),
                        }
                    }
                }),
            )
            .route(
                "/api/products/{id}",
                get(|Path(id): Path<String>| async move {
                    if id == "2" {
                        Ok(Json(json!({"data": [catalog()["data"][1].clone()], "meta": {}})))
                    } else {
                        Err((
                            StatusCode::NOT_FOUND,
                            Json(json!({"error": "Not found", "message": format!("Product with id {id} not found")})),
                        ))
                    }
                }),
            )
    }

    #[test]
    fn test_category_titles_unique_in_first_seen_order() {
        let listing: ProductList = serde_json::from_value(catalog()).unwrap();
        assert_eq!(category_titles(&listing.data), vec!["Shirts", "Hats"]);
    }

    #[test]
    fn test_in_category() {
        let listing: ProductList = serde_json::from_value(catalog()).unwrap();
        assert_eq!(in_category(&listing.data, None).len(), 3);
        let hats = in_category(&listing.data, Some("Hats"));
        assert_eq!(hats.len(), 1);
        assert_eq!(hats[0].title, "Cap");
        assert!(in_category(&listing.data, Some("Shoes")).is_empty());
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = CatalogClient::new("http://localhost:5000/shop").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:5000/shop/");
        assert!(matches!(
            CatalogClient::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_derived_views_share_cached_listing() {
        let hits = Arc::new(AtomicUsize::new(0));
        let client = spawn(counting_gateway(Arc::clone(&hits))).await;

        let featured = client.featured().await.unwrap();
        let trending = client.trending().await.unwrap();
        let categories = client.categories().await.unwrap();

        assert_eq!(featured[0].title, "Tee");
        assert_eq!(trending[0].title, "Cap");
        assert_eq!(categories, vec!["Shirts", "Hats"]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        client.invalidate();
        client.list_products().await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_query_is_forwarded_and_cached_separately() {
        let hits = Arc::new(AtomicUsize::new(0));
        let client = spawn(counting_gateway(Arc::clone(&hits))).await;

        let filtered = client
            .list_products_query(Some("filters[type][$eq]=featured"))
            .await
            .unwrap();
        let all = client.list_products().await.unwrap();

        assert_eq!(filtered.data.len(), 1);
        assert_eq!(all.data.len(), 3);
        assert_eq!(all.meta.pagination.unwrap().total, 3);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_product_uses_cache_then_network() {
        let hits = Arc::new(AtomicUsize::new(0));
        let client = spawn(counting_gateway(Arc::clone(&hits))).await;

        let cap = client.get_product("2").await.unwrap();
        assert_eq!(cap.id, ProductId::new(2));

        client.list_products().await.unwrap();
        let mug = client.get_product("mug").await.unwrap();
        assert_eq!(mug.title, "Mug");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_missing_product_is_not_found() {
        let client = spawn(counting_gateway(Arc::new(AtomicUsize::new(0)))).await;
        let err = client.get_product("404404").await.unwrap_err();
        let ClientError::NotFound(message) = err else {
            panic!("expected not found, got {err:?}");
        };
        assert_eq!(message, "Product with id 404404 not found");
    }

    #[test]
    fn test_product_key_stays_one_path_segment() {
        let client = CatalogClient::new("http://127.0.0.1:5000/shop").unwrap();

        let url = client.product_url("http://other-host/x").unwrap();
        assert_eq!(url.host_str(), Some("127.0.0.1"));
        assert_eq!(url.path(), "/shop/api/products/http:%2F%2Fother-host%2Fx");

        let url = client.product_url("../orders").unwrap();
        assert_eq!(url.path(), "/shop/api/products/..%2Forders");

        let url = client.product_url("foo:bar").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.path(), "/shop/api/products/foo:bar");
    }

    #[tokio::test]
    async fn test_odd_product_key_reaches_product_route() {
        let client = spawn(counting_gateway(Arc::new(AtomicUsize::new(0)))).await;
        let err = client.get_product("../orders").await.unwrap_err();
        let ClientError::NotFound(message) = err else {
            panic!("expected not found, got {err:?}");
        };
        assert_eq!(message, "Product with id ../orders not found");
    }

    #[tokio::test]
    async fn test_server_error_carries_message() {
        let router = Router::new().route(
            "/api/products",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Failed", "message": "Please try again later."})),
                )
            }),
        );
        let client = spawn(router).await;

        let err = client.list_products().await.unwrap_err();
        let ClientError::Status { status, message } = err else {
            panic!("expected status error");
        };
        assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Please try again later.");
    }

    #[tokio::test]
    async fn test_create_order_posts_submission() {
        let router = Router::new().route(
            "/api/orders",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["customerInfo"]["fullName"], "Jane Doe");
                assert_eq!(body["totalAmount"], 20.0);
                (
                    StatusCode::CREATED,
                    Json(json!({"success": true, "orderId": "ORD-1", "message": "Order created successfully"})),
                )
            }),
        );
        let client = spawn(router).await;
        let listing: ProductList = serde_json::from_value(catalog()).unwrap();
        let order = OrderSubmission::new(
            CustomerInfo {
                full_name: "Jane Doe".to_string(),
                email: Email::parse("jane@example.com").unwrap(),
                address: "123 Main St".to_string(),
                city: "Springfield".to_string(),
                postal_code: "12345".to_string(),
                country: "US".to_string(),
                phone: "555-0100".to_string(),
            },
            vec![shopfront_core::CartItem::from_product(&listing.data[0], 1)],
        );
        assert_eq!(order.total_amount, Decimal::new(20, 0));

        let result = client.create_order(&order).await.unwrap();
        assert!(result.success);
        assert_eq!(result.order_id, "ORD-1");
    }

    #[test]
    fn test_image_url_uses_base() {
        let client = CatalogClient::new("http://localhost:5000").unwrap();
        assert_eq!(client.image_url(None), "");
    }
}
