//! Gateway behavior when things go wrong, seen from outside.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use shopfront_client::{CartStore, CheckoutError, CheckoutFlow, ClientError, MemoryStorage, ShippingForm};
use shopfront_integration_tests::{TestContext, UpstreamMode};

#[tokio::test]
async fn test_missing_product_is_404_with_body() {
    let ctx = TestContext::new().await;

    let resp = reqwest::get(ctx.url("api/products/999")).await.expect("request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(resp.headers().contains_key("x-request-id"));

    let body: Value = resp.json().await.expect("json body");
    assert!(body["error"].is_string());
    assert!(body["message"].is_string());

    let err = ctx.client.get_product("999").await.expect_err("not found");
    assert!(matches!(err, ClientError::NotFound(_)));
    assert!(ctx.sleeper.delays().is_empty());
}

#[tokio::test]
async fn test_upstream_failure_exhausts_retries() {
    let ctx = TestContext::with_mode(UpstreamMode::Failing).await;

    let resp = reqwest::get(ctx.url("api/products")).await.expect("request");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.expect("json body");
    assert!(body["error"].is_string());
    assert!(body["message"].is_string());

    assert_eq!(ctx.upstream_hits(), 3);
    assert_eq!(
        ctx.sleeper.delays(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
}

#[tokio::test]
async fn test_client_sees_status_error_on_upstream_failure() {
    let ctx = TestContext::with_mode(UpstreamMode::Failing).await;

    let err = ctx.client.list_products().await.expect_err("failure");
    let ClientError::Status { status, .. } = err else {
        panic!("expected status error, got {err:?}");
    };
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_media_is_proxied() {
    let ctx = TestContext::new().await;

    let resp = reqwest::get(ctx.url("uploads/tee.png")).await.expect("request");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "image/png");
    assert_eq!(&resp.bytes().await.expect("bytes")[..], b"\x89PNGtee");
}

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::with_mode(UpstreamMode::Failing).await;

    let resp = reqwest::get(ctx.url("health")).await.expect("request");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("text"), "ok");
    assert_eq!(ctx.upstream_hits(), 0);
}

#[tokio::test]
async fn test_empty_cart_checkout_makes_no_request() {
    let ctx = TestContext::new().await;
    let mut cart = CartStore::new(MemoryStorage::new());
    let form = ShippingForm {
        full_name: "Al".to_string(),
        email: "al@example.com".to_string(),
        address: "1 Long Road".to_string(),
        city: "Leeds".to_string(),
        postal_code: "LS1".to_string(),
        country: "UK".to_string(),
        phone: "01130000".to_string(),
    };

    let err = CheckoutFlow::new(ctx.client.clone())
        .submit(&form, &mut cart)
        .await
        .expect_err("empty cart");

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(ctx.upstream_hits(), 0);
}
