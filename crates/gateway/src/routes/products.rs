//! Product route handlers.
//!
//! Listings are passed through from upstream verbatim. Single-product lookup
//! fetches the whole collection and picks the matching entry, because the
//! upstream offers no confirmed by-id query for both numeric IDs and
//! document keys.

use axum::{
    Json,
    extract::{Path, RawQuery, State},
};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// List products with relations expanded.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>, RawQuery(query): RawQuery) -> Result<Json<Value>> {
    let listing = state
        .upstream()
        .list_products(query.as_deref())
        .await
        .map_err(|e| AppError::upstream("Failed to fetch products from upstream API", e))?;

    Ok(Json(listing))
}

/// Fetch one product by numeric ID or document key.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    let listing = state
        .upstream()
        .list_products(None)
        .await
        .map_err(|e| AppError::upstream("Failed to fetch product from upstream API", e))?;

    let product = find_product(&listing, &id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Product with id {id} not found")))?;

    debug!(%id, "product found");
    Ok(Json(json!({ "data": [product], "meta": {} })))
}

/// Locate the entry in `listing.data` whose `id` or `documentId` equals `key`.
fn find_product<'a>(listing: &'a Value, key: &str) -> Option<&'a Value> {
    listing
        .get("data")?
        .as_array()?
        .iter()
        .find(|product| matches_key(product, key))
}

fn matches_key(product: &Value, key: &str) -> bool {
    let by_id = match product.get("id") {
        Some(Value::Number(n)) => n.to_string() == key,
        Some(Value::String(s)) => s == key,
        _ => false,
    };
    by_id
        || product
            .get("documentId")
            .and_then(Value::as_str)
            .is_some_and(|doc| !doc.is_empty() && doc == key)
}
