//! Order creation.
//!
//! Orders are acknowledged and logged only. There is no order store and
//! nothing is forwarded upstream; the generated ID exists so the storefront
//! can show a confirmation.

use axum::{Json, extract::rejection::JsonRejection, http::StatusCode};
use chrono::Utc;
use shopfront_core::{OrderResult, OrderSubmission, format_price};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Accept an order submission and return a fresh order ID.
#[instrument(skip_all, fields(order_id))]
pub async fn create(
    payload: std::result::Result<Json<OrderSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResult>)> {
    let Json(order) = payload.map_err(|rejection| {
        warn!(status = %rejection.status(), error = %rejection.body_text(), "Rejected order payload");
        AppError::BadRequest("Order payload is not a valid order".to_string())
    })?;

    if order.order_items.is_empty() {
        return Err(AppError::BadRequest(
            "Order must contain at least one item".to_string(),
        ));
    }

    let order_id = new_order_id();
    tracing::Span::current().record("order_id", order_id.as_str());

    info!(
        order_id = %order_id,
        received_at = %Utc::now().to_rfc3339(),
        customer = %order.customer_info.full_name,
        email = %order.customer_info.email,
        country = %order.customer_info.country,
        lines = order.order_items.len(),
        units = order.item_count(),
        total = %format_price(order.total_amount),
        "Order received"
    );
    debug!(order = ?order, "Order payload");

    Ok((
        StatusCode::CREATED,
        Json(OrderResult {
            success: true,
            order_id,
            message: "Order created successfully".to_string(),
        }),
    ))
}

fn new_order_id() -> String {
    format!("ORD-{}", Uuid::new_v4().simple()).to_uppercase()
}
