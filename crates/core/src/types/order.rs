//! Order submission and confirmation payloads.
//!
//! These are the bodies exchanged on `POST /api/orders` between the checkout
//! flow and the gateway.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::CartItem;
use super::email::Email;

/// Customer contact and shipping details, already validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub full_name: String,
    pub email: Email,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
}

/// An order as submitted at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSubmission {
    pub customer_info: CustomerInfo,
    /// Snapshot of the cart at submission time.
    pub order_items: Vec<CartItem>,
    /// Cart total computed by the client.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

impl OrderSubmission {
    /// Build a submission from a cart snapshot, computing the total from the
    /// lines themselves.
    #[must_use]
    pub fn new(customer_info: CustomerInfo, order_items: Vec<CartItem>) -> Self {
        let total_amount = order_items.iter().map(CartItem::line_total).sum();
        Self {
            customer_info,
            order_items,
            total_amount,
        }
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.order_items
            .iter()
            .map(|item| u64::from(item.quantity))
            .sum()
    }
}

/// The gateway's answer to an order submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResult {
    pub success: bool,
    /// Server-assigned order identifier.
    pub order_id: String,
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ProductId;

    fn customer() -> CustomerInfo {
        CustomerInfo {
            full_name: "Jane Doe".to_string(),
            email: Email::parse("jane@example.com").unwrap(),
            address: "123 Main St".to_string(),
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
            country: "United States".to_string(),
            phone: "555-0100".to_string(),
        }
    }

    #[test]
    fn test_submission_total_and_count() {
        let items = vec![
            CartItem {
                id: ProductId::new(1),
                title: "Tee".to_string(),
                price: Decimal::new(20, 0),
                quantity: 2,
                img: None,
            },
            CartItem {
                id: ProductId::new(2),
                title: "Cap".to_string(),
                price: Decimal::new(1250, 2),
                quantity: 1,
                img: None,
            },
        ];
        let order = OrderSubmission::new(customer(), items);
        assert_eq!(order.total_amount, Decimal::new(5250, 2));
        assert_eq!(order.item_count(), 3);
    }

    #[test]
    fn test_submission_wire_names() {
        let order = OrderSubmission::new(customer(), Vec::new());
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["customerInfo"]["fullName"], "Jane Doe");
        assert_eq!(json["customerInfo"]["postalCode"], "12345");
        assert!(json["orderItems"].as_array().unwrap().is_empty());
        assert!(json.get("totalAmount").is_some());
    }

    #[test]
    fn test_order_result_wire_names() {
        let result: OrderResult = serde_json::from_str(
            r#"{"success": true, "orderId": "ORD-1", "message": "Order created successfully"}"#,
        )
        .unwrap();
        assert!(result.success);
        assert_eq!(result.order_id, "ORD-1");
    }
}
