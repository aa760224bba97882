//! Cart line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::line_total;
use super::product::{Image, Product};

/// One line of the shopping cart.
///
/// A snapshot of the product taken when it was added; later catalog edits do
/// not flow into existing cart lines. The JSON shape is also the persisted
/// cart format, so field names must stay stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product this line was created from. Unique within a cart.
    pub id: ProductId,
    pub title: String,
    /// Unit price at the time the product was added.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Always at least 1 inside a cart.
    pub quantity: u32,
    /// Representative image (the product's first front-view image).
    #[serde(default)]
    pub img: Option<Image>,
}

impl CartItem {
    /// Snapshot `product` into a new cart line.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            quantity,
            img: product.primary_image().cloned(),
        }
    }

    /// `price * quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        line_total(self.price, self.quantity)
    }
}
