//! Core types for Shopfront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod product;

pub use cart::CartItem;
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{CustomerInfo, OrderResult, OrderSubmission};
pub use price::{format_price, line_total};
pub use product::{
    Category, Image, ImageFormat, ImageFormats, Meta, Pagination, Product, ProductList,
    ProductType, image_url,
};
