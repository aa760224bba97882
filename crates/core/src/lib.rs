//! Shopfront Core - Shared types library.
//!
//! This crate provides the domain types used across all Shopfront components:
//! - `gateway` - Proxy between the storefront and the upstream catalog API
//! - `client` - Catalog client, cart store and checkout flow
//! - `cli` - Terminal storefront built on the client
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients. The wire shapes mirror the upstream catalog API (camelCase JSON)
//! so the same types decode upstream responses, persisted carts and order
//! submissions.
//!
//! # Modules
//!
//! - [`types`] - Product, cart and order types, plus IDs, emails and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
