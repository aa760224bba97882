//! Shopfront client library.
//!
//! Everything the storefront needs on the customer's side of the gateway:
//!
//! - [`CatalogClient`]: cached product listings and derived views
//! - [`CartStore`]: the persisted cart and its notifications
//! - [`CheckoutFlow`]: form validation and order submission
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront_client::{CartStore, CatalogClient, CheckoutFlow, FileStorage};
//!
//! let catalog = CatalogClient::new("http://127.0.0.1:5000")?;
//! let mut cart = CartStore::new(FileStorage::in_dir(&data_dir));
//!
//! let tee = catalog.get_product("1").await?;
//! cart.add_to_cart(&tee, 2);
//!
//! let confirmation = CheckoutFlow::new(catalog).submit(&form, &mut cart).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;

pub use cart::{CartStorage, CartStore, FileStorage, MemoryStorage, Notification};
pub use catalog::CatalogClient;
pub use checkout::{CheckoutError, CheckoutFlow, Confirmation, OrderApi, ShippingForm};
pub use error::ClientError;
