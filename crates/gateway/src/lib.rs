//! Shopfront Gateway library.
//!
//! The gateway sits between the storefront and the upstream catalog API. It
//! hides upstream credentials and cross-origin restrictions from the browser,
//! retries flaky upstream reads with exponential backoff, proxies uploaded
//! media, and acknowledges order submissions.
//!
//! The crate is a library so the router can be exercised in tests and
//! embedded; `main.rs` only adds process concerns (telemetry and signals).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod upstream;

#[cfg(test)]
mod test_support;

pub use config::GatewayConfig;
pub use routes::app;
pub use state::AppState;
