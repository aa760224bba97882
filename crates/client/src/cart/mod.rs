//! The shopping cart store.
//!
//! `CartStore` is the single owner of cart state. Consumers are handed the
//! store explicitly; there is no global cart. Every mutation writes the full
//! cart back to the injected [`CartStorage`] under [`CART_STORAGE_KEY`].
//!
//! Invariants kept by every operation:
//! - no two lines share a product ID
//! - no line has a quantity of zero

mod notification;
mod storage;

pub use notification::{NOTIFICATION_DURATION, Notification, NotificationTimer};
pub use storage::{CartStorage, FileStorage, MemoryStorage, StorageError};

use rust_decimal::Decimal;
use shopfront_core::{CartItem, Product, ProductId};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

/// Storage key of the persisted cart (a JSON array of cart lines).
pub const CART_STORAGE_KEY: &str = "cart";

/// Cart state plus its persistence and notification side effects.
#[derive(Debug)]
pub struct CartStore<S: CartStorage> {
    items: Vec<CartItem>,
    is_open: bool,
    storage: S,
    notifications: NotificationTimer,
}

impl<S: CartStorage> CartStore<S> {
    /// Open the cart persisted in `storage`, or an empty one.
    ///
    /// Unreadable or malformed data is discarded with a warning.
    pub fn new(storage: S) -> Self {
        Self::with_timer(storage, NotificationTimer::default())
    }

    /// Like [`CartStore::new`] with a custom notification timer.
    pub fn with_timer(storage: S, notifications: NotificationTimer) -> Self {
        let items = load_items(&storage);
        Self {
            items,
            is_open: false,
            storage,
            notifications,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` units of `product`, merging with an existing line.
    ///
    /// A quantity of zero changes nothing.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_to_cart(&mut self, product: &Product, quantity: u32) {
        if quantity == 0 {
            debug!("ignoring add with zero quantity");
            return;
        }

        match self.items.iter_mut().find(|item| item.id == product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => self.items.push(CartItem::from_product(product, quantity)),
        }

        self.persist();
        self.notifications
            .show(format!("{} added to cart!", product.title));
    }

    /// Remove the line for `id`. Unknown IDs are ignored.
    #[instrument(skip(self))]
    pub fn remove_from_cart(&mut self, id: ProductId) {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        if self.items.len() != before {
            self.persist();
        }
    }

    /// Set the quantity of the line for `id`.
    ///
    /// Zero or negative quantities remove the line. Unknown IDs are ignored.
    #[instrument(skip(self))]
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_from_cart(id);
            return;
        }

        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            debug!("no cart line to update");
            return;
        };
        item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.persist();
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub fn clear_cart(&mut self) {
        self.items.clear();
        self.persist();
        self.notifications.show("Cart has been cleared");
    }

    // =========================================================================
    // Cart panel
    // =========================================================================

    pub const fn toggle_cart(&mut self) {
        self.is_open = !self.is_open;
    }

    pub const fn open_cart(&mut self) {
        self.is_open = true;
    }

    pub const fn close_cart(&mut self) {
        self.is_open = false;
    }

    #[must_use]
    pub const fn is_cart_open(&self) -> bool {
        self.is_open
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Total number of units in the cart.
    #[must_use]
    pub fn cart_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Cart lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn item(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The notification currently visible, if any.
    #[must_use]
    pub fn notification(&self) -> Option<Notification> {
        self.notifications.current()
    }

    /// Watch notifications as they appear and clear.
    #[must_use]
    pub fn subscribe_notifications(&self) -> watch::Receiver<Option<Notification>> {
        self.notifications.subscribe()
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Give up the store, keeping its storage backend.
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn persist(&mut self) {
        let json = match serde_json::to_string(&self.items) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize cart");
                return;
            }
        };
        if let Err(e) = self.storage.set(CART_STORAGE_KEY, &json) {
            warn!(error = %e, "failed to persist cart");
        }
    }
}

/// Read the persisted cart, repairing what can be repaired.
fn load_items<S: CartStorage>(storage: &S) -> Vec<CartItem> {
    let raw = match storage.get(CART_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, "failed to read persisted cart, starting empty");
            return Vec::new();
        }
    };

    let stored: Vec<CartItem> = match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "discarding malformed persisted cart");
            return Vec::new();
        }
    };

    let mut items: Vec<CartItem> = Vec::with_capacity(stored.len());
    for item in stored {
        if item.quantity == 0 {
            warn!(product_id = %item.id, "dropping persisted cart line with zero quantity");
            continue;
        }
        match items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => {
                warn!(product_id = %item.id, "merging duplicate persisted cart line");
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            }
            None => items.push(item),
        }
    }

    debug!(lines = items.len(), "persisted cart loaded");
    items
}
