//! Cart commands. The cart lives in the data directory between runs.

use shopfront_client::{CartStorage, CartStore, CatalogClient, ClientError};
use shopfront_core::{ProductId, format_price};
use tracing::info;

/// Cart contents as display lines, ending with the total.
pub fn cart_lines<S: CartStorage>(cart: &CartStore<S>) -> Vec<String> {
    if cart.is_empty() {
        return vec!["Your cart is empty.".to_string()];
    }

    let mut lines: Vec<String> = cart
        .items()
        .iter()
        .map(|item| {
            format!(
                "#{:<4} {:<32} {:>3} x {:>10} = {:>10}",
                item.id.to_string(),
                item.title,
                item.quantity,
                format_price(item.price),
                format_price(item.line_total())
            )
        })
        .collect();
    lines.push(format!(
        "{} item(s), total {}",
        cart.cart_count(),
        format_price(cart.cart_total())
    ));
    lines
}

fn announce<S: CartStorage>(cart: &CartStore<S>) {
    if let Some(notification) = cart.notification() {
        info!("{}", notification.message);
    }
}

pub fn show<S: CartStorage>(cart: &CartStore<S>) {
    for line in cart_lines(cart) {
        info!("{line}");
    }
}

/// Look up a product and add it to the cart.
pub async fn add<S: CartStorage>(
    catalog: &CatalogClient,
    cart: &mut CartStore<S>,
    id: &str,
    quantity: u32,
) -> Result<(), ClientError> {
    let product = catalog.get_product(id).await?;
    cart.add_to_cart(&product, quantity);
    announce(cart);
    show(cart);
    Ok(())
}

pub fn remove<S: CartStorage>(cart: &mut CartStore<S>, id: ProductId) {
    if cart.item(id).is_none() {
        info!("Product {id} is not in the cart.");
        return;
    }
    cart.remove_from_cart(id);
    show(cart);
}

pub fn update<S: CartStorage>(cart: &mut CartStore<S>, id: ProductId, quantity: i64) {
    if cart.item(id).is_none() {
        info!("Product {id} is not in the cart.");
        return;
    }
    cart.update_quantity(id, quantity);
    show(cart);
}

pub fn clear<S: CartStorage>(cart: &mut CartStore<S>) {
    cart.clear_cart();
    announce(cart);
}
