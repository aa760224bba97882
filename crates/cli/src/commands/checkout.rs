//! The checkout command.

use shopfront_client::checkout::Field;
use shopfront_client::{
    CartStorage, CartStore, CatalogClient, CheckoutError, CheckoutFlow, ShippingForm,
};
use shopfront_core::format_price;
use tracing::{error, info};

/// Submit the cart as an order, reporting every form problem at once.
pub async fn checkout<S: CartStorage>(
    catalog: CatalogClient,
    cart: &mut CartStore<S>,
    form: &ShippingForm,
) -> Result<(), CheckoutError> {
    let total = cart.cart_total();
    let count = cart.cart_count();

    info!("Placing order...");
    match CheckoutFlow::new(catalog).submit(form, cart).await {
        Ok(confirmation) => {
            info!("Order placed successfully! Thank you for your purchase.");
            info!("Order ID: {}", confirmation.order_id);
            info!("{count} item(s), total {}", format_price(total));
            Ok(())
        }
        Err(CheckoutError::Invalid(errors)) => {
            for (field, message) in errors.iter() {
                error!("{}: {message}", flag(field));
            }
            Err(CheckoutError::Invalid(errors))
        }
        Err(e) => Err(e),
    }
}

/// Command-line flag that supplies `field`.
const fn flag(field: Field) -> &'static str {
    match field {
        Field::FullName => "--full-name",
        Field::Email => "--email",
        Field::Address => "--address",
        Field::City => "--city",
        Field::PostalCode => "--postal-code",
        Field::Country => "--country",
        Field::Phone => "--phone",
    }
}
