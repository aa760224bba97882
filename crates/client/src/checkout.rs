//! Checkout: shipping-form validation and order submission.
//!
//! A submission goes through these steps, in order:
//! 1. reject if another submission is in flight
//! 2. validate every form field, reporting all violations together
//! 3. reject an empty cart
//! 4. send the order, then clear the cart on success
//!
//! Steps 1-3 never touch the network.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use shopfront_core::{CustomerInfo, Email, OrderResult, OrderSubmission};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::cart::{CartStorage, CartStore};
use crate::error::ClientError;

/// Where the storefront navigates after a successful order.
pub const AFTER_ORDER_REDIRECT: &str = "/";

// =============================================================================
// Form
// =============================================================================

/// Raw shipping-form input, as typed by the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingForm {
    pub full_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
}

/// A shipping-form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    FullName,
    Email,
    Address,
    City,
    PostalCode,
    Country,
    Phone,
}

impl Field {
    /// Wire name of the field, as used in `customerInfo`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FullName => "fullName",
            Self::Email => "email",
            Self::Address => "address",
            Self::City => "city",
            Self::PostalCode => "postalCode",
            Self::Country => "country",
            Self::Phone => "phone",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<Field, &'static str>,
}

impl ValidationErrors {
    /// Message for `field`, if it failed validation.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.fields.get(&field).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Failed fields in form order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.fields.iter().map(|(field, message)| (*field, *message))
    }

    fn check(&mut self, field: Field, ok: bool, message: &'static str) {
        if !ok {
            self.fields.insert(field, message);
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (_, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(message)?;
            first = false;
        }
        Ok(())
    }
}

fn min_chars(value: &str, min: usize) -> bool {
    value.trim().chars().count() >= min
}

impl ShippingForm {
    /// Check every field and build the customer details.
    ///
    /// # Errors
    ///
    /// Returns every failing field with its message.
    pub fn validate(&self) -> Result<CustomerInfo, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let email = Email::parse(&self.email).ok();

        errors.check(
            Field::FullName,
            min_chars(&self.full_name, 2),
            "Full name must be at least 2 characters",
        );
        errors.check(
            Field::Email,
            email.is_some(),
            "Please enter a valid email address",
        );
        errors.check(
            Field::Address,
            min_chars(&self.address, 5),
            "Address must be at least 5 characters",
        );
        errors.check(Field::City, min_chars(&self.city, 2), "City is required");
        errors.check(
            Field::PostalCode,
            min_chars(&self.postal_code, 3),
            "Postal code is required",
        );
        errors.check(
            Field::Country,
            min_chars(&self.country, 2),
            "Country is required",
        );
        errors.check(
            Field::Phone,
            min_chars(&self.phone, 5),
            "Phone number is required",
        );

        match email {
            Some(email) if errors.is_empty() => Ok(CustomerInfo {
                full_name: self.full_name.trim().to_string(),
                email,
                address: self.address.trim().to_string(),
                city: self.city.trim().to_string(),
                postal_code: self.postal_code.trim().to_string(),
                country: self.country.trim().to_string(),
                phone: self.phone.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Submission
// =============================================================================

/// Order creation endpoint.
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// Create an order and return the server's acknowledgement.
    async fn create_order(&self, order: &OrderSubmission) -> Result<OrderResult, ClientError>;
}

#[async_trait]
impl<T: OrderApi + ?Sized> OrderApi for Arc<T> {
    async fn create_order(&self, order: &OrderSubmission) -> Result<OrderResult, ClientError> {
        (**self).create_order(order).await
    }
}

/// What the customer sees after a successful order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub order_id: String,
    pub message: String,
    /// Navigation target once the confirmation is shown.
    pub redirect: &'static str,
}

/// Reasons a checkout did not produce an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty - please add items to your cart before checking out.")]
    EmptyCart,

    #[error("{0}")]
    Invalid(ValidationErrors),

    #[error("An order is already being placed.")]
    InFlight,

    #[error("Failed to place order. Please try again later.")]
    Submit(#[source] ClientError),
}

/// Drives order submission for one storefront session.
#[derive(Debug)]
pub struct CheckoutFlow<A> {
    api: A,
    in_flight: AtomicBool,
}

impl<A: OrderApi> CheckoutFlow<A> {
    pub const fn new(api: A) -> Self {
        Self {
            api,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a submission is currently waiting on the network.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Validate `form` and place an order for everything in `cart`.
    ///
    /// The cart is cleared only when the order was accepted.
    ///
    /// # Errors
    ///
    /// See [`CheckoutError`]. On any error the cart is unchanged.
    #[instrument(skip_all, fields(lines = cart.items().len()))]
    pub async fn submit<S: CartStorage>(
        &self,
        form: &ShippingForm,
        cart: &mut CartStore<S>,
    ) -> Result<Confirmation, CheckoutError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(CheckoutError::InFlight)?;

        let customer = form.validate().map_err(CheckoutError::Invalid)?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let order = OrderSubmission::new(customer, cart.items().to_vec());
        let result = self.api.create_order(&order).await.map_err(|e| {
            warn!(error = %e, "order submission failed");
            CheckoutError::Submit(e)
        })?;

        if !result.success {
            warn!(message = %result.message, "order rejected");
            return Err(CheckoutError::Submit(ClientError::Status {
                status: reqwest::StatusCode::UNPROCESSABLE_ENTITY,
                message: result.message,
            }));
        }

        info!(order_id = %result.order_id, "order placed");
        cart.clear_cart();

        Ok(Confirmation {
            order_id: result.order_id,
            message: result.message,
            redirect: AFTER_ORDER_REDIRECT,
        })
    }
}

/// Holds the in-flight flag for the duration of one submission.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use rust_decimal::Decimal;
    use shopfront_core::{Product, ProductId, ProductType};
    use tokio::sync::Notify;

    use super::*;
    use crate::cart::MemoryStorage;

    fn valid_form() -> ShippingForm {
        ShippingForm {
            full_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            address: "123 Main St".to_string(),
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
            country: "US".to_string(),
            phone: "555-0100".to_string(),
        }
    }

    fn tee() -> Product {
        Product {
            id: ProductId::new(1),
            document_id: "tee-doc".to_string(),
            title: "Tee".to_string(),
            price: Decimal::new(20, 0),
            desc: String::new(),
            product_type: ProductType::Featured,
            is_new: Some(true),
            img: Vec::new(),
            img2: Vec::new(),
            categories: Vec::new(),
            created_at: None,
            updated_at: None,
            published_at: None,
        }
    }

    /// Records submissions and answers with a canned result.
    #[derive(Default)]
    struct FakeOrders {
        calls: AtomicUsize,
        submitted: Mutex<Vec<OrderSubmission>>,
        fail: bool,
    }

    #[async_trait]
    impl OrderApi for FakeOrders {
        async fn create_order(&self, order: &OrderSubmission) -> Result<OrderResult, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.submitted.lock().unwrap().push(order.clone());
            if self.fail {
                return Err(ClientError::Status {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                    message: "down".to_string(),
                });
            }
            Ok(OrderResult {
                success: true,
                order_id: "ORD-TEST".to_string(),
                message: "Order created successfully".to_string(),
            })
        }
    }

    #[test]
    fn test_valid_form_passes() {
        let customer = valid_form().validate().unwrap();
        assert_eq!(customer.full_name, "Jane Doe");
        assert_eq!(customer.email.as_str(), "jane@example.com");
    }

    #[test]
    fn test_full_name_length() {
        let mut form = valid_form();
        form.full_name = "A".to_string();
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.get(Field::FullName),
            Some("Full name must be at least 2 characters")
        );

        form.full_name = "Al".to_string();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_lengths_count_trimmed_chars() {
        let mut form = valid_form();
        form.full_name = "  A  ".to_string();
        assert!(form.validate().unwrap_err().get(Field::FullName).is_some());

        form.full_name = "Zoë".to_string();
        form.city = "Łó".to_string();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_all_violations_reported_together() {
        let errors = ShippingForm::default().validate().unwrap_err();
        assert_eq!(errors.len(), 7);
        assert_eq!(errors.get(Field::Email), Some("Please enter a valid email address"));
        assert_eq!(errors.get(Field::Address), Some("Address must be at least 5 characters"));
        assert_eq!(errors.get(Field::City), Some("City is required"));
        assert_eq!(errors.get(Field::PostalCode), Some("Postal code is required"));
        assert_eq!(errors.get(Field::Country), Some("Country is required"));
        assert_eq!(errors.get(Field::Phone), Some("Phone number is required"));
        assert_eq!(errors.iter().next().unwrap().0, Field::FullName);
    }

    #[test]
    fn test_email_shapes() {
        for bad in ["jane", "jane@", "@example.com", "jane@example", "ja ne@example.com"] {
            let mut form = valid_form();
            form.email = bad.to_string();
            assert!(
                form.validate().unwrap_err().get(Field::Email).is_some(),
                "{bad} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_empty_cart_never_calls_network() {
        let api = Arc::new(FakeOrders::default());
        let flow = CheckoutFlow::new(Arc::clone(&api));
        let mut cart = CartStore::new(MemoryStorage::new());

        let err = flow.submit(&valid_form(), &mut cart).await.unwrap_err();

        assert!(matches!(err, CheckoutError::EmptyCart));
        assert_eq!(
            err.to_string(),
            "Cart is empty - please add items to your cart before checking out."
        );
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_form_never_calls_network() {
        let api = Arc::new(FakeOrders::default());
        let flow = CheckoutFlow::new(Arc::clone(&api));
        let mut cart = CartStore::new(MemoryStorage::new());
        cart.add_to_cart(&tee(), 1);
        let mut form = valid_form();
        form.phone = "12".to_string();

        let err = flow.submit(&form, &mut cart).await.unwrap_err();

        let CheckoutError::Invalid(errors) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.get(Field::Phone), Some("Phone number is required"));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
        assert_eq!(cart.cart_count(), 1);
    }

    #[tokio::test]
    async fn test_successful_checkout_clears_cart() {
        let api = Arc::new(FakeOrders::default());
        let flow = CheckoutFlow::new(Arc::clone(&api));
        let mut cart = CartStore::new(MemoryStorage::new());
        cart.add_to_cart(&tee(), 2);

        let confirmation = flow.submit(&valid_form(), &mut cart).await.unwrap();

        assert_eq!(confirmation.order_id, "ORD-TEST");
        assert_eq!(confirmation.redirect, "/");
        assert!(cart.is_empty());
        assert!(!flow.is_submitting());

        let submitted = api.submitted.lock().unwrap();
        assert_eq!(submitted[0].total_amount, Decimal::new(40, 0));
        assert_eq!(submitted[0].order_items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_failed_checkout_keeps_cart() {
        let api = Arc::new(FakeOrders {
            fail: true,
            ..FakeOrders::default()
        });
        let flow = CheckoutFlow::new(Arc::clone(&api));
        let mut cart = CartStore::new(MemoryStorage::new());
        cart.add_to_cart(&tee(), 1);

        let err = flow.submit(&valid_form(), &mut cart).await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to place order. Please try again later.");
        assert_eq!(cart.cart_count(), 1);
        assert!(!flow.is_submitting());
    }

    /// Blocks inside `create_order` until released.
    struct SlowOrders {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl OrderApi for SlowOrders {
        async fn create_order(&self, _order: &OrderSubmission) -> Result<OrderResult, ClientError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(OrderResult {
                success: true,
                order_id: "ORD-SLOW".to_string(),
                message: "ok".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_second_submit_while_in_flight_is_rejected() {
        let api = Arc::new(SlowOrders {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let flow = CheckoutFlow::new(Arc::clone(&api));
        let mut first_cart = CartStore::new(MemoryStorage::new());
        first_cart.add_to_cart(&tee(), 1);
        let mut second_cart = CartStore::new(MemoryStorage::new());
        second_cart.add_to_cart(&tee(), 1);
        let form = valid_form();

        let first = flow.submit(&form, &mut first_cart);
        let second = async {
            api.entered.notified().await;
            assert!(flow.is_submitting());
            let err = flow.submit(&form, &mut second_cart).await.unwrap_err();
            api.release.notify_one();
            err
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first.unwrap().order_id, "ORD-SLOW");
        assert!(matches!(second, CheckoutError::InFlight));
        assert!(!flow.is_submitting());
    }
}
