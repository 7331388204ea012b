//! The checkout screen.
//!
//! Places the order for the current cart, then hands the payment over to the
//! hosted widget. The widget's only inputs are [`WidgetParams`]; what comes
//! back is a redirect handled by the payment result screen.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::SecretString;
use tableside_client::config::PaymentConfig;
use tableside_client::{ApiClient, ClientConfig, KeyValueStore};
use tableside_core::{CreateOrderRequest, Order, OrderId};
use tracing::{error, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use super::cart::CartPage;
use crate::error::CheckoutError;
use crate::transient::{self, PaymentHandoff};

/// Longest customer note accepted, in characters.
pub const MAX_NOTE_CHARS: usize = 200;

pub const SUCCESS_PATH: &str = "/payment/success";
pub const FAIL_PATH: &str = "/payment/fail";

/// Everything the payment widget needs to start a payment.
#[derive(Clone)]
pub struct WidgetParams {
    pub client_key: SecretString,
    pub amount: Decimal,
    /// Merchant-side order key; the widget echoes it back as `orderId`.
    pub payment_order_key: String,
    pub order_name: String,
    pub success_url: Url,
    pub fail_url: Url,
}

impl std::fmt::Debug for WidgetParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetParams")
            .field("client_key", &"[REDACTED]")
            .field("amount", &self.amount)
            .field("payment_order_key", &self.payment_order_key)
            .field("order_name", &self.order_name)
            .field("success_url", &self.success_url.as_str())
            .field("fail_url", &self.fail_url.as_str())
            .finish()
    }
}

/// Controller for the checkout screen.
#[derive(Debug)]
pub struct CheckoutPage {
    api: ApiClient,
    transient: Arc<dyn KeyValueStore>,
    storefront_url: Url,
    payment: Option<PaymentConfig>,
    pub note: String,
    pub submitting: bool,
    pub order: Option<Order>,
    pub error: Option<String>,
}

impl CheckoutPage {
    #[must_use]
    pub fn new(api: ApiClient, transient: Arc<dyn KeyValueStore>, config: &ClientConfig) -> Self {
        Self {
            api,
            transient,
            storefront_url: config.storefront_url.clone(),
            payment: config.payment.clone(),
            note: String::new(),
            submitting: false,
            order: None,
            error: None,
        }
    }

    /// Check the form without touching the network.
    ///
    /// # Errors
    ///
    /// Returns the first problem that blocks submission.
    pub fn validate(&self, cart: &CartPage) -> Result<(), CheckoutError> {
        if cart.cart().is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let len = self.note.trim().chars().count();
        if len > MAX_NOTE_CHARS {
            return Err(CheckoutError::NoteTooLong {
                len,
                max: MAX_NOTE_CHARS,
            });
        }
        if self.payment.is_none() {
            return Err(CheckoutError::PaymentUnavailable);
        }
        Ok(())
    }

    /// Place the order and prepare the payment widget.
    ///
    /// On failure `error` is set and `None` returned. Submitting again while
    /// a submission is in flight does nothing.
    #[instrument(skip(self, cart), fields(store_id = %cart.seat().store_id, seat = %cart.seat().seat_number))]
    pub async fn submit(&mut self, cart: &CartPage) -> Option<WidgetParams> {
        if self.submitting {
            return None;
        }
        self.submitting = true;
        self.error = None;
        let result = self.try_submit(cart).await;
        self.submitting = false;
        match result {
            Ok(params) => Some(params),
            Err(e) => {
                warn!(error = %e, "Checkout failed");
                self.error = Some(e.user_message());
                None
            }
        }
    }

    async fn try_submit(&mut self, cart: &CartPage) -> Result<WidgetParams, CheckoutError> {
        self.validate(cart)?;
        let Some(payment) = self.payment.clone() else {
            return Err(CheckoutError::PaymentUnavailable);
        };

        let seat = cart.seat();
        let request = CreateOrderRequest::from_cart(
            seat.store_id,
            seat.seat_id,
            cart.cart(),
            Some(self.note.trim().to_string()),
        );
        let order = self.api.create_order(&request).await?;
        info!(order_id = %order.id, order_number = %order.order_number, "Order placed");

        let expected = cart.cart().total();
        if order.total_amount != expected {
            // The backend prices the order; the widget is charged its amount.
            warn!(
                order_id = %order.id,
                cart_total = %expected,
                order_total = %order.total_amount,
                "Order total differs from cart total"
            );
        }

        let handoff = PaymentHandoff {
            order_id: order.id,
            order_number: order.order_number.clone(),
            payment_order_key: payment_order_key(order.id),
            amount: order.total_amount,
            seat: seat.clone(),
            created_at: Utc::now(),
        };
        if let Err(e) = transient::save_handoff(self.transient.as_ref(), &handoff) {
            error!(order_id = %order.id, error = %e, "Order placed but payment hand-off could not be saved");
            return Err(e.into());
        }

        let params = WidgetParams {
            client_key: payment.client_key,
            amount: handoff.amount,
            payment_order_key: handoff.payment_order_key,
            order_name: order_name(&order, cart),
            success_url: self.callback_url(SUCCESS_PATH),
            fail_url: self.callback_url(FAIL_PATH),
        };
        self.order = Some(order);
        Ok(params)
    }

    fn callback_url(&self, path: &str) -> Url {
        let mut url = self.storefront_url.clone();
        url.set_path(path);
        url.set_query(None);
        url
    }
}

/// A fresh widget order key for `order_id`: 6 to 64 characters of
/// `[A-Za-z0-9_-]`, unique per payment attempt.
fn payment_order_key(order_id: OrderId) -> String {
    format!("TS-{order_id}-{}", Uuid::new_v4().simple())
}

/// "Americano" or "Americano and 2 more".
fn order_name(order: &Order, cart: &CartPage) -> String {
    let names: Vec<&str> = if order.items.is_empty() {
        cart.cart().lines().iter().map(|l| l.name.as_str()).collect()
    } else {
        order.items.iter().map(|i| i.menu_name.as_str()).collect()
    };
    match names.as_slice() {
        [] => format!("Order {}", order.order_number),
        [only] => (*only).to_string(),
        [first, rest @ ..] => format!("{first} and {} more", rest.len()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tableside_client::{MemoryStore, SessionStore};
    use tableside_core::{MenuId, MenuItem};

    use super::*;
    use crate::transient::tests::seat;

    fn config(with_payment: bool) -> ClientConfig {
        let mut config = ClientConfig::new(Url::parse("http://127.0.0.1:1/api").unwrap());
        if with_payment {
            config.payment = Some(PaymentConfig {
                client_key: SecretString::from("test_ck"),
            });
        }
        config
    }

    fn checkout(with_payment: bool) -> (CheckoutPage, CartPage) {
        let config = config(with_payment);
        let api = ApiClient::new(&config, SessionStore::new(Arc::new(MemoryStore::new()))).unwrap();
        let transient: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let cart = CartPage::open(Arc::clone(&transient), seat());
        (CheckoutPage::new(api, transient, &config), cart)
    }

    fn mocha() -> MenuItem {
        MenuItem {
            id: MenuId::new(8),
            store_id: None,
            category_id: None,
            name: "Mocha".to_string(),
            description: None,
            price: Decimal::new(5500, 0),
            image_url: None,
            is_available: true,
            display_order: 0,
        }
    }

    #[tokio::test]
    async fn test_empty_cart_blocks_submission() {
        let (mut page, cart) = checkout(true);
        assert!(page.submit(&cart).await.is_none());
        assert_eq!(page.error.as_deref(), Some("Your cart is empty."));
        assert!(!page.submitting);
    }

    #[tokio::test]
    async fn test_long_note_blocks_submission() {
        let (mut page, mut cart) = checkout(true);
        cart.add(&mocha(), 1, None);

        page.note = "가".repeat(MAX_NOTE_CHARS);
        assert!(page.validate(&cart).is_ok());

        page.note.push('!');
        assert!(matches!(
            page.validate(&cart),
            Err(CheckoutError::NoteTooLong { len: 201, max: 200 })
        ));
        assert!(page.submit(&cart).await.is_none());
        assert_eq!(
            page.error.as_deref(),
            Some("Requests can be at most 200 characters.")
        );
    }

    #[test]
    fn test_missing_payment_config() {
        let (page, mut cart) = checkout(false);
        cart.add(&mocha(), 1, None);
        assert!(matches!(
            page.validate(&cart),
            Err(CheckoutError::PaymentUnavailable)
        ));
    }

    #[test]
    fn test_payment_order_key_shape() {
        let key = payment_order_key(OrderId::new(42));
        assert!(key.starts_with("TS-42-"));
        assert!((6..=64).contains(&key.len()));
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(key, payment_order_key(OrderId::new(42)));
    }

    #[test]
    fn test_callback_urls() {
        let (page, _) = checkout(true);
        assert_eq!(
            page.callback_url(SUCCESS_PATH).as_str(),
            "http://localhost:5173/payment/success"
        );
    }

    #[test]
    fn test_widget_params_debug_redacts_key() {
        let params = WidgetParams {
            client_key: SecretString::from("test_ck_secret"),
            amount: Decimal::new(5500, 0),
            payment_order_key: "TS-1-abc".to_string(),
            order_name: "Mocha".to_string(),
            success_url: Url::parse("http://localhost:5173/payment/success").unwrap(),
            fail_url: Url::parse("http://localhost:5173/payment/fail").unwrap(),
        };
        let debug = format!("{params:?}");
        assert!(!debug.contains("test_ck_secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
