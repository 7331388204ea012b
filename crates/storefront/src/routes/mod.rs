//! Customer screens.
//!
//! - [`menu`] - seat lookup by QR code and the store's menu
//! - [`cart`] - the cart, persisted across screens
//! - [`checkout`] - order placement and payment widget hand-off
//! - [`payment`] - payment redirect reconciliation
//! - [`order`] - live order tracking

pub mod cart;
pub mod checkout;
pub mod menu;
pub mod order;
pub mod payment;

use rust_decimal::Decimal;
use tableside_core::Price;

pub use cart::{CartLineView, CartPage, CartView};
pub use checkout::{CheckoutPage, WidgetParams};
pub use menu::{MenuItemView, MenuPage};
pub use order::OrderTracker;
pub use payment::{PaymentCallback, PaymentResultPage};

/// Format an amount for display.
fn format_price(amount: Decimal) -> String {
    Price::krw(amount).display()
}
