//! Tableside Storefront - the customer's side of seat ordering.
//!
//! A customer scans the QR code on a seat, browses that store's menu, builds
//! a cart, pays through the hosted payment widget and follows the order until
//! pickup. Each screen is a controller in [`routes`]; state that must survive
//! the payment redirect lives in the transient store (see [`transient`]).
//!
//! Controllers never return errors to their host: failures land in their
//! `error` field as text ready to show inline.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod routes;
pub mod transient;

pub use error::{CheckoutError, PaymentError};
pub use routes::{
    CartPage, CartView, CheckoutPage, MenuPage, OrderTracker, PaymentCallback, PaymentResultPage,
    WidgetParams,
};
pub use transient::{PaymentHandoff, SeatContext};
