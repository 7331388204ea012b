//! Tableside Admin - the staff back office.
//!
//! Screens for running a store: incoming orders, the menu and its
//! categories, seats and their QR codes, store settings, staff sub-accounts
//! and the notification center. Every screen except login and signup sits
//! behind the route guard; see [`routes::AdminRoute`].
//!
//! Like the storefront, controllers keep failures in an `error` field as
//! inline text and never panic on a failed call.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod refresh;
pub mod routes;

pub use error::FormError;
pub use refresh::AutoRefresh;
pub use routes::AdminRoute;
