//! Tableside Core - Shared domain types.
//!
//! This crate provides the types shared by every Tableside component:
//! - `client` - Gateway, session, and real-time plumbing
//! - `storefront` - Customer-facing ordering screens
//! - `admin` - Staff back-office screens
//! - `cli` - Terminal front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no timers. Everything durable lives in the backend service; these
//! types are the client's projections of it.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, prices, and statuses
//! - [`models`] - Backend entities (identity, store, menu, seat, order, ...)
//! - [`envelope`] - The uniform `{success, message, data, error, timestamp}` wrapper
//! - [`cart`] - The client-local cart

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod envelope;
pub mod models;
pub mod serde_helpers;
pub mod types;

pub use cart::{Cart, CartError, CartLine};
pub use envelope::ApiResponse;
pub use models::*;
pub use types::*;
