//! Backend entities as seen by the client.
//!
//! These are read-only projections of backend-owned records, plus the
//! request payloads the client sends to create or change them. Field names
//! follow the backend's camelCase JSON.

pub mod identity;
pub mod menu;
pub mod notification;
pub mod order;
pub mod payment;
pub mod seat;
pub mod store;

pub use identity::{Identity, LoginResponse, SubAccountUpdate};
pub use menu::{Category, CategoryInput, MenuAvailability, MenuInput, MenuItem};
pub use notification::{Notification, UnreadCount};
pub use order::{CreateOrderItem, CreateOrderRequest, Order, OrderItem, OrderStatusUpdate};
pub use payment::{Payment, PaymentConfirmRequest};
pub use seat::{Seat, SeatInput, SeatLookup};
pub use store::{DashboardStats, Store, StoreInput};
