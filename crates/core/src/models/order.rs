//! Orders and order placement payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::serde_helpers::timestamp_option;
use crate::types::{MenuId, OrderId, OrderItemId, OrderStatus, PaymentStatus, SeatId, StoreId};

/// A customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub store_id: StoreId,
    pub seat_id: SeatId,
    #[serde(default)]
    pub seat_number: Option<String>,
    pub order_number: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub customer_note: Option<String>,
    #[serde(default, alias = "orderItems")]
    pub items: Vec<OrderItem>,
    #[serde(default, alias = "isCancelable")]
    pub cancelable: bool,
    #[serde(default, alias = "isPaid")]
    pub paid: bool,
    #[serde(default, with = "timestamp_option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub id: Option<OrderItemId>,
    pub menu_id: MenuId,
    pub menu_name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float", alias = "price")]
    pub unit_price: Decimal,
    #[serde(default)]
    pub options: Option<String>,
}

/// Order placement payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub store_id: StoreId,
    pub seat_id: SeatId,
    pub items: Vec<CreateOrderItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_note: Option<String>,
}

impl CreateOrderRequest {
    /// Build a placement request from a cart.
    #[must_use]
    pub fn from_cart(
        store_id: StoreId,
        seat_id: SeatId,
        cart: &Cart,
        customer_note: Option<String>,
    ) -> Self {
        Self {
            store_id,
            seat_id,
            items: cart
                .lines()
                .iter()
                .map(|line| CreateOrderItem {
                    menu_id: line.menu_id,
                    quantity: line.quantity,
                    options: line.options.clone(),
                })
                .collect(),
            customer_note: customer_note.filter(|note| !note.trim().is_empty()),
        }
    }
}

/// One line of an order placement payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItem {
    pub menu_id: MenuId,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
}

/// Status change request issued by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}
