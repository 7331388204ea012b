//! Payment confirmation types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::serde_helpers::timestamp_option;
use crate::types::{OrderId, PaymentStatus};

/// Payload reconciling a widget redirect with the backend.
///
/// `payment_order_key` is the merchant-side order key handed to the widget
/// (the widget calls it `orderId`); `order_id` is the backend order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmRequest {
    pub payment_key: String,
    #[serde(rename = "tossOrderId")]
    pub payment_order_key: String,
    pub order_id: OrderId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// The backend's record of a confirmed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub payment_key: String,
    pub order_id: OrderId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub status: PaymentStatus,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default, with = "timestamp_option")]
    pub approved_at: Option<DateTime<Utc>>,
}
