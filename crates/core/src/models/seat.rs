//! Seats and their QR codes.

use serde::{Deserialize, Serialize};

use crate::models::Store;
use crate::types::{SeatId, StoreId};

/// A seat (table) carrying a printed QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: SeatId,
    pub store_id: StoreId,
    pub seat_number: String,
    pub qr_code: String,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default = "default_true", alias = "active")]
    pub is_active: bool,
}

/// Create/update payload for a seat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatInput {
    pub seat_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    pub is_active: bool,
}

/// Result of resolving a scanned QR code: the seat and the store it
/// belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatLookup {
    pub seat: Seat,
    pub store: Store,
}

const fn default_true() -> bool {
    true
}
