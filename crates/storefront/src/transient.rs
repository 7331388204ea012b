//! Tab-scoped state carried between screens.
//!
//! The cart and the pending payment are the only things the storefront keeps
//! on the device. Both live in the transient store as JSON so they survive
//! the redirect through the payment widget and vanish with the process.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tableside_client::KeyValueStore;
use tableside_client::storage::{StorageError, load_json, save_json};
use tableside_core::{Cart, OrderId, SeatId, StoreId};

pub const CART_KEY: &str = "cart";
pub const HANDOFF_KEY: &str = "paymentHandoff";

/// The seat an order will be placed from, as resolved from its QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatContext {
    pub store_id: StoreId,
    pub store_name: String,
    pub seat_id: SeatId,
    pub seat_number: String,
    pub qr_code: String,
}

/// A cart and the seat it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCart {
    pub seat: SeatContext,
    pub cart: Cart,
}

/// What checkout leaves behind for the payment result screen.
///
/// The widget's redirect is only trusted if it names the same
/// `payment_order_key` and `amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHandoff {
    pub order_id: OrderId,
    pub order_number: String,
    pub payment_order_key: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub seat: SeatContext,
    pub created_at: DateTime<Utc>,
}

/// Read the stored cart.
///
/// # Errors
///
/// Returns an error if the store cannot be read or holds something that is
/// not a cart.
pub fn load_cart(store: &dyn KeyValueStore) -> Result<Option<StoredCart>, StorageError> {
    load_json(store, CART_KEY)
}

/// Store the cart; an empty cart removes the entry.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn save_cart(store: &dyn KeyValueStore, cart: &StoredCart) -> Result<(), StorageError> {
    if cart.cart.is_empty() {
        return store.remove(CART_KEY);
    }
    save_json(store, CART_KEY, cart)
}

/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn clear_cart(store: &dyn KeyValueStore) -> Result<(), StorageError> {
    store.remove(CART_KEY)
}

/// # Errors
///
/// Returns an error if the store cannot be read or the entry is corrupt.
pub fn load_handoff(store: &dyn KeyValueStore) -> Result<Option<PaymentHandoff>, StorageError> {
    load_json(store, HANDOFF_KEY)
}

/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn save_handoff(store: &dyn KeyValueStore, handoff: &PaymentHandoff) -> Result<(), StorageError> {
    save_json(store, HANDOFF_KEY, handoff)
}

/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn clear_handoff(store: &dyn KeyValueStore) -> Result<(), StorageError> {
    store.remove(HANDOFF_KEY)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use tableside_client::MemoryStore;
    use tableside_core::MenuId;

    use super::*;

    pub fn seat() -> SeatContext {
        SeatContext {
            store_id: StoreId::new(1),
            store_name: "Bean There".to_string(),
            seat_id: SeatId::new(7),
            seat_number: "A7".to_string(),
            qr_code: "qr-a7".to_string(),
        }
    }

    #[test]
    fn test_empty_cart_is_not_stored() {
        let store = MemoryStore::new();
        let mut stored = StoredCart {
            seat: seat(),
            cart: Cart::new(),
        };
        stored
            .cart
            .add(MenuId::new(1), "Latte", Decimal::new(4500, 0), 1, None)
            .unwrap();
        save_cart(&store, &stored).unwrap();
        assert_eq!(load_cart(&store).unwrap(), Some(stored.clone()));

        stored.cart.clear();
        save_cart(&store, &stored).unwrap();
        assert_eq!(load_cart(&store).unwrap(), None);
    }

    #[test]
    fn test_corrupt_handoff_is_an_error() {
        let store = MemoryStore::new();
        store.set(HANDOFF_KEY, "{").unwrap();
        assert!(matches!(
            load_handoff(&store),
            Err(StorageError::Corrupt { .. })
        ));
    }
}
