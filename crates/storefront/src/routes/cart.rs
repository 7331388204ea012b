//! The cart screen.
//!
//! Wraps the core [`Cart`] for one seat and writes it to the transient store
//! after every change, so the checkout and payment screens see the same
//! cart.

use std::sync::Arc;

use tableside_client::KeyValueStore;
use tableside_core::{Cart, CartError, CartLine, MenuId, MenuItem};
use tracing::{debug, info, warn};

use super::format_price;
use crate::transient::{self, SeatContext, StoredCart};

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineView {
    pub menu_id: MenuId,
    pub name: String,
    pub options: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_price: String,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            menu_id: line.menu_id,
            name: line.name.clone(),
            options: line.options.clone(),
            quantity: line.quantity,
            unit_price: format_price(line.unit_price),
            line_price: format_price(line.subtotal()),
        }
    }
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.lines().iter().map(CartLineView::from).collect(),
            total: format_price(cart.total()),
            item_count: cart.item_count(),
        }
    }
}

/// Controller for the cart.
#[derive(Debug)]
pub struct CartPage {
    transient: Arc<dyn KeyValueStore>,
    seat: SeatContext,
    cart: Cart,
    pub error: Option<String>,
}

impl CartPage {
    /// Open the cart for `seat`, restoring a stored one from the same store.
    ///
    /// A cart left over from another store is discarded; one from another
    /// seat of the same store moves to this seat.
    #[must_use]
    pub fn open(transient: Arc<dyn KeyValueStore>, seat: SeatContext) -> Self {
        let cart = match transient::load_cart(transient.as_ref()) {
            Ok(Some(stored)) if stored.seat.store_id == seat.store_id => stored.cart,
            Ok(Some(stored)) => {
                info!(
                    previous_store = %stored.seat.store_id,
                    store_id = %seat.store_id,
                    "Discarding cart from another store"
                );
                Cart::new()
            }
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!(error = %e, "Stored cart unreadable, starting empty");
                Cart::new()
            }
        };
        Self {
            transient,
            seat,
            cart,
            error: None,
        }
    }

    /// Add an item. Returns whether it was added.
    pub fn add(&mut self, item: &MenuItem, quantity: u32, options: Option<String>) -> bool {
        if !item.is_available {
            self.error = Some(format!("{} is sold out.", item.name));
            return false;
        }
        let result = self
            .cart
            .add(item.id, item.name.clone(), item.price, quantity, options);
        self.apply(result)
    }

    /// Set a line's quantity. Returns whether it changed.
    pub fn update_quantity(&mut self, menu_id: MenuId, quantity: u32) -> bool {
        let result = self.cart.update_quantity(menu_id, quantity);
        self.apply(result)
    }

    pub fn remove(&mut self, menu_id: MenuId) -> bool {
        if self.cart.remove(menu_id).is_none() {
            return false;
        }
        self.error = None;
        self.persist();
        true
    }

    pub fn clear(&mut self) {
        self.cart.clear();
        self.error = None;
        self.persist();
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn seat(&self) -> &SeatContext {
        &self.seat
    }

    #[must_use]
    pub fn view(&self) -> CartView {
        CartView::from(&self.cart)
    }

    fn apply(&mut self, result: Result<(), CartError>) -> bool {
        match result {
            Ok(()) => {
                self.error = None;
                self.persist();
                true
            }
            Err(e) => {
                debug!(error = %e, "Cart change rejected");
                self.error = Some(match e {
                    CartError::InvalidQuantity { min, max, .. } => {
                        format!("Quantity must be between {min} and {max}.")
                    }
                    CartError::NotInCart(_) => "That item is no longer in your cart.".to_string(),
                });
                false
            }
        }
    }

    fn persist(&mut self) {
        let stored = StoredCart {
            seat: self.seat.clone(),
            cart: self.cart.clone(),
        };
        if let Err(e) = transient::save_cart(self.transient.as_ref(), &stored) {
            warn!(error = %e, "Failed to save cart");
            self.error = Some("Your cart could not be saved on this device.".to_string());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use tableside_client::MemoryStore;
    use tableside_core::StoreId;

    use super::*;
    use crate::transient::tests::seat;

    fn latte() -> MenuItem {
        MenuItem {
            id: MenuId::new(3),
            store_id: None,
            category_id: None,
            name: "Latte".to_string(),
            description: None,
            price: Decimal::new(5000, 0),
            image_url: None,
            is_available: true,
            display_order: 0,
        }
    }

    #[test]
    fn test_add_merges_and_persists() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut page = CartPage::open(Arc::clone(&store), seat());

        assert!(page.add(&latte(), 1, None));
        assert!(page.add(&latte(), 2, Some("oat milk".to_string())));

        let view = page.view();
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.total, "₩15,000");

        let reopened = CartPage::open(store, seat());
        assert_eq!(reopened.cart(), page.cart());
        let line = reopened.cart().get(MenuId::new(3)).unwrap();
        assert_eq!(line.options.as_deref(), Some("oat milk"));
    }

    #[test]
    fn test_invalid_quantity_sets_inline_error() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut page = CartPage::open(store, seat());

        assert!(!page.add(&latte(), 100, None));
        assert_eq!(
            page.error.as_deref(),
            Some("Quantity must be between 1 and 99.")
        );
        assert!(page.cart().is_empty());

        assert!(page.add(&latte(), 1, None));
        assert!(page.error.is_none());
    }

    #[test]
    fn test_sold_out_item_is_rejected() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut page = CartPage::open(store, seat());
        let mut item = latte();
        item.is_available = false;
        assert!(!page.add(&item, 1, None));
        assert_eq!(page.error.as_deref(), Some("Latte is sold out."));
    }

    #[test]
    fn test_cart_from_another_store_is_discarded() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut page = CartPage::open(Arc::clone(&store), seat());
        page.add(&latte(), 1, None);

        let mut elsewhere = seat();
        elsewhere.store_id = StoreId::new(2);
        assert!(CartPage::open(Arc::clone(&store), elsewhere).cart().is_empty());

        let mut next_table = seat();
        next_table.seat_number = "B2".to_string();
        assert_eq!(CartPage::open(store, next_table).cart().item_count(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut page = CartPage::open(Arc::clone(&store), seat());
        page.add(&latte(), 2, None);
        assert!(!page.remove(MenuId::new(99)));
        assert!(page.remove(MenuId::new(3)));
        assert!(page.cart().is_empty());

        page.add(&latte(), 1, None);
        page.clear();
        assert!(transient::load_cart(store.as_ref()).unwrap().is_none());
    }
}
