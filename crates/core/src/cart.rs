//! The customer's cart.
//!
//! Entirely client-local. Lines are unique per menu item and keep the order
//! in which items were first added.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::MenuId;

/// Errors from cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Requested quantity is outside `1..=99`.
    #[error("quantity must be between {min} and {max}, got {got}")]
    InvalidQuantity { min: u32, max: u32, got: u32 },
    /// No line exists for the menu item.
    #[error("menu item {0} is not in the cart")]
    NotInCart(MenuId),
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub menu_id: MenuId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
}

impl CartLine {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// An ordered collection of cart lines keyed by menu item.
///
/// Serialized as a bare list of lines. Deserializing replays the lines
/// through [`Cart::add`], so duplicates merge and quantities are re-checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl TryFrom<Vec<CartLine>> for Cart {
    type Error = CartError;

    fn try_from(lines: Vec<CartLine>) -> Result<Self, Self::Error> {
        let mut cart = Self::new();
        for line in lines {
            cart.add(
                line.menu_id,
                line.name,
                line.unit_price,
                line.quantity,
                line.options,
            )?;
        }
        Ok(cart)
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}

impl Cart {
    pub const MIN_QUANTITY: u32 = 1;
    pub const MAX_QUANTITY: u32 = 99;

    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    const fn check_quantity(quantity: u32) -> Result<(), CartError> {
        if quantity < Self::MIN_QUANTITY || quantity > Self::MAX_QUANTITY {
            return Err(CartError::InvalidQuantity {
                min: Self::MIN_QUANTITY,
                max: Self::MAX_QUANTITY,
                got: quantity,
            });
        }
        Ok(())
    }

    /// Add `quantity` units of a menu item.
    ///
    /// If the item is already in the cart its quantity is increased instead
    /// of adding a second line, and `options`, when given, replace the
    /// line's options.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] if `quantity` or the merged
    /// quantity falls outside `1..=99`. The cart is unchanged on error.
    pub fn add(
        &mut self,
        menu_id: MenuId,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
        options: Option<String>,
    ) -> Result<(), CartError> {
        Self::check_quantity(quantity)?;
        let options = options.filter(|o| !o.trim().is_empty());

        if let Some(line) = self.lines.iter_mut().find(|line| line.menu_id == menu_id) {
            let merged = line.quantity.saturating_add(quantity);
            Self::check_quantity(merged)?;
            line.quantity = merged;
            if options.is_some() {
                line.options = options;
            }
            return Ok(());
        }

        self.lines.push(CartLine {
            menu_id,
            name: name.into(),
            unit_price,
            quantity,
            options,
        });
        Ok(())
    }

    /// Set the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns an error if the quantity is out of range or the item is not
    /// in the cart.
    pub fn update_quantity(&mut self, menu_id: MenuId, quantity: u32) -> Result<(), CartError> {
        Self::check_quantity(quantity)?;
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.menu_id == menu_id)
            .ok_or(CartError::NotInCart(menu_id))?;
        line.quantity = quantity;
        Ok(())
    }

    /// Remove a line, returning it if it existed.
    pub fn remove(&mut self, menu_id: MenuId) -> Option<CartLine> {
        let index = self.lines.iter().position(|line| line.menu_id == menu_id)?;
        Some(self.lines.remove(index))
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, menu_id: MenuId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.menu_id == menu_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all line subtotals.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}
