//! Menu categories and items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, MenuId, StoreId};

/// A menu category (e.g. "Coffee", "Dessert").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    #[serde(default)]
    pub store_id: Option<StoreId>,
    pub name: String,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true", alias = "active")]
    pub is_active: bool,
}

/// Create/update payload for a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    pub name: String,
    pub display_order: i32,
}

/// An orderable menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: MenuId,
    #[serde(default)]
    pub store_id: Option<StoreId>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_true", alias = "available")]
    pub is_available: bool,
    #[serde(default)]
    pub display_order: i32,
}

/// Create/update payload for a menu item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuInput {
    pub category_id: Option<CategoryId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub is_available: bool,
    pub display_order: i32,
}

impl From<&MenuItem> for MenuInput {
    fn from(item: &MenuItem) -> Self {
        Self {
            category_id: item.category_id,
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            image_url: item.image_url.clone(),
            is_available: item.is_available,
            display_order: item.display_order,
        }
    }
}

/// Availability toggle payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuAvailability {
    pub is_available: bool,
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_item_from_backend_json() {
        let json = r#"{
            "id": 5,
            "storeId": 1,
            "categoryId": 2,
            "name": "Americano",
            "price": 4500,
            "available": false
        }"#;
        let item: MenuItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.price, Decimal::new(4500, 0));
        assert!(!item.is_available);
        assert_eq!(item.category_id, Some(CategoryId::new(2)));
    }

    #[test]
    fn test_menu_input_serializes_price_as_number() {
        let input = MenuInput {
            name: "Latte".to_string(),
            price: Decimal::new(5000, 0),
            is_available: true,
            ..MenuInput::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        assert!(json["price"].is_number());
        assert!(json.get("description").is_none());
    }
}
