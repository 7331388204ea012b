//! The seat menu screen.
//!
//! Entered by scanning a seat's QR code. Resolves the seat and its store,
//! then loads the store's active categories and available menu items.

use tableside_client::ApiClient;
use tableside_core::{Category, CategoryId, MenuId, MenuItem, Store};
use tracing::instrument;

use super::format_price;
use crate::transient::SeatContext;

/// Menu item display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItemView {
    pub id: MenuId,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub image_url: Option<String>,
}

impl From<&MenuItem> for MenuItemView {
    fn from(item: &MenuItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            description: item.description.clone().filter(|d| !d.trim().is_empty()),
            price: format_price(item.price),
            image_url: item.image_url.clone(),
        }
    }
}

/// Controller for the menu screen.
#[derive(Debug)]
pub struct MenuPage {
    api: ApiClient,
    qr_code: String,
    pub seat: Option<SeatContext>,
    pub store: Option<Store>,
    pub categories: Vec<Category>,
    pub items: Vec<MenuItem>,
    pub selected_category: Option<CategoryId>,
    pub loading: bool,
    pub error: Option<String>,
}

impl MenuPage {
    #[must_use]
    pub fn new(api: ApiClient, qr_code: impl Into<String>) -> Self {
        Self {
            api,
            qr_code: qr_code.into(),
            seat: None,
            store: None,
            categories: Vec::new(),
            items: Vec::new(),
            selected_category: None,
            loading: false,
            error: None,
        }
    }

    /// Resolve the seat and load the menu. Returns whether the menu is ready
    /// for ordering.
    #[instrument(skip(self), fields(qr_code = %self.qr_code))]
    pub async fn load(&mut self) -> bool {
        self.loading = true;
        self.error = None;
        let ready = self.try_load().await;
        self.loading = false;
        ready
    }

    async fn try_load(&mut self) -> bool {
        let qr_code = self.qr_code.trim();
        if qr_code.is_empty() {
            self.error = Some("This QR code is not valid.".to_string());
            return false;
        }

        let lookup = match self.api.seat_by_qr(qr_code).await {
            Ok(lookup) => lookup,
            Err(e) => {
                tracing::warn!(error = %e, "Seat lookup failed");
                self.error = Some(if e.status() == Some(404) {
                    "This QR code is not registered to any seat.".to_string()
                } else {
                    e.user_message()
                });
                return false;
            }
        };

        let store = lookup.store;
        let seat = lookup.seat;
        if !seat.is_active {
            self.error = Some(format!(
                "Seat {} is not taking orders right now.",
                seat.seat_number
            ));
            return false;
        }
        if !store.is_open {
            self.error = Some(format!("{} is closed right now.", store.name));
            return false;
        }

        let menus = tokio::try_join!(
            self.api.categories(store.id),
            self.api.menus(store.id, None)
        );
        let (mut categories, mut items) = match menus {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!(store_id = %store.id, error = %e, "Failed to load menu");
                self.error = Some(e.user_message());
                return false;
            }
        };

        categories.retain(|c| c.is_active);
        categories.sort_by_key(|c| c.display_order);
        items.retain(|item| item.is_available);
        items.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });

        tracing::info!(
            store_id = %store.id,
            seat = %seat.seat_number,
            categories = categories.len(),
            items = items.len(),
            "Menu loaded"
        );

        self.seat = Some(SeatContext {
            store_id: store.id,
            store_name: store.name.clone(),
            seat_id: seat.id,
            seat_number: seat.seat_number,
            qr_code: qr_code.to_string(),
        });
        self.store = Some(store);
        self.categories = categories;
        self.items = items;
        if self
            .selected_category
            .is_some_and(|id| !self.categories.iter().any(|c| c.id == id))
        {
            self.selected_category = None;
        }
        true
    }

    /// Show one category, or everything with `None`.
    pub fn select_category(&mut self, category: Option<CategoryId>) {
        self.selected_category = category;
    }

    /// Items in the selected category.
    pub fn visible_items(&self) -> impl Iterator<Item = &MenuItem> {
        self.items.iter().filter(move |item| match self.selected_category {
            Some(id) => item.category_id == Some(id),
            None => true,
        })
    }

    #[must_use]
    pub fn views(&self) -> Vec<MenuItemView> {
        self.visible_items().map(MenuItemView::from).collect()
    }

    #[must_use]
    pub fn item(&self, id: MenuId) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use tableside_client::{ClientConfig, MemoryStore, SessionStore};
    use url::Url;

    use super::*;

    fn item(id: i64, category: i64) -> MenuItem {
        MenuItem {
            id: MenuId::new(id),
            store_id: None,
            category_id: Some(CategoryId::new(category)),
            name: format!("Item {id}"),
            description: Some("  ".to_string()),
            price: Decimal::new(4500, 0),
            image_url: None,
            is_available: true,
            display_order: 0,
        }
    }

    fn page() -> MenuPage {
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:1").unwrap());
        let api = ApiClient::new(&config, SessionStore::new(Arc::new(MemoryStore::new()))).unwrap();
        MenuPage::new(api, "  ")
    }

    #[tokio::test]
    async fn test_blank_qr_code_fails_without_network() {
        let mut page = page();
        assert!(!page.load().await);
        assert_eq!(page.error.as_deref(), Some("This QR code is not valid."));
        assert!(!page.loading);
    }

    #[test]
    fn test_category_filter() {
        let mut page = page();
        page.items = vec![item(1, 10), item(2, 20), item(3, 10)];

        page.select_category(Some(CategoryId::new(10)));
        let ids: Vec<_> = page.visible_items().map(|i| i.id).collect();
        assert_eq!(ids, vec![MenuId::new(1), MenuId::new(3)]);

        page.select_category(None);
        assert_eq!(page.visible_items().count(), 3);
    }

    #[test]
    fn test_view_formats_price_and_hides_blank_description() {
        let view = MenuItemView::from(&item(1, 10));
        assert_eq!(view.price, "₩4,500");
        assert_eq!(view.description, None);
    }
}
