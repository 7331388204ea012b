//! Menu management.

use std::str::FromStr;

use rust_decimal::Decimal;
use tableside_client::{ApiClient, GatewayError};
use tableside_core::{Category, CategoryId, MenuId, MenuInput, MenuItem, StoreId};
use tracing::{info, instrument, warn};

use super::{format_price, upsert_by_id};
use crate::error::{FormError, optional, required};

/// Longest menu name the form accepts.
pub const MAX_NAME_CHARS: usize = 100;

/// The create/edit form, holding raw field text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuForm {
    /// Set when editing an existing item.
    pub editing: Option<MenuId>,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: String,
    pub is_available: bool,
    pub display_order: String,
}

impl MenuForm {
    #[must_use]
    pub fn blank() -> Self {
        Self {
            is_available: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn edit(item: &MenuItem) -> Self {
        Self {
            editing: Some(item.id),
            category_id: item.category_id,
            name: item.name.clone(),
            description: item.description.clone().unwrap_or_default(),
            price: item.price.to_string(),
            image_url: item.image_url.clone().unwrap_or_default(),
            is_available: item.is_available,
            display_order: item.display_order.to_string(),
        }
    }

    /// # Errors
    ///
    /// Returns the first field that blocks submission.
    pub fn validate(&self) -> Result<MenuInput, FormError> {
        let name = required("name", &self.name)?;
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(FormError::TooLong {
                field: "name",
                max: MAX_NAME_CHARS,
            });
        }
        let price = required("price", &self.price)?;
        let price = Decimal::from_str(&price.replace(',', ""))
            .map_err(|_| FormError::NotANumber("price"))?;
        if price.is_sign_negative() && !price.is_zero() {
            return Err(FormError::Negative("price"));
        }
        let display_order = match optional(&self.display_order) {
            Some(raw) => raw.parse().map_err(|_| FormError::NotANumber("display order"))?,
            None => 0,
        };
        Ok(MenuInput {
            category_id: self.category_id,
            name,
            description: optional(&self.description),
            price,
            image_url: optional(&self.image_url),
            is_available: self.is_available,
            display_order,
        })
    }
}

/// One row of the menu table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuRowView {
    pub id: MenuId,
    pub name: String,
    pub category: String,
    pub price: String,
    pub available: bool,
}

#[derive(Debug)]
pub struct MenusPage {
    api: ApiClient,
    store_id: StoreId,
    pub categories: Vec<Category>,
    pub items: Vec<MenuItem>,
    pub filter: Option<CategoryId>,
    pub form: MenuForm,
    pub loading: bool,
    pub saving: bool,
    pub error: Option<String>,
}

impl MenusPage {
    #[must_use]
    pub fn new(api: ApiClient, store_id: StoreId) -> Self {
        Self {
            api,
            store_id,
            categories: Vec::new(),
            items: Vec::new(),
            filter: None,
            form: MenuForm::blank(),
            loading: false,
            saving: false,
            error: None,
        }
    }

    #[instrument(skip(self), fields(store_id = %self.store_id))]
    pub async fn load(&mut self) {
        self.loading = true;
        let result = tokio::try_join!(
            self.api.categories(self.store_id),
            self.api.menus(self.store_id, None),
        );
        match result {
            Ok((mut categories, mut items)) => {
                categories.sort_by_key(|c| c.display_order);
                items.sort_by_key(|m| m.display_order);
                self.categories = categories;
                self.items = items;
                self.error = None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load menus");
                self.error = Some(e.user_message());
            }
        }
        self.loading = false;
    }

    /// Items under the current category filter.
    #[must_use]
    pub fn visible(&self) -> Vec<&MenuItem> {
        self.items
            .iter()
            .filter(|item| self.filter.is_none() || item.category_id == self.filter)
            .collect()
    }

    #[must_use]
    pub fn rows(&self) -> Vec<MenuRowView> {
        self.visible()
            .into_iter()
            .map(|item| MenuRowView {
                id: item.id,
                name: item.name.clone(),
                category: item
                    .category_id
                    .and_then(|id| self.categories.iter().find(|c| c.id == id))
                    .map_or_else(|| "Uncategorized".to_string(), |c| c.name.clone()),
                price: format_price(item.price),
                available: item.is_available,
            })
            .collect()
    }

    /// Load an existing item into the form.
    pub fn edit(&mut self, id: MenuId) {
        match self.items.iter().find(|item| item.id == id) {
            Some(item) => self.form = MenuForm::edit(item),
            None => self.error = Some("That menu item no longer exists.".to_string()),
        }
    }

    pub fn reset_form(&mut self) {
        self.form = MenuForm::blank();
    }

    /// Create or update from the form.
    #[instrument(skip(self), fields(store_id = %self.store_id, editing = ?self.form.editing))]
    pub async fn save(&mut self) -> bool {
        let input = match self.form.validate() {
            Ok(input) => input,
            Err(e) => {
                self.error = Some(e.user_message());
                return false;
            }
        };
        self.saving = true;
        let result = match self.form.editing {
            Some(id) => self.api.update_menu(id, &input).await,
            None => self.api.create_menu(self.store_id, &input).await,
        };
        self.saving = false;
        match result {
            Ok(item) => {
                info!(menu_id = %item.id, "Menu item saved");
                upsert_by_id(&mut self.items, item, |m| m.id);
                self.form = MenuForm::blank();
                self.error = None;
                true
            }
            Err(e) => self.fail(&e),
        }
    }

    /// Flip an item between available and sold out.
    #[instrument(skip(self))]
    pub async fn toggle_availability(&mut self, id: MenuId) -> bool {
        let Some(current) = self.items.iter().find(|m| m.id == id).map(|m| m.is_available) else {
            self.error = Some("That menu item no longer exists.".to_string());
            return false;
        };
        if let Err(e) = self.api.set_menu_availability(id, !current).await {
            return self.fail(&e);
        }
        if let Some(item) = self.items.iter_mut().find(|m| m.id == id) {
            item.is_available = !current;
        }
        self.error = None;
        true
    }

    #[instrument(skip(self))]
    pub async fn delete(&mut self, id: MenuId) -> bool {
        if let Err(e) = self.api.delete_menu(id).await {
            return self.fail(&e);
        }
        info!(menu_id = %id, "Menu item deleted");
        self.items.retain(|m| m.id != id);
        if self.form.editing == Some(id) {
            self.form = MenuForm::blank();
        }
        self.error = None;
        true
    }

    fn fail(&mut self, e: &GatewayError) -> bool {
        warn!(error = %e, "Menu update failed");
        self.error = Some(e.user_message());
        false
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, price: &str) -> MenuForm {
        MenuForm {
            name: name.to_string(),
            price: price.to_string(),
            ..MenuForm::blank()
        }
    }

    #[test]
    fn test_form_validation() {
        assert_eq!(form(" ", "4500").validate(), Err(FormError::Required("name")));
        assert_eq!(form("Latte", "").validate(), Err(FormError::Required("price")));
        assert_eq!(
            form("Latte", "four").validate(),
            Err(FormError::NotANumber("price"))
        );
        assert_eq!(
            form("Latte", "-100").validate(),
            Err(FormError::Negative("price"))
        );

        let input = form(" Latte ", "4,500").validate().unwrap();
        assert_eq!(input.name, "Latte");
        assert_eq!(input.price, Decimal::new(4500, 0));
        assert!(input.is_available);
        assert_eq!(input.description, None);
    }

    #[test]
    fn test_edit_round_trips_item_fields() {
        let item = MenuItem {
            id: MenuId::new(5),
            store_id: Some(StoreId::new(1)),
            category_id: Some(CategoryId::new(2)),
            name: "Americano".to_string(),
            description: Some("Hot or iced".to_string()),
            price: Decimal::new(4500, 0),
            image_url: None,
            is_available: false,
            display_order: 3,
        };
        let form = MenuForm::edit(&item);
        assert_eq!(form.editing, Some(MenuId::new(5)));
        let input = form.validate().unwrap();
        assert_eq!(input, MenuInput::from(&item));
    }
}
