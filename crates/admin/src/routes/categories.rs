//! Menu categories.

use tableside_client::{ApiClient, GatewayError};
use tableside_core::{Category, CategoryId, CategoryInput, StoreId};
use tracing::{info, instrument, warn};

use super::upsert_by_id;
use crate::error::{FormError, optional, required};

pub const MAX_NAME_CHARS: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryForm {
    pub editing: Option<CategoryId>,
    pub name: String,
    pub display_order: String,
}

impl CategoryForm {
    /// Validate against the form fields and the categories already listed;
    /// names are unique per store, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns the first field that blocks submission.
    pub fn validate(&self, existing: &[Category]) -> Result<CategoryInput, FormError> {
        let name = required("name", &self.name)?;
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(FormError::TooLong {
                field: "name",
                max: MAX_NAME_CHARS,
            });
        }
        let taken = existing
            .iter()
            .any(|c| Some(c.id) != self.editing && c.name.eq_ignore_ascii_case(&name));
        if taken {
            return Err(FormError::Duplicate("category name"));
        }
        let display_order = match optional(&self.display_order) {
            Some(raw) => raw.parse().map_err(|_| FormError::NotANumber("display order"))?,
            None => i32::try_from(existing.len()).unwrap_or(i32::MAX),
        };
        Ok(CategoryInput { name, display_order })
    }
}

#[derive(Debug)]
pub struct CategoriesPage {
    api: ApiClient,
    store_id: StoreId,
    pub categories: Vec<Category>,
    pub form: CategoryForm,
    pub loading: bool,
    pub error: Option<String>,
}

impl CategoriesPage {
    #[must_use]
    pub fn new(api: ApiClient, store_id: StoreId) -> Self {
        Self {
            api,
            store_id,
            categories: Vec::new(),
            form: CategoryForm::default(),
            loading: false,
            error: None,
        }
    }

    #[instrument(skip(self), fields(store_id = %self.store_id))]
    pub async fn load(&mut self) {
        self.loading = true;
        match self.api.categories(self.store_id).await {
            Ok(mut categories) => {
                categories.sort_by_key(|c| c.display_order);
                self.categories = categories;
                self.error = None;
            }
            Err(e) => self.fail(&e),
        }
        self.loading = false;
    }

    pub fn edit(&mut self, id: CategoryId) {
        match self.categories.iter().find(|c| c.id == id) {
            Some(category) => {
                self.form = CategoryForm {
                    editing: Some(id),
                    name: category.name.clone(),
                    display_order: category.display_order.to_string(),
                };
            }
            None => self.error = Some("That category no longer exists.".to_string()),
        }
    }

    #[instrument(skip(self), fields(store_id = %self.store_id, editing = ?self.form.editing))]
    pub async fn save(&mut self) -> bool {
        let input = match self.form.validate(&self.categories) {
            Ok(input) => input,
            Err(e) => {
                self.error = Some(e.user_message());
                return false;
            }
        };
        let result = match self.form.editing {
            Some(id) => self.api.update_category(id, &input).await,
            None => self.api.create_category(self.store_id, &input).await,
        };
        match result {
            Ok(category) => {
                info!(category_id = %category.id, "Category saved");
                upsert_by_id(&mut self.categories, category, |c| c.id);
                self.categories.sort_by_key(|c| c.display_order);
                self.form = CategoryForm::default();
                self.error = None;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    /// Delete a category. The backend refuses while menu items still use it.
    #[instrument(skip(self))]
    pub async fn delete(&mut self, id: CategoryId) -> bool {
        match self.api.delete_category(id).await {
            Ok(()) => {
                info!(category_id = %id, "Category deleted");
                self.categories.retain(|c| c.id != id);
                if self.form.editing == Some(id) {
                    self.form = CategoryForm::default();
                }
                self.error = None;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    fn fail(&mut self, e: &GatewayError) {
        warn!(error = %e, "Category update failed");
        self.error = Some(e.user_message());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn category(id: i64, name: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            store_id: Some(StoreId::new(1)),
            name: name.to_string(),
            display_order: 0,
            is_active: true,
        }
    }

    #[test]
    fn test_duplicate_names_rejected_except_self() {
        let existing = vec![category(1, "Coffee"), category(2, "Tea")];
        let mut form = CategoryForm {
            name: "coffee".to_string(),
            ..CategoryForm::default()
        };
        assert_eq!(
            form.validate(&existing),
            Err(FormError::Duplicate("category name"))
        );

        form.editing = Some(CategoryId::new(1));
        let input = form.validate(&existing).unwrap();
        assert_eq!(input.name, "coffee");
        assert_eq!(input.display_order, 2);
    }

    #[test]
    fn test_display_order_must_be_numeric() {
        let form = CategoryForm {
            editing: None,
            name: "Dessert".to_string(),
            display_order: "first".to_string(),
        };
        assert_eq!(
            form.validate(&[]),
            Err(FormError::NotANumber("display order"))
        );
    }
}
