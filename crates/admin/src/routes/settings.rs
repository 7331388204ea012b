//! Store settings (owner only).
//!
//! An owner without a store lands here to create one; afterwards the same
//! form edits it.

use tableside_client::{ApiClient, GatewayError};
use tableside_core::{Identity, Store, StoreInput};
use tracing::{info, instrument, warn};

use super::resolve_store;
use crate::error::{FormError, optional, required};

pub const MAX_NAME_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreForm {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub description: String,
    pub business_hours: String,
    pub is_open: bool,
}

impl Default for StoreForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            address: String::new(),
            phone: String::new(),
            description: String::new(),
            business_hours: String::new(),
            is_open: true,
        }
    }
}

impl From<&Store> for StoreForm {
    fn from(store: &Store) -> Self {
        Self {
            name: store.name.clone(),
            address: store.address.clone().unwrap_or_default(),
            phone: store.phone.clone().unwrap_or_default(),
            description: store.description.clone().unwrap_or_default(),
            business_hours: store.business_hours.clone().unwrap_or_default(),
            is_open: store.is_open,
        }
    }
}

impl StoreForm {
    /// # Errors
    ///
    /// Returns the first field that blocks submission.
    pub fn validate(&self) -> Result<StoreInput, FormError> {
        let name = required("name", &self.name)?;
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(FormError::TooLong {
                field: "name",
                max: MAX_NAME_CHARS,
            });
        }
        let phone = optional(&self.phone);
        if let Some(phone) = &phone {
            let valid = phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | ' ' | '(' | ')'));
            if !valid {
                return Err(FormError::NotANumber("phone"));
            }
        }
        Ok(StoreInput {
            name,
            address: optional(&self.address),
            phone,
            description: optional(&self.description),
            business_hours: optional(&self.business_hours),
            is_open: self.is_open,
        })
    }
}

#[derive(Debug)]
pub struct StoreSettingsPage {
    api: ApiClient,
    identity: Identity,
    pub store: Option<Store>,
    pub form: StoreForm,
    pub loading: bool,
    pub saved: bool,
    pub error: Option<String>,
}

impl StoreSettingsPage {
    #[must_use]
    pub fn new(api: ApiClient, identity: Identity) -> Self {
        Self {
            api,
            identity,
            store: None,
            form: StoreForm::default(),
            loading: false,
            saved: false,
            error: None,
        }
    }

    /// Whether saving will create a new store rather than edit one.
    #[must_use]
    pub const fn is_creating(&self) -> bool {
        self.store.is_none()
    }

    #[instrument(skip(self), fields(user_id = %self.identity.id))]
    pub async fn load(&mut self) {
        self.loading = true;
        match self.try_load().await {
            Ok(()) => self.error = None,
            Err(e) => self.fail(&e),
        }
        self.loading = false;
    }

    async fn try_load(&mut self) -> Result<(), GatewayError> {
        let Some(store_id) = resolve_store(&self.api, &self.identity).await? else {
            self.store = None;
            self.form = StoreForm::default();
            return Ok(());
        };
        let store = self.api.store(store_id).await?;
        self.form = StoreForm::from(&store);
        self.store = Some(store);
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %self.identity.id))]
    pub async fn save(&mut self) -> bool {
        self.saved = false;
        let input = match self.form.validate() {
            Ok(input) => input,
            Err(e) => {
                self.error = Some(e.user_message());
                return false;
            }
        };
        let result = match &self.store {
            Some(store) => self.api.update_store(store.id, &input).await,
            None => self.api.create_store(&input).await,
        };
        match result {
            Ok(store) => {
                info!(store_id = %store.id, "Store saved");
                self.form = StoreForm::from(&store);
                self.store = Some(store);
                self.saved = true;
                self.error = None;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    /// Open or close the store for orders without touching other fields.
    #[instrument(skip(self))]
    pub async fn toggle_open(&mut self) -> bool {
        let Some(store) = &self.store else {
            self.error = Some("Save the store first.".to_string());
            return false;
        };
        let mut input = StoreInput::from(store);
        input.is_open = !store.is_open;
        match self.api.update_store(store.id, &input).await {
            Ok(store) => {
                info!(store_id = %store.id, is_open = store.is_open, "Store open state changed");
                self.form.is_open = store.is_open;
                self.store = Some(store);
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
        warn!(error = %e, "Store settings update failed");
        self.error = Some(e.user_message());
    }
}
