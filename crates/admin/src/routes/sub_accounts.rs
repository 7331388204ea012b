//! Staff accounts (owner only).

use secrecy::SecretString;
use tableside_client::gateway::NewSubAccount;
use tableside_client::{ApiClient, GatewayError};
use tableside_core::{Email, Identity, Role, UserId};
use tracing::{info, instrument, warn};

use super::auth::MIN_PASSWORD_LEN;
use super::upsert_by_id;
use crate::error::{FormError, required};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubAccountForm {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl SubAccountForm {
    /// # Errors
    ///
    /// Returns the first field that blocks submission.
    pub fn validate(&self, existing: &[Identity]) -> Result<NewSubAccount, FormError> {
        required("email", &self.email)?;
        let email = Email::parse(&self.email)?;
        if existing
            .iter()
            .any(|account| account.email.as_str().eq_ignore_ascii_case(email.as_str()))
        {
            return Err(FormError::Duplicate("email"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FormError::TooShort {
                field: "password",
                min: MIN_PASSWORD_LEN,
            });
        }
        let name = required("name", &self.name)?;
        Ok(NewSubAccount {
            email,
            password: SecretString::from(self.password.clone()),
            name,
        })
    }
}

#[derive(Debug)]
pub struct SubAccountsPage {
    api: ApiClient,
    me: UserId,
    pub accounts: Vec<Identity>,
    pub form: SubAccountForm,
    pub loading: bool,
    pub error: Option<String>,
}

impl SubAccountsPage {
    #[must_use]
    pub fn new(api: ApiClient, me: &Identity) -> Self {
        Self {
            api,
            me: me.id,
            accounts: Vec::new(),
            form: SubAccountForm::default(),
            loading: false,
            error: None,
        }
    }

    #[instrument(skip(self))]
    pub async fn load(&mut self) {
        self.loading = true;
        match self.api.sub_accounts().await {
            Ok(accounts) => {
                self.accounts = accounts;
                self.error = None;
            }
            Err(e) => self.fail(&e),
        }
        self.loading = false;
    }

    #[instrument(skip(self))]
    pub async fn create(&mut self) -> bool {
        let account = match self.form.validate(&self.accounts) {
            Ok(account) => account,
            Err(e) => {
                self.error = Some(e.user_message());
                return false;
            }
        };
        match self.api.create_sub_account(&account).await {
            Ok(identity) => {
                info!(user_id = %identity.id, "Sub-account created");
                upsert_by_id(&mut self.accounts, identity, |a| a.id);
                self.form = SubAccountForm::default();
                self.error = None;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn set_active(&mut self, id: UserId, is_active: bool) -> bool {
        if !self.may_modify(id) {
            return false;
        }
        match self.api.set_sub_account_active(id, is_active).await {
            Ok(()) => {
                info!(user_id = %id, is_active, "Sub-account activation changed");
                if let Some(account) = self.accounts.iter_mut().find(|a| a.id == id) {
                    account.is_active = is_active;
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

    #[instrument(skip(self))]
    pub async fn set_role(&mut self, id: UserId, role: Role) -> bool {
        if !self.may_modify(id) {
            return false;
        }
        match self.api.set_sub_account_role(id, role).await {
            Ok(()) => {
                info!(user_id = %id, %role, "Sub-account role changed");
                if let Some(account) = self.accounts.iter_mut().find(|a| a.id == id) {
                    account.role = role;
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

    #[instrument(skip(self))]
    pub async fn delete(&mut self, id: UserId) -> bool {
        if !self.may_modify(id) {
            return false;
        }
        match self.api.delete_sub_account(id).await {
            Ok(()) => {
                info!(user_id = %id, "Sub-account deleted");
                self.accounts.retain(|a| a.id != id);
                self.error = None;
                true
            }
            Err(e) => {
                self.fail(&e);
                false
            }
        }
    }

    /// Owners cannot lock themselves out from this screen.
    fn may_modify(&mut self, id: UserId) -> bool {
        if id == self.me {
            self.error = Some("You cannot change your own account here.".to_string());
            return false;
        }
        true
    }

    fn fail(&mut self, e: &GatewayError) {
        warn!(error = %e, "Sub-account update failed");
        self.error = Some(e.user_message());
    }
}
