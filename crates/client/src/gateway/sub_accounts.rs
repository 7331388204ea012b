//! Sub-account management endpoints (owner only).

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::IgnoredAny;
use tableside_core::{Email, Identity, Role, SubAccountUpdate, UserId};
use tracing::instrument;

use super::{ApiClient, GatewayError};

/// Input for creating a sub-account.
#[derive(Clone)]
pub struct NewSubAccount {
    pub email: Email,
    pub password: SecretString,
    pub name: String,
}

impl std::fmt::Debug for NewSubAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewSubAccount")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Serialize)]
struct NewSubAccountBody<'a> {
    email: &'a str,
    password: &'a str,
    name: &'a str,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns an error if the caller is not an owner or the call fails.
    #[instrument(skip(self))]
    pub async fn sub_accounts(&self) -> Result<Vec<Identity>, GatewayError> {
        self.get("/sub-accounts").await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the account or the call fails.
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn create_sub_account(&self, account: &NewSubAccount) -> Result<Identity, GatewayError> {
        let body = NewSubAccountBody {
            email: account.email.as_str(),
            password: account.password.expose_secret(),
            name: account.name.trim(),
        };
        self.post("/sub-accounts", &body).await
    }

    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn set_sub_account_active(&self, id: UserId, is_active: bool) -> Result<(), GatewayError> {
        self.patch::<IgnoredAny, _>(
            &format!("/sub-accounts/{id}/active"),
            Some(&SubAccountUpdate::Active { is_active }),
        )
        .await
        .map(|_| ())
    }

    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(user_id = %id, role = %role))]
    pub async fn set_sub_account_role(&self, id: UserId, role: Role) -> Result<(), GatewayError> {
        self.patch::<IgnoredAny, _>(
            &format!("/sub-accounts/{id}/role"),
            Some(&SubAccountUpdate::Role { role }),
        )
        .await
        .map(|_| ())
    }

    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete_sub_account(&self, id: UserId) -> Result<(), GatewayError> {
        self.delete(&format!("/sub-accounts/{id}")).await
    }
}
