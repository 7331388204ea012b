//! Login and signup screens.

use secrecy::SecretString;
use tableside_client::gateway::{Credentials, SignupRequest};
use tableside_client::guard::{LOGIN_PATH, post_login_target};
use tableside_client::SessionContext;
use tableside_core::{Email, Identity};
use tracing::{info, instrument, warn};

use crate::error::{FormError, required};

/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Controller for the login screen.
#[derive(Debug)]
pub struct LoginPage {
    session: SessionContext,
    /// Path the guard redirected from, if any.
    from: Option<String>,
    pub email: String,
    pub password: String,
    pub submitting: bool,
    pub error: Option<String>,
}

impl LoginPage {
    #[must_use]
    pub const fn new(session: SessionContext, from: Option<String>) -> Self {
        Self {
            session,
            from,
            email: String::new(),
            password: String::new(),
            submitting: false,
            error: None,
        }
    }

    /// # Errors
    ///
    /// Returns the first field that blocks submission.
    pub fn validate(&self) -> Result<Credentials, FormError> {
        required("email", &self.email)?;
        let email = Email::parse(&self.email)?;
        if self.password.is_empty() {
            return Err(FormError::Required("password"));
        }
        Ok(Credentials {
            email,
            password: SecretString::from(self.password.clone()),
        })
    }

    /// Log in. Returns the path to navigate to on success.
    ///
    /// The password field is cleared whatever the outcome.
    #[instrument(skip(self))]
    pub async fn submit(&mut self) -> Option<String> {
        if self.submitting {
            return None;
        }
        let credentials = match self.validate() {
            Ok(credentials) => credentials,
            Err(e) => {
                self.error = Some(e.user_message());
                return None;
            }
        };
        self.password.clear();
        self.submitting = true;
        self.error = None;

        let result = self.session.login(&credentials).await;
        self.submitting = false;
        match result {
            Ok(identity) if !identity.is_active => {
                warn!(user_id = %identity.id, "Deactivated account tried to log in");
                self.session.logout().await;
                self.error = Some("This account has been deactivated. Ask the store owner for access.".to_string());
                None
            }
            Ok(identity) => {
                let target = post_login_target(self.from.as_deref()).to_string();
                info!(user_id = %identity.id, %target, "Login succeeded");
                Some(target)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.error = Some(e.user_message());
                None
            }
        }
    }
}

/// Controller for the signup screen.
#[derive(Debug)]
pub struct SignupPage {
    session: SessionContext,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub name: String,
    pub submitting: bool,
    pub created: Option<Identity>,
    pub error: Option<String>,
}

impl SignupPage {
    #[must_use]
    pub const fn new(session: SessionContext) -> Self {
        Self {
            session,
            email: String::new(),
            password: String::new(),
            password_confirm: String::new(),
            name: String::new(),
            submitting: false,
            created: None,
            error: None,
        }
    }

    /// # Errors
    ///
    /// Returns the first field that blocks submission.
    pub fn validate(&self) -> Result<SignupRequest, FormError> {
        required("email", &self.email)?;
        let email = Email::parse(&self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FormError::TooShort {
                field: "password",
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.password != self.password_confirm {
            return Err(FormError::PasswordMismatch);
        }
        let name = required("name", &self.name)?;
        Ok(SignupRequest {
            email,
            password: SecretString::from(self.password.clone()),
            name,
        })
    }

    /// Register. Returns the login path to navigate to on success; signing
    /// up does not sign in.
    #[instrument(skip(self))]
    pub async fn submit(&mut self) -> Option<&'static str> {
        if self.submitting {
            return None;
        }
        let request = match self.validate() {
            Ok(request) => request,
            Err(e) => {
                self.error = Some(e.user_message());
                return None;
            }
        };
        self.submitting = true;
        self.error = None;

        let result = self.session.signup(&request).await;
        self.submitting = false;
        match result {
            Ok(identity) => {
                info!(user_id = %identity.id, "Account created");
                self.password.clear();
                self.password_confirm.clear();
                self.created = Some(identity);
                Some(LOGIN_PATH)
            }
            Err(e) => {
                warn!(error = %e, "Signup failed");
                self.error = Some(e.user_message());
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tableside_client::{ApiClient, ClientConfig, MemoryStore, SessionStore};
    use url::Url;

    use super::*;

    fn session() -> SessionContext {
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:1").unwrap());
        let api = ApiClient::new(&config, SessionStore::new(Arc::new(MemoryStore::new()))).unwrap();
        SessionContext::new(api)
    }

    #[tokio::test]
    async fn test_login_validation_blocks_submit() {
        let mut page = LoginPage::new(session(), None);
        page.email = "owner@localhost".to_string();
        page.password = "secret1".to_string();
        assert!(page.submit().await.is_none());
        assert_eq!(
            page.error.as_deref(),
            Some("Please enter a valid email address.")
        );

        page.email = "a@b.com".to_string();
        page.password.clear();
        assert_eq!(page.validate().unwrap_err(), FormError::Required("password"));
    }

    #[test]
    fn test_signup_validation() {
        let mut page = SignupPage::new(session());
        page.email = "a@b.com".to_string();
        page.password = "12345".to_string();
        page.password_confirm = "12345".to_string();
        page.name = "Kim".to_string();
        assert_eq!(
            page.validate().unwrap_err(),
            FormError::TooShort {
                field: "password",
                min: 6
            }
        );

        page.password = "123456".to_string();
        assert_eq!(page.validate().unwrap_err(), FormError::PasswordMismatch);

        page.password_confirm = "123456".to_string();
        page.name = "  ".to_string();
        assert_eq!(page.validate().unwrap_err(), FormError::Required("name"));

        page.name = " Kim ".to_string();
        let request = page.validate().unwrap();
        assert_eq!(request.name, "Kim");
        assert_eq!(request.email.as_str(), "a@b.com");
    }
}
