//! Authentication endpoints.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::IgnoredAny;
use tableside_core::{Email, Identity, LoginResponse};
use tracing::instrument;

use super::{ApiClient, GatewayError};

/// Login form input.
#[derive(Clone)]
pub struct Credentials {
    pub email: Email,
    pub password: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Staff registration input.
#[derive(Clone)]
pub struct SignupRequest {
    pub email: Email,
    pub password: SecretString,
    pub name: String,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignupBody<'a> {
    email: &'a str,
    password: &'a str,
    name: &'a str,
}

impl ApiClient {
    /// Exchange credentials for tokens and the caller's identity.
    ///
    /// Does not store the tokens; that is the session context's job.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the credentials or the call
    /// fails.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, GatewayError> {
        let body = LoginBody {
            email: credentials.email.as_str(),
            password: credentials.password.expose_secret(),
        };
        self.post("/auth/login", &body).await
    }

    /// Register a staff account.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration or the call
    /// fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn signup(&self, request: &SignupRequest) -> Result<Identity, GatewayError> {
        let body = SignupBody {
            email: request.email.as_str(),
            password: request.password.expose_secret(),
            name: request.name.trim(),
        };
        self.post("/auth/signup", &body).await
    }

    /// Fetch the identity the stored token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the token is missing, expired or revoked.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<Identity, GatewayError> {
        self.get("/auth/me").await
    }

    /// Tell the backend the session is over.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), GatewayError> {
        self.request::<IgnoredAny, ()>(reqwest::Method::POST, "/auth/logout", None)
            .await
            .map(|_| ())
    }

    /// Replace the access token using the stored refresh token.
    ///
    /// Not implemented: the backend issues long-lived access tokens and an
    /// expired one sends the user back to login.
    ///
    /// # Errors
    ///
    /// Always returns an `Unsupported` error.
    pub async fn refresh_access_token(&self) -> Result<(), GatewayError> {
        Err(GatewayError::unsupported("token refresh is not implemented"))
    }
}
