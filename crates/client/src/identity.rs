//! The current-user context.
//!
//! [`SessionContext`] is the single writer of "who is signed in". It is built
//! explicitly from a [`SessionStore`] and an [`ApiClient`] and publishes the
//! resolved [`Identity`] through a `watch` cell that screens and the route
//! guard read from.

use std::sync::Arc;

use secrecy::SecretString;
use tableside_core::Identity;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::gateway::{ApiClient, Credentials, GatewayError, SignupRequest};
use crate::session::SessionStore;
use crate::storage::StorageError;

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("failed to persist session: {0}")]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Text suitable for an inline form error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Gateway(e) => e.user_message(),
            Self::Storage(_) => "Could not save your session on this device.".to_string(),
        }
    }
}

/// What the context currently knows about the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentityState {
    /// `init()` has not finished.
    #[default]
    Resolving,
    /// No one is signed in.
    Anonymous,
    Resolved(Identity),
}

impl IdentityState {
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Resolved(identity) => Some(identity),
            Self::Resolving | Self::Anonymous => None,
        }
    }

    #[must_use]
    pub const fn is_resolving(&self) -> bool {
        matches!(self, Self::Resolving)
    }
}

/// Process-wide current-user state.
///
/// Cheap to clone; clones share the same state cell.
#[derive(Debug, Clone)]
pub struct SessionContext {
    api: ApiClient,
    state: Arc<watch::Sender<IdentityState>>,
}

impl SessionContext {
    /// Create a context in the `Resolving` state. Call [`init`](Self::init)
    /// before relying on it.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: Arc::new(watch::Sender::new(IdentityState::Resolving)),
        }
    }

    fn session(&self) -> &SessionStore {
        self.api.session()
    }

    /// Resolve the identity behind a stored token.
    ///
    /// With no token the context becomes anonymous without a network call.
    /// If the backend does not accept the token, the tokens are cleared.
    #[instrument(skip(self))]
    pub async fn init(&self) -> IdentityState {
        let next = if self.session().has_token() {
            match self.api.me().await {
                Ok(identity) => {
                    info!(user_id = %identity.id, role = %identity.role, "Session restored");
                    IdentityState::Resolved(identity)
                }
                Err(e) => {
                    warn!(error = %e, "Stored session is no longer valid");
                    if let Err(e) = self.session().clear_tokens() {
                        warn!(error = %e, "Failed to clear stale tokens");
                    }
                    IdentityState::Anonymous
                }
            }
        } else {
            IdentityState::Anonymous
        };
        self.state.send_replace(next.clone());
        next
    }

    /// Sign in. Tokens and identity are stored together or not at all.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the credentials or the tokens
    /// cannot be stored.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Identity, SessionError> {
        let response = self.api.login(credentials).await?;
        self.session().set_tokens(
            &SecretString::from(response.access_token),
            &SecretString::from(response.refresh_token),
        )?;
        info!(user_id = %response.user.id, role = %response.user.role, "Logged in");
        self.state
            .send_replace(IdentityState::Resolved(response.user.clone()));
        Ok(response.user)
    }

    /// Sign out. The backend is told on a best-effort basis; local state is
    /// cleared regardless.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if self.session().has_token() {
            if let Err(e) = self.api.logout().await {
                warn!(error = %e, "Backend logout failed, clearing local session anyway");
            }
        }
        if let Err(e) = self.session().clear_tokens() {
            warn!(error = %e, "Failed to clear tokens");
        }
        self.state.send_replace(IdentityState::Anonymous);
        info!("Logged out");
    }

    /// Register a staff account. The current identity is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration.
    pub async fn signup(&self, request: &SignupRequest) -> Result<Identity, SessionError> {
        Ok(self.api.signup(request).await?)
    }

    /// Replace the access token using the refresh token.
    ///
    /// # Errors
    ///
    /// Always fails: token refresh is not implemented.
    pub async fn refresh_tokens(&self) -> Result<(), SessionError> {
        Ok(self.api.refresh_access_token().await?)
    }

    /// Forget the in-memory identity. Stored tokens are kept, so a later
    /// `init()` can restore the session.
    pub fn teardown(&self) {
        self.state.send_replace(IdentityState::Resolving);
    }

    #[must_use]
    pub fn state(&self) -> IdentityState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    /// Signed in: an identity is resolved and a token is stored.
    ///
    /// A 401 from any call clears the token, so this turns false as soon as
    /// the backend stops accepting the session.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().identity().is_some() && self.session().has_token()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_resolving()
    }

    /// Observe identity changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<IdentityState> {
        self.state.subscribe()
    }

    /// The gateway this context signs requests for.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }
}
