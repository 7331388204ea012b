//! Bearer token persistence.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::storage::{KeyValueStore, StorageError};

const ACCESS_TOKEN_KEY: &str = "accessToken";
const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Holds the access and refresh tokens in a durable store.
///
/// The store has no notion of expiry; an expired token is only discovered
/// when the backend answers 401, at which point the gateway clears it.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("has_token", &self.has_token())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Whether an access token is stored.
    ///
    /// A read failure counts as "no token".
    #[must_use]
    pub fn has_token(&self) -> bool {
        matches!(self.access_token(), Ok(Some(_)))
    }

    /// The stored access token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    pub fn access_token(&self) -> Result<Option<SecretString>, StorageError> {
        self.read(ACCESS_TOKEN_KEY)
    }

    /// The stored refresh token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    pub fn refresh_token(&self) -> Result<Option<SecretString>, StorageError> {
        self.read(REFRESH_TOKEN_KEY)
    }

    /// Store both tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if either write fails; a half-written pair is
    /// cleared before returning.
    pub fn set_tokens(
        &self,
        access: &SecretString,
        refresh: &SecretString,
    ) -> Result<(), StorageError> {
        let written = self
            .store
            .set(ACCESS_TOKEN_KEY, access.expose_secret())
            .and_then(|()| self.store.set(REFRESH_TOKEN_KEY, refresh.expose_secret()));
        if let Err(e) = written {
            let _ = self.clear_tokens();
            return Err(e);
        }
        debug!("Session tokens stored");
        Ok(())
    }

    /// Remove both tokens.
    ///
    /// # Errors
    ///
    /// Returns the first removal error; both removals are always attempted.
    pub fn clear_tokens(&self) -> Result<(), StorageError> {
        let access = self.store.remove(ACCESS_TOKEN_KEY);
        let refresh = self.store.remove(REFRESH_TOKEN_KEY);
        debug!("Session tokens cleared");
        access.and(refresh)
    }

    fn read(&self, key: &str) -> Result<Option<SecretString>, StorageError> {
        Ok(self
            .store
            .get(key)?
            .filter(|token| !token.is_empty())
            .map(SecretString::from))
    }
}
