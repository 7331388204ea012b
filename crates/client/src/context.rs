//! Wiring for a running client.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::ClientConfig;
use crate::gateway::{ApiClient, GatewayError};
use crate::identity::SessionContext;
use crate::realtime::{NotificationChannel, Viewer, WsConnector};
use crate::session::SessionStore;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, StorageError};

const SESSION_FILE: &str = "session.json";

/// Errors while assembling an [`AppContext`].
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to open client storage: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to build HTTP client: {0}")]
    Gateway(#[from] GatewayError),
}

/// Everything a screen needs, built once per process.
///
/// Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Arc<ClientConfig>,
    pub api: ApiClient,
    pub session: SessionStore,
    /// Per-process store for the cart and the payment handoff.
    pub transient: Arc<dyn KeyValueStore>,
    pub identity: SessionContext,
}

impl AppContext {
    /// Durable state lives in `<data_dir>/session.json`; transient state is
    /// in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be read or the HTTP
    /// client cannot be built.
    pub fn from_config(config: ClientConfig) -> Result<Self, ContextError> {
        let durable = FileStore::open(config.data_dir.join(SESSION_FILE))?;
        info!(path = %durable.path().display(), "Session storage opened");
        Self::with_stores(config, Arc::new(durable), Arc::new(MemoryStore::new()))
    }

    /// Assemble around caller-provided stores.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_stores(
        config: ClientConfig,
        durable: Arc<dyn KeyValueStore>,
        transient: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ContextError> {
        let session = SessionStore::new(durable);
        let api = ApiClient::new(&config, session.clone())?;
        let identity = SessionContext::new(api.clone());
        Ok(Self {
            config: Arc::new(config),
            api,
            session,
            transient,
            identity,
        })
    }

    /// A disconnected real-time channel for `viewer`, authenticated with the
    /// current access token and falling back to polling the gateway.
    #[must_use]
    pub fn channel_for(&self, viewer: Viewer) -> NotificationChannel {
        let token = self.session.access_token().ok().flatten();
        NotificationChannel::new(
            viewer,
            &self.config.ws_url,
            token.as_ref(),
            self.config.channel,
            Arc::new(WsConnector),
        )
        .with_unread_source(Arc::new(self.api.clone()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tableside_core::StoreId;
    use url::Url;

    use super::*;
    use crate::realtime::ConnectionState;

    fn context() -> AppContext {
        AppContext::with_stores(
            ClientConfig::new(Url::parse("http://localhost:8080/api").unwrap()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_components_share_the_session() {
        let ctx = context();
        ctx.session
            .set_tokens(&"a".to_string().into(), &"r".to_string().into())
            .unwrap();
        assert!(ctx.api.session().has_token());
        assert!(ctx.identity.api().session().has_token());
    }

    #[tokio::test]
    async fn test_channel_starts_idle() {
        let ctx = context();
        let channel = ctx.channel_for(Viewer::Admin {
            store_id: StoreId::new(1),
        });
        assert_eq!(channel.state(), ConnectionState::default());
    }
}
