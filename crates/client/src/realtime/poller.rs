//! Unread-count polling while the live channel is down.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use super::{ChannelEvent, ConnectionState, Viewer};
use crate::gateway::{ApiClient, GatewayError};

/// Where the poller gets its snapshot from.
pub trait UnreadCountSource: Send + Sync {
    fn fetch_unread_count(&self, viewer: Viewer) -> BoxFuture<'_, Result<u64, GatewayError>>;
}

impl UnreadCountSource for ApiClient {
    fn fetch_unread_count(&self, viewer: Viewer) -> BoxFuture<'_, Result<u64, GatewayError>> {
        Box::pin(self.unread_count(viewer))
    }
}

pub(super) struct Poller {
    pub viewer: Viewer,
    pub source: Arc<dyn UnreadCountSource>,
    pub state: watch::Receiver<ConnectionState>,
    pub events: broadcast::Sender<ChannelEvent>,
    pub grace: Duration,
    pub interval: Duration,
}

impl Poller {
    /// Poll whenever the channel has been offline for longer than the grace
    /// window; stand down as soon as it reports connected again.
    ///
    /// Returns once the channel's state sender is gone.
    pub async fn run(mut self) {
        loop {
            let offline = self
                .state
                .wait_for(|s| !s.is_connected())
                .await
                .is_ok();
            if !offline {
                return;
            }

            let back_in_grace = {
                let state = &mut self.state;
                tokio::time::timeout(self.grace, async move {
                    state.wait_for(ConnectionState::is_connected).await.is_ok()
                })
                .await
            };
            match back_in_grace {
                Ok(true) => continue,
                Ok(false) => return,
                Err(_elapsed) => {}
            }

            debug!(viewer = %self.viewer, "Channel offline, polling unread count");
            if !self.poll_until_connected().await {
                return;
            }
            debug!(viewer = %self.viewer, "Channel back online, polling stopped");
        }
    }

    /// Returns `false` if the state sender went away.
    async fn poll_until_connected(&mut self) -> bool {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            let state = &mut self.state;
            tokio::select! {
                connected = async move { state.wait_for(ConnectionState::is_connected).await.is_ok() } => {
                    return connected;
                }
                _ = ticker.tick() => {
                    match self.source.fetch_unread_count(self.viewer).await {
                        Ok(count) => {
                            let _ = self.events.send(ChannelEvent::UnreadCount(count));
                        }
                        Err(e) => warn!(viewer = %self.viewer, error = %e, "Unread count poll failed"),
                    }
                }
            }
        }
    }
}
