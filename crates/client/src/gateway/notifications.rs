//! Notification endpoints.

use serde::Deserialize;
use serde::de::IgnoredAny;
use tableside_core::{Notification, NotificationId, StoreId, UnreadCount};
use tracing::instrument;

use super::{ApiClient, GatewayError};
use crate::realtime::Viewer;

/// The unread-count endpoint answers either a bare number or `{count}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum UnreadPayload {
    Bare(u64),
    Wrapped(UnreadCount),
}

impl ApiClient {
    /// Notifications addressed to a viewer, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(viewer = %viewer))]
    pub async fn notifications(&self, viewer: Viewer) -> Result<Vec<Notification>, GatewayError> {
        self.get(&format!("/notifications/{}", viewer.path())).await
    }

    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(viewer = %viewer))]
    pub async fn unread_count(&self, viewer: Viewer) -> Result<u64, GatewayError> {
        let payload: UnreadPayload = self
            .get(&format!("/notifications/{}/unread-count", viewer.path()))
            .await?;
        Ok(match payload {
            UnreadPayload::Bare(count) => count,
            UnreadPayload::Wrapped(wrapped) => wrapped.count,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(notification_id = %id))]
    pub async fn mark_notification_read(&self, id: NotificationId) -> Result<(), GatewayError> {
        self.patch::<IgnoredAny, ()>(&format!("/notifications/{id}/read"), None)
            .await
            .map(|_| ())
    }

    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self), fields(store_id = %store_id))]
    pub async fn mark_all_notifications_read(&self, store_id: StoreId) -> Result<(), GatewayError> {
        self.patch::<IgnoredAny, ()>(&format!("/notifications/admin/{store_id}/read-all"), None)
            .await
            .map(|_| ())
    }
}
