//! Notification center.
//!
//! Holds the viewer's notification list and unread badge. Live pushes and
//! offline polling both feed it through [`NotificationCenter::apply`].
//! Marking as read is applied locally first and rolled back if the backend
//! refuses.

use chrono::Utc;
use tableside_client::realtime::Subscription;
use tableside_client::{ApiClient, ChannelEvent, GatewayError, NotificationChannel, Viewer};
use tableside_core::{Notification, NotificationId};
use tracing::{debug, info, instrument, warn};

#[derive(Debug)]
pub struct NotificationCenter {
    api: ApiClient,
    viewer: Viewer,
    channel: Option<NotificationChannel>,
    events: Option<Subscription>,
    /// Newest first.
    pub notifications: Vec<Notification>,
    pub unread: u64,
    pub error: Option<String>,
}

impl NotificationCenter {
    #[must_use]
    pub const fn new(api: ApiClient, viewer: Viewer) -> Self {
        Self {
            api,
            viewer,
            channel: None,
            events: None,
            notifications: Vec::new(),
            unread: 0,
            error: None,
        }
    }

    #[must_use]
    pub const fn viewer(&self) -> Viewer {
        self.viewer
    }

    #[instrument(skip(self), fields(viewer = %self.viewer))]
    pub async fn load(&mut self) {
        let result = tokio::try_join!(
            self.api.notifications(self.viewer),
            self.api.unread_count(self.viewer),
        );
        match result {
            Ok((mut notifications, unread)) => {
                notifications.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
                self.notifications = notifications;
                self.unread = unread;
                self.error = None;
            }
            Err(e) => self.fail(&e),
        }
    }

    /// Fold a channel event into the list and badge.
    ///
    /// An unread push bumps the badge. A polled count replaces it, even if
    /// a push landed after the poll was taken.
    pub fn apply(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Notification(notification) => {
                if self.notifications.iter().any(|n| n.id == notification.id) {
                    debug!(notification_id = %notification.id, "Duplicate push ignored");
                    return;
                }
                if !notification.is_read {
                    self.unread += 1;
                }
                self.notifications.insert(0, notification);
            }
            ChannelEvent::UnreadCount(count) => self.unread = count,
        }
    }

    /// Start listening on `channel`. Attaching again replaces the previous
    /// channel.
    pub fn attach(&mut self, channel: NotificationChannel) {
        self.events = Some(channel.subscribe());
        channel.connect();
        self.channel = Some(channel);
    }

    /// Wait for the next channel event and apply it. Returns `None` when no
    /// channel is attached or it has gone away.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        let event = self.events.as_mut()?.recv().await?;
        self.apply(event.clone());
        Some(event)
    }

    /// Mark one notification read.
    #[instrument(skip(self), fields(viewer = %self.viewer))]
    pub async fn mark_as_read(&mut self, id: NotificationId) -> bool {
        let Some(entry) = self.notifications.iter_mut().find(|n| n.id == id) else {
            self.error = Some("That notification no longer exists.".to_string());
            return false;
        };
        if entry.is_read {
            return true;
        }

        let previous = entry.clone();
        entry.mark_read(Utc::now());
        let previous_unread = self.unread;
        self.unread = self.unread.saturating_sub(1);

        match self.api.mark_notification_read(id).await {
            Ok(()) => {
                debug!(notification_id = %id, "Notification marked read");
                self.error = None;
                true
            }
            Err(e) => {
                if let Some(slot) = self.notifications.iter_mut().find(|n| n.id == id) {
                    *slot = previous;
                }
                self.unread = previous_unread;
                self.fail(&e);
                false
            }
        }
    }

    /// Mark everything read. Only staff viewers have a store-wide list.
    #[instrument(skip(self), fields(viewer = %self.viewer))]
    pub async fn mark_all_as_read(&mut self) -> bool {
        let Viewer::Admin { store_id } = self.viewer else {
            self.error = Some("Only staff can clear all notifications.".to_string());
            return false;
        };

        let previous = self.notifications.clone();
        let previous_unread = self.unread;
        let now = Utc::now();
        for notification in self.notifications.iter_mut().filter(|n| !n.is_read) {
            notification.mark_read(now);
        }
        self.unread = 0;

        match self.api.mark_all_notifications_read(store_id).await {
            Ok(()) => {
                info!(%store_id, "All notifications marked read");
                self.error = None;
                true
            }
            Err(e) => {
                self.notifications = previous;
                self.unread = previous_unread;
                self.fail(&e);
                false
            }
        }
    }

    /// Disconnect the attached channel, if any.
    pub async fn close(mut self) {
        self.events = None;
        if let Some(channel) = self.channel.take() {
            channel.disconnect().await;
        }
    }

    fn fail(&mut self, e: &GatewayError) {
        warn!(error = %e, "Notification update failed");
        self.error = Some(e.user_message());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tableside_client::{ClientConfig, MemoryStore, SessionStore};
    use tableside_core::{NotificationType, StoreId, TargetAudience};
    use url::Url;

    use super::*;

    fn center() -> NotificationCenter {
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:1").unwrap());
        let api = ApiClient::new(&config, SessionStore::new(Arc::new(MemoryStore::new()))).unwrap();
        NotificationCenter::new(api, Viewer::Admin { store_id: StoreId::new(1) })
    }

    fn push(id: i64, is_read: bool) -> Notification {
        Notification {
            id: NotificationId::new(id),
            order_id: None,
            store_id: StoreId::new(1),
            target_type: TargetAudience::Admin,
            message: format!("New order #{id}"),
            kind: NotificationType::OrderReceived,
            is_read,
            sent_at: Utc::now(),
            read_at: None,
        }
    }

    #[test]
    fn test_apply_counts_unread_pushes_once() {
        let mut center = center();
        center.apply(ChannelEvent::Notification(push(1, false)));
        center.apply(ChannelEvent::Notification(push(1, false)));
        center.apply(ChannelEvent::Notification(push(2, true)));
        assert_eq!(center.unread, 1);
        assert_eq!(center.notifications.len(), 2);
        assert_eq!(center.notifications[0].id, NotificationId::new(2));
    }

    #[test]
    fn test_polled_count_overwrites_badge() {
        let mut center = center();
        center.apply(ChannelEvent::Notification(push(1, false)));
        center.apply(ChannelEvent::UnreadCount(0));
        assert_eq!(center.unread, 0);
    }

    #[tokio::test]
    async fn test_mark_as_read_rolls_back_on_failure() {
        let mut center = center();
        center.apply(ChannelEvent::Notification(push(1, false)));

        assert!(!center.mark_as_read(NotificationId::new(1)).await);
        assert_eq!(center.unread, 1);
        assert!(!center.notifications[0].is_read);
        assert!(center.notifications[0].read_at.is_none());
        assert!(center.error.is_some());

        assert!(!center.mark_all_as_read().await);
        assert_eq!(center.unread, 1);
        assert!(!center.notifications[0].is_read);
    }

    #[tokio::test]
    async fn test_customer_cannot_mark_all() {
        let mut center = center();
        center.viewer = Viewer::Customer {
            order_id: tableside_core::OrderId::new(4),
        };
        assert!(!center.mark_all_as_read().await);
        assert_eq!(
            center.error.as_deref(),
            Some("Only staff can clear all notifications.")
        );
    }
}
