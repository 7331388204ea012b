//! Notifications pushed or polled from the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_helpers::{timestamp, timestamp_option};
use crate::types::{NotificationId, NotificationType, OrderId, StoreId, TargetAudience};

/// A notification addressed to a customer or to store staff.
///
/// Created by the backend; the only client-side mutation is the read
/// transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub store_id: StoreId,
    #[serde(alias = "targetAudience")]
    pub target_type: TargetAudience,
    pub message: String,
    #[serde(rename = "type", alias = "notificationType")]
    pub kind: NotificationType,
    #[serde(default, alias = "read")]
    pub is_read: bool,
    #[serde(with = "timestamp", alias = "createdAt")]
    pub sent_at: DateTime<Utc>,
    #[serde(default, with = "timestamp_option")]
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Mark as read locally, stamping the read time.
    pub fn mark_read(&mut self, at: DateTime<Utc>) {
        self.is_read = true;
        self.read_at = Some(at);
    }
}

/// Unread-count snapshot payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    #[serde(alias = "unreadCount")]
    pub count: u64,
}
