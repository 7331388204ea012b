//! Real-time notification channel.
//!
//! One [`NotificationChannel`] serves one viewer: a store's staff or the
//! customer waiting on one order. It speaks STOMP over a WebSocket,
//! reconnects a bounded number of times, and while offline polls the unread
//! count so badges stay roughly current.
//!
//! Events reach page controllers through a broadcast queue; see
//! [`NotificationChannel::subscribe`].

mod channel;
mod poller;
pub mod state;
pub mod stomp;
mod transport;

use std::time::Duration;

use tableside_core::{Notification, OrderId, StoreId};
use thiserror::Error;

pub use channel::{NotificationChannel, Subscription};
pub use poller::UnreadCountSource;
pub use state::{ConnectionState, Retry, RetryPolicy, Signal};
pub use stomp::{Frame, FrameError};
pub use transport::{Connector, Transport, WsConnector};

/// Errors from the transport or handshake.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("handshake rejected: {0}")]
    Handshake(String),
    #[error("handshake timed out")]
    Timeout,
    #[error("connection closed")]
    Closed,
}

/// Who is listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Viewer {
    /// Staff of a store: every order event of that store.
    Admin { store_id: StoreId },
    /// A customer: events about one order.
    Customer { order_id: OrderId },
}

impl Viewer {
    /// Topic name, e.g. `admin/3` or `customer/42`.
    #[must_use]
    pub fn topic(&self) -> String {
        match self {
            Self::Admin { store_id } => format!("admin/{store_id}"),
            Self::Customer { order_id } => format!("customer/{order_id}"),
        }
    }

    /// STOMP destination for the topic.
    #[must_use]
    pub fn destination(&self) -> String {
        format!("/topic/{}", self.topic())
    }

    /// REST path segment for the viewer's notification list.
    #[must_use]
    pub fn path(&self) -> String {
        self.topic()
    }
}

impl std::fmt::Display for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.topic())
    }
}

/// Something the channel delivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Pushed over the live connection.
    Notification(Notification),
    /// Fetched by the offline poller. A snapshot, so it may be older than a
    /// notification delivered just before it.
    UnreadCount(u64),
}

/// Channel tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Consecutive handshake attempts before giving up.
    pub max_attempts: u32,
    /// Base of the linear reconnect delay.
    pub reconnect_base: Duration,
    pub handshake_timeout: Duration,
    /// Unread-count polling period while offline.
    pub poll_interval: Duration,
    /// How long the channel must stay offline before polling starts.
    pub poll_grace: Duration,
    /// Broadcast queue depth per subscriber.
    pub event_capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            reconnect_base: Duration::from_secs(3),
            handshake_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(30),
            poll_grace: Duration::from_secs(5),
            event_capacity: 64,
        }
    }
}

impl ChannelConfig {
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: self.reconnect_base,
        }
    }
}
