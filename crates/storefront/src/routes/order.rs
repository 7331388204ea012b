//! Order tracking.
//!
//! After payment the customer watches their order move from received to
//! ready. The tracker listens on the order's `customer/{orderId}` topic and
//! reloads the order whenever a notification about it arrives.

use tableside_client::realtime::Subscription;
use tableside_client::{ApiClient, ChannelEvent, NotificationChannel};
use tableside_core::{Notification, Order, OrderId, OrderStatus};
use tracing::{debug, info, instrument, warn};

use super::format_price;

/// The steps shown on the progress bar, in order.
pub const PROGRESS_STEPS: [OrderStatus; 4] = [
    OrderStatus::Pending,
    OrderStatus::Preparing,
    OrderStatus::Completed,
    OrderStatus::PickedUp,
];

/// Order display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderView {
    pub order_number: String,
    pub status: String,
    /// Index into [`PROGRESS_STEPS`]; `None` once cancelled.
    pub step: Option<usize>,
    pub total: String,
    pub lines: Vec<String>,
    pub cancelable: bool,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            order_number: order.order_number.clone(),
            status: order.status.label().to_string(),
            step: PROGRESS_STEPS.iter().position(|s| *s == order.status),
            total: format_price(order.total_amount),
            lines: order
                .items
                .iter()
                .map(|item| match &item.options {
                    Some(options) => format!("{} × {} ({options})", item.menu_name, item.quantity),
                    None => format!("{} × {}", item.menu_name, item.quantity),
                })
                .collect(),
            cancelable: order.cancelable,
        }
    }
}

/// Controller for the order tracking screen.
///
/// Owns the channel it is attached to; [`close`](Self::close) or dropping
/// the tracker disconnects it.
#[derive(Debug)]
pub struct OrderTracker {
    api: ApiClient,
    order_id: OrderId,
    channel: Option<NotificationChannel>,
    events: Option<Subscription>,
    pub order: Option<Order>,
    pub last_message: Option<String>,
    pub error: Option<String>,
}

impl OrderTracker {
    #[must_use]
    pub fn new(api: ApiClient, order_id: OrderId) -> Self {
        Self {
            api,
            order_id,
            channel: None,
            events: None,
            order: None,
            last_message: None,
            error: None,
        }
    }

    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Fetch the order. Returns whether it loaded.
    #[instrument(skip(self), fields(order_id = %self.order_id))]
    pub async fn load(&mut self) -> bool {
        match self.api.order(self.order_id).await {
            Ok(order) => {
                debug!(status = %order.status, "Order loaded");
                self.order = Some(order);
                self.error = None;
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to load order");
                self.error = Some(if e.status() == Some(404) {
                    "We could not find this order.".to_string()
                } else {
                    e.user_message()
                });
                false
            }
        }
    }

    /// Start listening on `channel`, which must be the order's customer
    /// channel. Attaching again replaces the previous channel.
    pub fn attach(&mut self, channel: NotificationChannel) {
        self.events = Some(channel.subscribe());
        channel.connect();
        self.channel = Some(channel);
    }

    /// Wait for the next notification about this order and reload it.
    ///
    /// Returns `None` once the order is finished or no channel is attached.
    pub async fn next_update(&mut self) -> Option<Notification> {
        if self.is_finished() {
            return None;
        }
        loop {
            let event = self.events.as_mut()?.recv().await?;
            let ChannelEvent::Notification(notification) = event else {
                continue;
            };
            if notification.order_id != Some(self.order_id) {
                debug!(notification_id = %notification.id, "Ignoring notification for another order");
                continue;
            }
            info!(order_id = %self.order_id, kind = ?notification.kind, "Order update");
            self.last_message = Some(notification.message.clone());
            self.load().await;
            return Some(notification);
        }
    }

    /// Cancel the order, if the backend still allows it.
    #[instrument(skip(self), fields(order_id = %self.order_id))]
    pub async fn cancel(&mut self) -> bool {
        if !self.order.as_ref().is_some_and(|o| o.cancelable) {
            self.error = Some("This order can no longer be cancelled.".to_string());
            return false;
        }
        match self.api.cancel_order(self.order_id).await {
            Ok(order) => {
                info!("Order cancelled by customer");
                self.order = Some(order);
                self.error = None;
                true
            }
            Err(e) => {
                warn!(error = %e, "Cancel failed");
                self.error = Some(e.user_message());
                false
            }
        }
    }

    /// Whether the order has reached a terminal status.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.order.as_ref().is_some_and(|o| o.status.is_terminal())
    }

    #[must_use]
    pub fn view(&self) -> Option<OrderView> {
        self.order.as_ref().map(OrderView::from)
    }

    /// Leave the screen: disconnect the channel.
    pub async fn close(mut self) {
        self.events = None;
        if let Some(channel) = self.channel.take() {
            channel.disconnect().await;
        }
    }
}
