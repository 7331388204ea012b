//! Incoming orders.
//!
//! Staff move each order along PENDING → PREPARING → COMPLETED → PICKED_UP,
//! or cancel it. The list reloads on a timer while the screen is open.

use std::time::Duration;

use tableside_client::ApiClient;
use tableside_core::{Order, OrderId, OrderStatus, StoreId};
use tracing::{info, instrument, warn};

use super::{format_price, upsert_by_id};
use crate::refresh::AutoRefresh;

/// Reload period for the live order list.
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(30);

/// One row of the order table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRowView {
    pub id: OrderId,
    pub order_number: String,
    pub seat: String,
    pub status: String,
    pub total: String,
    pub items: String,
    /// Label of the advance button, if the order can move forward.
    pub next_action: Option<String>,
}

impl From<&Order> for OrderRowView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            seat: order.seat_number.clone().unwrap_or_else(|| "-".to_string()),
            status: order.status.label().to_string(),
            total: format_price(order.total_amount),
            items: order
                .items
                .iter()
                .map(|item| format!("{} × {}", item.menu_name, item.quantity))
                .collect::<Vec<_>>()
                .join(", "),
            next_action: order.status.next().map(|next| next.label().to_string()),
        }
    }
}

#[derive(Debug)]
pub struct OrdersPage {
    api: ApiClient,
    store_id: StoreId,
    refresh: Option<AutoRefresh>,
    pub filter: Option<OrderStatus>,
    pub orders: Vec<Order>,
    pub loading: bool,
    pub error: Option<String>,
}

impl OrdersPage {
    #[must_use]
    pub const fn new(api: ApiClient, store_id: StoreId) -> Self {
        Self {
            api,
            store_id,
            refresh: None,
            filter: None,
            orders: Vec::new(),
            loading: false,
            error: None,
        }
    }

    #[instrument(skip(self), fields(store_id = %self.store_id, filter = ?self.filter))]
    pub async fn load(&mut self) {
        self.loading = true;
        match self.api.store_orders(self.store_id, self.filter).await {
            Ok(mut orders) => {
                orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                self.orders = orders;
                self.error = None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load orders");
                self.error = Some(e.user_message());
            }
        }
        self.loading = false;
    }

    /// Change the status filter and reload.
    pub async fn set_filter(&mut self, filter: Option<OrderStatus>) {
        self.filter = filter;
        self.load().await;
    }

    /// Move an order to its next status.
    #[instrument(skip(self))]
    pub async fn advance(&mut self, id: OrderId) -> bool {
        let Some(current) = self.orders.iter().find(|o| o.id == id).map(|o| o.status) else {
            self.error = Some("That order is no longer in the list.".to_string());
            return false;
        };
        let Some(next) = current.next() else {
            self.error = Some(format!("This order is already {}.", current.label().to_lowercase()));
            return false;
        };

        match self.api.update_order_status(id, next).await {
            Ok(order) => {
                info!(order_id = %id, from = %current, to = %next, "Order advanced");
                self.replace(order);
                self.error = None;
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to update order status");
                self.error = Some(e.user_message());
                false
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn cancel(&mut self, id: OrderId) -> bool {
        let Some(order) = self.orders.iter().find(|o| o.id == id) else {
            self.error = Some("That order is no longer in the list.".to_string());
            return false;
        };
        if order.status.is_terminal() {
            self.error = Some("This order can no longer be cancelled.".to_string());
            return false;
        }

        match self.api.cancel_order(id).await {
            Ok(order) => {
                info!(order_id = %id, "Order cancelled by staff");
                self.replace(order);
                self.error = None;
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to cancel order");
                self.error = Some(e.user_message());
                false
            }
        }
    }

    /// Put an updated order back, dropping it if it no longer matches the
    /// filter.
    fn replace(&mut self, order: Order) {
        if self.filter.is_some_and(|filter| filter != order.status) {
            self.orders.retain(|o| o.id != order.id);
        } else {
            upsert_by_id(&mut self.orders, order, |o| o.id);
        }
    }

    /// Start reloading every `period`. Replaces any running timer.
    pub fn start_auto_refresh(&mut self, period: Duration) {
        self.refresh = Some(AutoRefresh::start(period));
    }

    pub fn stop_auto_refresh(&mut self) {
        self.refresh = None;
    }

    #[must_use]
    pub const fn is_auto_refreshing(&self) -> bool {
        self.refresh.is_some()
    }

    /// Wait for the next timer tick, then reload. Returns `false` at once
    /// when auto-refresh is off.
    pub async fn next_refresh(&mut self) -> bool {
        let Some(refresh) = self.refresh.as_mut() else {
            return false;
        };
        refresh.tick().await;
        self.load().await;
        true
    }

    #[must_use]
    pub fn rows(&self) -> Vec<OrderRowView> {
        self.orders.iter().map(OrderRowView::from).collect()
    }
}
