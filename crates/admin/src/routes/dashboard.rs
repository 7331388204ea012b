//! Dashboard: today's numbers and the latest orders.

use tableside_client::{ApiClient, GatewayError};
use tableside_core::{DashboardStats, Identity, Order, StoreId};
use tracing::{instrument, warn};

use super::{format_price, resolve_store};

/// How many orders the "recent orders" panel shows.
pub const RECENT_ORDERS: usize = 5;

/// Stat card values, formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsView {
    pub today_orders: u32,
    pub today_revenue: String,
    pub pending: u32,
    pub preparing: u32,
}

impl From<&DashboardStats> for StatsView {
    fn from(stats: &DashboardStats) -> Self {
        Self {
            today_orders: stats.today_order_count,
            today_revenue: format_price(stats.today_revenue),
            pending: stats.pending_order_count,
            preparing: stats.preparing_order_count,
        }
    }
}

#[derive(Debug)]
pub struct DashboardPage {
    api: ApiClient,
    identity: Identity,
    pub store_id: Option<StoreId>,
    pub stats: Option<DashboardStats>,
    pub recent_orders: Vec<Order>,
    pub loading: bool,
    pub error: Option<String>,
}

impl DashboardPage {
    #[must_use]
    pub const fn new(api: ApiClient, identity: Identity) -> Self {
        Self {
            api,
            identity,
            store_id: None,
            stats: None,
            recent_orders: Vec::new(),
            loading: false,
            error: None,
        }
    }

    #[instrument(skip(self), fields(user_id = %self.identity.id))]
    pub async fn load(&mut self) {
        self.loading = true;
        self.error = None;
        if let Err(e) = self.try_load().await {
            warn!(error = %e, "Failed to load dashboard");
            self.error = Some(e.user_message());
        }
        self.loading = false;
    }

    async fn try_load(&mut self) -> Result<(), GatewayError> {
        let Some(store_id) = resolve_store(&self.api, &self.identity).await? else {
            self.error = Some("Create your store to start taking orders.".to_string());
            return Ok(());
        };
        self.store_id = Some(store_id);

        let (stats, mut orders) = tokio::try_join!(
            self.api.dashboard_stats(store_id),
            self.api.store_orders(store_id, None),
        )?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(RECENT_ORDERS);

        self.stats = Some(stats);
        self.recent_orders = orders;
        Ok(())
    }

    #[must_use]
    pub fn stats_view(&self) -> Option<StatsView> {
        self.stats.as_ref().map(StatsView::from)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_stats_view_formats_revenue() {
        let stats = DashboardStats {
            today_order_count: 12,
            today_revenue: Decimal::new(54_000, 0),
            pending_order_count: 2,
            preparing_order_count: 1,
        };
        let view = StatsView::from(&stats);
        assert_eq!(view.today_revenue, "₩54,000");
        assert_eq!(view.today_orders, 12);
    }
}
