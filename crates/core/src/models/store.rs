//! Store configuration and dashboard figures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{StoreId, UserId};

/// A café location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub business_hours: Option<String>,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default = "default_open", alias = "open")]
    pub is_open: bool,
}

const fn default_open() -> bool {
    true
}

/// Create/update payload for a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_hours: Option<String>,
    pub is_open: bool,
}

impl From<&Store> for StoreInput {
    fn from(store: &Store) -> Self {
        Self {
            name: store.name.clone(),
            address: store.address.clone(),
            phone: store.phone.clone(),
            description: store.description.clone(),
            business_hours: store.business_hours.clone(),
            is_open: store.is_open,
        }
    }
}

/// Today's figures for a store's dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub today_order_count: u32,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub today_revenue: Decimal,
    #[serde(default)]
    pub pending_order_count: u32,
    #[serde(default)]
    pub preparing_order_count: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_store_input_from_store_skips_empty_fields() {
        let store: Store =
            serde_json::from_str(r#"{"id": 1, "name": "Blue Bottle", "phone": "02-123"}"#)
                .unwrap();
        assert!(store.is_open);

        let input = StoreInput::from(&store);
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Blue Bottle", "phone": "02-123", "isOpen": true})
        );
    }

    #[test]
    fn test_dashboard_stats_numeric_revenue() {
        let stats: DashboardStats =
            serde_json::from_str(r#"{"todayOrderCount": 4, "todayRevenue": 18000}"#).unwrap();
        assert_eq!(stats.today_order_count, 4);
        assert_eq!(stats.today_revenue, Decimal::new(18_000, 0));
    }
}
