//! Staff identity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_helpers::timestamp_option;
use crate::types::{Email, Role, StoreId, UserId};

/// The resolved current-user record.
///
/// Distinct from the raw session tokens: holding a token does not make a
/// user authenticated until an `Identity` has been resolved for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,
    pub email: Email,
    #[serde(alias = "displayName")]
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub store_id: Option<StoreId>,
    #[serde(default = "default_active", alias = "active")]
    pub is_active: bool,
    #[serde(default, with = "timestamp_option", alias = "lastLoginAt")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp_option")]
    pub created_at: Option<DateTime<Utc>>,
}

const fn default_active() -> bool {
    true
}

impl Identity {
    /// Whether this identity may open owner-only screens.
    #[must_use]
    pub const fn is_master(&self) -> bool {
        self.role.is_elevated()
    }
}

/// Successful login payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(alias = "userInfo")]
    pub user: Identity,
}

/// Changes an owner can make to a sub-account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SubAccountUpdate {
    Active {
        #[serde(rename = "isActive")]
        is_active: bool,
    },
    Role { role: Role },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_backend_json() {
        let json = r#"{
            "id": 1,
            "email": "a@b.com",
            "name": "Owner",
            "role": "MASTER",
            "storeId": 10,
            "isActive": true,
            "lastLogin": "2024-05-01T09:00:00",
            "createdAt": "2024-01-01T00:00:00Z"
        }"#;
        let identity: Identity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.role, Role::Master);
        assert_eq!(identity.store_id, Some(StoreId::new(10)));
        assert!(identity.is_master());
        assert!(identity.last_login.is_some());
    }

    #[test]
    fn test_identity_defaults_for_missing_fields() {
        let json = r#"{"id": 2, "email": "sub@cafe.com", "name": "Staff", "role": "SUB"}"#;
        let identity: Identity = serde_json::from_str(json).unwrap();
        assert!(identity.is_active);
        assert!(identity.store_id.is_none());
        assert!(!identity.is_master());
    }

    #[test]
    fn test_sub_account_update_payloads() {
        let active = serde_json::to_value(SubAccountUpdate::Active { is_active: false }).unwrap();
        assert_eq!(active, serde_json::json!({"isActive": false}));

        let role = serde_json::to_value(SubAccountUpdate::Role { role: Role::Master }).unwrap();
        assert_eq!(role, serde_json::json!({"role": "MASTER"}));
    }
}
