//! Staff screens.
//!
//! # Route Structure
//!
//! ```text
//! # Public
//! /admin/login            - Login
//! /admin/signup           - Staff registration
//!
//! # Any active staff member
//! /admin/dashboard        - Today's numbers and recent orders
//! /admin/orders           - Incoming orders by status
//! /admin/menus            - Menu items
//! /admin/categories       - Menu categories
//! /admin/seats            - Seats and QR codes
//! /admin/notifications    - Notification center
//!
//! # Owner (MASTER) only
//! /admin/store            - Store settings
//! /admin/sub-accounts     - Staff accounts
//! ```

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod menus;
pub mod notifications;
pub mod orders;
pub mod seats;
pub mod settings;
pub mod sub_accounts;

use rust_decimal::Decimal;
use tableside_client::guard::{self, GuardOutcome};
use tableside_client::{ApiClient, GatewayError, SessionContext};
use tableside_core::{Identity, Price, StoreId};

pub use auth::{LoginPage, SignupPage};
pub use categories::CategoriesPage;
pub use dashboard::DashboardPage;
pub use menus::MenusPage;
pub use notifications::NotificationCenter;
pub use orders::OrdersPage;
pub use seats::SeatsPage;
pub use settings::StoreSettingsPage;
pub use sub_accounts::SubAccountsPage;

/// Every admin screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminRoute {
    Login,
    Signup,
    Dashboard,
    Orders,
    Menus,
    Categories,
    Seats,
    Notifications,
    StoreSettings,
    SubAccounts,
}

impl AdminRoute {
    pub const ALL: [Self; 10] = [
        Self::Login,
        Self::Signup,
        Self::Dashboard,
        Self::Orders,
        Self::Menus,
        Self::Categories,
        Self::Seats,
        Self::Notifications,
        Self::StoreSettings,
        Self::SubAccounts,
    ];

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => guard::LOGIN_PATH,
            Self::Signup => "/admin/signup",
            Self::Dashboard => guard::DEFAULT_AFTER_LOGIN,
            Self::Orders => "/admin/orders",
            Self::Menus => "/admin/menus",
            Self::Categories => "/admin/categories",
            Self::Seats => "/admin/seats",
            Self::Notifications => "/admin/notifications",
            Self::StoreSettings => "/admin/store",
            Self::SubAccounts => "/admin/sub-accounts",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Login => "Log in",
            Self::Signup => "Sign up",
            Self::Dashboard => "Dashboard",
            Self::Orders => "Orders",
            Self::Menus => "Menu",
            Self::Categories => "Categories",
            Self::Seats => "Seats",
            Self::Notifications => "Notifications",
            Self::StoreSettings => "Store settings",
            Self::SubAccounts => "Staff accounts",
        }
    }

    /// Reachable without signing in.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Login | Self::Signup)
    }

    /// Owner-only.
    #[must_use]
    pub const fn requires_master(self) -> bool {
        matches!(self, Self::StoreSettings | Self::SubAccounts)
    }

    /// Look a route up by path; a trailing slash is ignored.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };
        Self::ALL.into_iter().find(|route| route.path() == path)
    }

    /// Decide whether the current session may open this route.
    #[must_use]
    pub fn check(self, session: &SessionContext) -> GuardOutcome {
        if self.is_public() {
            return GuardOutcome::Allow;
        }
        guard::check(session, self.path(), self.requires_master())
    }

    /// Routes to show in the navigation for `identity`.
    #[must_use]
    pub fn navigation(identity: &Identity) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|route| !route.is_public())
            .filter(|route| !route.requires_master() || identity.is_master())
            .collect()
    }
}

/// The store a staff member works in.
///
/// Sub-accounts are bound to one store; an owner without one falls back to
/// the first store they own.
///
/// # Errors
///
/// Returns an error if the owner's stores cannot be listed. `Ok(None)` means
/// the owner has not created a store yet.
pub async fn resolve_store(api: &ApiClient, identity: &Identity) -> Result<Option<StoreId>, GatewayError> {
    if let Some(store_id) = identity.store_id {
        return Ok(Some(store_id));
    }
    if !identity.is_master() {
        return Ok(None);
    }
    Ok(api.my_stores().await?.first().map(|store| store.id))
}

/// Insert `item`, or replace the entry with the same id.
fn upsert_by_id<T, K: PartialEq>(list: &mut Vec<T>, item: T, id: impl Fn(&T) -> K) {
    let key = id(&item);
    match list.iter_mut().find(|existing| id(&**existing) == key) {
        Some(existing) => *existing = item,
        None => list.push(item),
    }
}

fn format_price(amount: Decimal) -> String {
    Price::krw(amount).display()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_route_table() {
        assert_eq!(AdminRoute::from_path("/admin/orders"), Some(AdminRoute::Orders));
        assert_eq!(AdminRoute::from_path("/admin/orders/"), Some(AdminRoute::Orders));
        assert_eq!(
            AdminRoute::from_path("/admin/sub-accounts?tab=all"),
            Some(AdminRoute::SubAccounts)
        );
        assert_eq!(AdminRoute::from_path("/admin/unknown"), None);

        let owner_only: Vec<_> = AdminRoute::ALL
            .into_iter()
            .filter(|r| r.requires_master())
            .collect();
        assert_eq!(owner_only, vec![AdminRoute::StoreSettings, AdminRoute::SubAccounts]);
        assert_eq!(AdminRoute::Dashboard.path(), "/admin/dashboard");
    }

    #[test]
    fn test_upsert_by_id() {
        let mut list = vec![(1, "a"), (2, "b")];
        upsert_by_id(&mut list, (2, "B"), |item| item.0);
        upsert_by_id(&mut list, (3, "c"), |item| item.0);
        assert_eq!(list, vec![(1, "a"), (2, "B"), (3, "c")]);
    }
}
