//! Route access decisions for admin screens.
//!
//! The guard runs before a protected screen mounts. It never performs I/O;
//! it only looks at what the [`SessionContext`] already knows.

use tableside_core::Identity;

use crate::identity::SessionContext;

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/admin/login";

/// Shown to signed-in staff who lack the required role.
pub const UNAUTHORIZED_PATH: &str = "/admin/unauthorized";

/// Landing page after login when no return path was remembered.
pub const DEFAULT_AFTER_LOGIN: &str = "/admin/dashboard";

/// Everything the guard decides on.
#[derive(Debug, Clone, Copy)]
pub struct GuardInput<'a> {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub identity: Option<&'a Identity>,
    /// Whether the route is owner-only.
    pub require_elevated: bool,
    /// The path being navigated to.
    pub path: &'a str,
}

/// The guard's verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Identity is still being resolved; render a placeholder.
    Loading,
    /// Send to [`LOGIN_PATH`], remembering `from`.
    RedirectToLogin { from: String },
    /// Signed in, but the role does not allow this route.
    Unauthorized,
    Allow,
}

impl GuardInput<'_> {
    /// Decide. Loading wins over everything, then authentication, then role.
    #[must_use]
    pub fn evaluate(&self) -> GuardOutcome {
        if self.is_loading {
            return GuardOutcome::Loading;
        }
        if !self.is_authenticated {
            return GuardOutcome::RedirectToLogin {
                from: self.path.to_string(),
            };
        }
        if self.require_elevated && !self.identity.is_some_and(Identity::is_master) {
            return GuardOutcome::Unauthorized;
        }
        GuardOutcome::Allow
    }
}

/// Evaluate the guard for `path` against the current session.
#[must_use]
pub fn check(context: &SessionContext, path: &str, require_elevated: bool) -> GuardOutcome {
    let identity = context.identity();
    GuardInput {
        is_authenticated: context.is_authenticated(),
        is_loading: context.is_loading(),
        identity: identity.as_ref(),
        require_elevated,
        path,
    }
    .evaluate()
}

/// Where to go after a successful login.
///
/// Only same-site admin paths are honoured; anything else, and the login page
/// itself, falls back to [`DEFAULT_AFTER_LOGIN`].
#[must_use]
pub fn post_login_target(from: Option<&str>) -> &str {
    from.filter(|path| {
        path.starts_with("/admin")
            && !path.starts_with("//")
            && *path != LOGIN_PATH
            && *path != UNAUTHORIZED_PATH
    })
    .unwrap_or(DEFAULT_AFTER_LOGIN)
}
