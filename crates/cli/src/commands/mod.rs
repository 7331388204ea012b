//! Subcommand implementations.
//!
//! Each command drives the same screen controllers the graphical clients
//! use, then prints what the screen would show.

pub mod auth;
pub mod catalog;
pub mod notifications;
pub mod orders;
pub mod track;

use tableside_admin::AdminRoute;
use tableside_admin::routes::resolve_store;
use tableside_client::{AppContext, ContextError, GatewayError, GuardOutcome};
use tableside_core::{Identity, StoreId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("not logged in; run `tableside login` first")]
    NotLoggedIn,

    #[error("{0} is for store owners only")]
    Forbidden(&'static str),

    #[error("no store yet; create one in store settings")]
    NoStore,

    /// A screen reported an inline error.
    #[error("{0}")]
    Screen(String),
}

impl CliError {
    /// Wrap a screen's inline error, if it set one.
    fn screen(error: Option<String>) -> Self {
        Self::Screen(error.unwrap_or_else(|| "the request did not go through".to_string()))
    }
}

/// Resolve the signed-in staff member and run the route guard for `route`.
async fn staff(ctx: &AppContext, route: AdminRoute) -> Result<(Identity, StoreId), CliError> {
    ctx.identity.init().await;
    match route.check(&ctx.identity) {
        GuardOutcome::Allow => {}
        GuardOutcome::Unauthorized => return Err(CliError::Forbidden(route.title())),
        GuardOutcome::Loading | GuardOutcome::RedirectToLogin { .. } => {
            return Err(CliError::NotLoggedIn);
        }
    }
    let identity = ctx.identity.identity().ok_or(CliError::NotLoggedIn)?;
    let store_id = resolve_store(&ctx.api, &identity)
        .await?
        .ok_or(CliError::NoStore)?;
    Ok((identity, store_id))
}
