//! `login`, `logout`, `signup` and `whoami`.

use tableside_admin::routes::{LoginPage, SignupPage};
use tableside_client::{AppContext, IdentityState};
use tracing::info;

use super::CliError;

#[allow(clippy::print_stdout)]
pub async fn login(ctx: &AppContext, email: String, password: String) -> Result<(), CliError> {
    let mut page = LoginPage::new(ctx.identity.clone(), None);
    page.email = email;
    page.password = password;

    let Some(target) = page.submit().await else {
        return Err(CliError::screen(page.error));
    };
    if let Some(identity) = ctx.identity.identity() {
        println!("Logged in as {} ({})", identity.email, identity.role);
    }
    info!(%target, "Login complete");
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn logout(ctx: &AppContext) -> Result<(), CliError> {
    ctx.identity.logout().await;
    println!("Logged out");
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn signup(
    ctx: &AppContext,
    email: String,
    password: String,
    name: String,
) -> Result<(), CliError> {
    let mut page = SignupPage::new(ctx.identity.clone());
    page.email = email;
    page.password_confirm.clone_from(&password);
    page.password = password;
    page.name = name;

    if page.submit().await.is_none() {
        return Err(CliError::screen(page.error));
    }
    if let Some(identity) = &page.created {
        println!("Account created for {}; log in to continue", identity.email);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn whoami(ctx: &AppContext) -> Result<(), CliError> {
    match ctx.identity.init().await {
        IdentityState::Resolved(identity) => {
            println!("{} <{}>", identity.name, identity.email);
            println!("  role:  {}", identity.role);
            match identity.store_id {
                Some(store_id) => println!("  store: {store_id}"),
                None => println!("  store: -"),
            }
            Ok(())
        }
        IdentityState::Anonymous | IdentityState::Resolving => Err(CliError::NotLoggedIn),
    }
}
