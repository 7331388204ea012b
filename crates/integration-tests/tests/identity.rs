//! Login, logout, session restore and the route guard against the mock
//! backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use tableside_admin::routes::{LoginPage, SignupPage};
use tableside_admin::AdminRoute;
use tableside_client::{
    AppContext, GatewayErrorKind, GuardOutcome, IdentityState, LOGIN_PATH, MemoryStore,
};
use tableside_core::Role;
use tableside_integration_tests::{
    BARISTA_EMAIL, MockBackend, OWNER_EMAIL, PASSWORD, STORE_ID, login_as,
};

#[tokio::test]
async fn test_login_then_logout() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();

    let identity = login_as(&ctx, OWNER_EMAIL).await;
    assert_eq!(identity.role, Role::Master);
    assert_eq!(identity.store_id, Some(STORE_ID));
    assert!(ctx.identity.is_authenticated());
    assert!(ctx.session.refresh_token().unwrap().is_some());

    ctx.identity.logout().await;
    assert!(!ctx.identity.is_authenticated());
    assert!(!ctx.session.has_token());
    assert!(ctx.session.refresh_token().unwrap().is_none());
    assert_eq!(ctx.identity.state(), IdentityState::Anonymous);

    let requests = backend.with_state(|s| s.requests.clone());
    assert!(requests.contains(&"POST /api/auth/logout".to_string()));
}

#[tokio::test]
async fn test_init_without_token_makes_no_request() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();
    assert!(ctx.identity.is_loading());

    assert_eq!(ctx.identity.init().await, IdentityState::Anonymous);
    assert!(!ctx.identity.is_loading());
    assert!(backend.with_state(|s| s.requests.is_empty()));
}

#[tokio::test]
async fn test_init_restores_stored_session() {
    let backend = MockBackend::start().await;
    let durable = Arc::new(MemoryStore::new());
    let first =
        AppContext::with_stores(backend.config(), durable.clone(), Arc::new(MemoryStore::new()))
            .unwrap();
    let identity = login_as(&first, BARISTA_EMAIL).await;

    // A fresh process over the same durable store.
    let second =
        AppContext::with_stores(backend.config(), durable, Arc::new(MemoryStore::new())).unwrap();
    let state = second.identity.init().await;
    assert_eq!(state.identity().map(|i| i.id), Some(identity.id));
    assert!(second.identity.is_authenticated());
}

#[tokio::test]
async fn test_init_with_revoked_token_clears_session() {
    let backend = MockBackend::start().await;
    let durable = Arc::new(MemoryStore::new());
    let first =
        AppContext::with_stores(backend.config(), durable.clone(), Arc::new(MemoryStore::new()))
            .unwrap();
    login_as(&first, OWNER_EMAIL).await;
    backend.revoke_tokens();

    let second =
        AppContext::with_stores(backend.config(), durable, Arc::new(MemoryStore::new())).unwrap();
    assert_eq!(second.identity.init().await, IdentityState::Anonymous);
    assert!(!second.session.has_token());
}

#[tokio::test]
async fn test_unauthorized_response_signs_out() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();
    login_as(&ctx, OWNER_EMAIL).await;
    assert_eq!(AdminRoute::Orders.check(&ctx.identity), GuardOutcome::Allow);

    backend.revoke_tokens();
    let err = ctx.api.store_orders(STORE_ID, None).await.unwrap_err();
    assert_eq!(err.kind, GatewayErrorKind::Unauthorized);
    assert_eq!(err.user_message(), "Your session has expired. Please log in again.");

    assert!(!ctx.session.has_token());
    assert!(!ctx.identity.is_authenticated());
    assert_eq!(
        AdminRoute::Orders.check(&ctx.identity),
        GuardOutcome::RedirectToLogin {
            from: "/admin/orders".to_string()
        }
    );
}

#[tokio::test]
async fn test_guard_redirect_returns_after_login() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();
    assert_eq!(AdminRoute::Orders.check(&ctx.identity), GuardOutcome::Loading);
    ctx.identity.init().await;

    let GuardOutcome::RedirectToLogin { from } = AdminRoute::Orders.check(&ctx.identity) else {
        panic!("expected a login redirect");
    };

    let mut page = LoginPage::new(ctx.identity.clone(), Some(from));
    page.email = OWNER_EMAIL.to_string();
    page.password = PASSWORD.to_string();
    assert_eq!(page.submit().await.as_deref(), Some("/admin/orders"));
    assert!(page.password.is_empty());
    assert!(page.error.is_none());
    assert_eq!(AdminRoute::Orders.check(&ctx.identity), GuardOutcome::Allow);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();
    ctx.identity.init().await;

    let mut page = LoginPage::new(ctx.identity.clone(), None);
    page.email = OWNER_EMAIL.to_string();
    page.password = "wrong-password".to_string();
    assert_eq!(page.submit().await, None);
    assert_eq!(page.error.as_deref(), Some("Invalid email or password"));
    assert!(page.password.is_empty());
    assert!(!ctx.identity.is_authenticated());
    assert!(!ctx.session.has_token());
}

#[tokio::test]
async fn test_login_rejected_with_401_shows_backend_text() {
    let backend = MockBackend::start().await;
    backend.with_state(|s| s.login_rejects_with_401 = true);
    let ctx = backend.context();
    ctx.identity.init().await;

    let mut page = LoginPage::new(ctx.identity.clone(), None);
    page.email = OWNER_EMAIL.to_string();
    page.password = "wrong-password".to_string();
    assert_eq!(page.submit().await, None);
    assert_eq!(page.error.as_deref(), Some("Invalid email or password"));
    assert!(!ctx.identity.is_authenticated());
}

#[tokio::test]
async fn test_unauthorized_keeps_backend_reason() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();
    login_as(&ctx, OWNER_EMAIL).await;
    backend.revoke_tokens();

    let err = ctx.api.store_orders(STORE_ID, None).await.unwrap_err();
    assert_eq!(err.kind, GatewayErrorKind::Unauthorized);
    assert_eq!(err.message, "Authentication required");
    assert!(!ctx.session.has_token());
}

#[tokio::test]
async fn test_sub_account_cannot_open_owner_screens() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();
    let identity = login_as(&ctx, BARISTA_EMAIL).await;

    assert_eq!(AdminRoute::SubAccounts.check(&ctx.identity), GuardOutcome::Unauthorized);
    assert_eq!(AdminRoute::StoreSettings.check(&ctx.identity), GuardOutcome::Unauthorized);
    assert_eq!(AdminRoute::Orders.check(&ctx.identity), GuardOutcome::Allow);

    let navigation = AdminRoute::navigation(&identity);
    assert!(navigation.contains(&AdminRoute::Dashboard));
    assert!(!navigation.contains(&AdminRoute::SubAccounts));
}

#[tokio::test]
async fn test_signup_does_not_sign_in() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();
    ctx.identity.init().await;

    let mut page = SignupPage::new(ctx.identity.clone());
    page.email = "new-owner@cafe.com".to_string();
    page.password = "hunter22".to_string();
    page.password_confirm = "hunter22".to_string();
    page.name = "New Owner".to_string();

    assert_eq!(page.submit().await, Some(LOGIN_PATH));
    assert_eq!(page.created.as_ref().map(|i| i.role), Some(Role::Master));
    assert!(page.password.is_empty());
    assert!(!ctx.identity.is_authenticated());

    let mut again = SignupPage::new(ctx.identity.clone());
    again.email = OWNER_EMAIL.to_string();
    again.password = "hunter22".to_string();
    again.password_confirm = "hunter22".to_string();
    again.name = "Someone".to_string();
    assert_eq!(again.submit().await, None);
    assert_eq!(again.error.as_deref(), Some("Email already registered"));
}
