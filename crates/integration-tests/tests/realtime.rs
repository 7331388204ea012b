//! The notification channel against the mock STOMP endpoint.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use tableside_client::{ChannelEvent, ConnectionState, Retry, Viewer};
use tableside_core::OrderStatus;
use tableside_integration_tests::{
    MockBackend, OWNER_EMAIL, STORE_ID, login_as, next_notification,
};

const ADMIN: Viewer = Viewer::Admin { store_id: STORE_ID };

async fn wait_for_state(
    rx: &mut tokio::sync::watch::Receiver<ConnectionState>,
    wanted: impl Fn(&ConnectionState) -> bool,
) -> ConnectionState {
    let state = tokio::time::timeout(Duration::from_secs(10), rx.wait_for(wanted))
        .await
        .expect("state reached in time")
        .unwrap();
    *state
}

#[tokio::test]
async fn test_connect_is_idempotent_and_delivers_pushes() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();
    login_as(&ctx, OWNER_EMAIL).await;
    let order = backend.seed_order(OrderStatus::Pending);

    let channel = ctx.channel_for(ADMIN);
    let mut events = channel.subscribe();
    let mut state = channel.watch_state();
    assert!(channel.connect());
    assert!(!channel.connect());

    wait_for_state(&mut state, ConnectionState::is_connected).await;
    assert!(!channel.connect());
    backend.wait_for_subscriptions(1).await;

    let (tokens, subscriptions) =
        backend.with_state(|s| (s.ws_tokens.clone(), s.subscriptions.clone()));
    assert_eq!(tokens.len(), 1);
    assert!(tokens.first().and_then(Option::as_deref).is_some_and(|t| t.starts_with("access-")));
    assert_eq!(subscriptions, vec!["/topic/admin/1".to_string()]);

    let pushed = backend.push_admin_notification(order.id, "New order A-101");
    let received = next_notification(&mut events).await;
    assert_eq!(received.id, pushed.id);
    assert_eq!(received.message, "New order A-101");
    assert_eq!(received.order_id, Some(order.id));

    assert!(channel.disconnect().await);
    assert!(!channel.disconnect().await);
    assert_eq!(channel.state(), ConnectionState::Disconnected { retry: Retry::Idle });
}

#[tokio::test]
async fn test_malformed_push_is_dropped() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();
    login_as(&ctx, OWNER_EMAIL).await;
    let order = backend.seed_order(OrderStatus::Pending);

    let channel = ctx.channel_for(ADMIN);
    let mut events = channel.subscribe();
    channel.connect();
    backend.wait_for_subscriptions(1).await;

    backend.push_raw("/topic/admin/1", "{not json");
    backend.push_raw("/topic/admin/1", r#"{"id": "seven"}"#);
    let pushed = backend.push_admin_notification(order.id, "After the noise");

    let received = next_notification(&mut events).await;
    assert_eq!(received.id, pushed.id);
    assert!(channel.state().is_connected());

    channel.disconnect().await;
}

#[tokio::test]
async fn test_customer_channel_only_sees_its_order() {
    let backend = MockBackend::start().await;
    let staff = backend.context();
    login_as(&staff, OWNER_EMAIL).await;
    let mine = backend.seed_order(OrderStatus::Pending);
    let other = backend.seed_order(OrderStatus::Pending);

    let customer = backend.context();
    let channel = customer.channel_for(Viewer::Customer { order_id: mine.id });
    let mut events = channel.subscribe();
    channel.connect();
    backend.wait_for_subscriptions(1).await;
    assert!(backend.with_state(|s| s.ws_tokens.first().is_some_and(Option::is_none)));

    staff
        .api
        .update_order_status(other.id, OrderStatus::Preparing)
        .await
        .unwrap();
    staff
        .api
        .update_order_status(mine.id, OrderStatus::Preparing)
        .await
        .unwrap();

    let received = next_notification(&mut events).await;
    assert_eq!(received.order_id, Some(mine.id));
    assert_eq!(received.message, format!("Order {} is preparing", mine.order_number));

    channel.disconnect().await;
}

#[tokio::test]
async fn test_gives_up_after_five_attempts_and_polls() {
    let backend = MockBackend::start().await;
    backend.with_state(|s| s.refuse_ws = true);
    let ctx = backend.context();
    login_as(&ctx, OWNER_EMAIL).await;
    let order = backend.seed_order(OrderStatus::Pending);
    backend.push_admin_notification(order.id, "Waiting");

    let channel = ctx.channel_for(ADMIN);
    let mut events = channel.subscribe();
    let mut state = channel.watch_state();
    channel.connect();

    let settled = wait_for_state(&mut state, |s| {
        matches!(s, ConnectionState::Disconnected { retry: Retry::Exhausted })
    })
    .await;
    assert_eq!(settled, ConnectionState::Disconnected { retry: Retry::Exhausted });
    assert_eq!(backend.with_state(|s| s.ws_tokens.len()), 5);

    let count = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(ChannelEvent::UnreadCount(count)) = events.recv().await {
                return count;
            }
        }
    })
    .await
    .expect("poller reports the unread count");
    assert_eq!(count, 1);

    // An explicit connect starts over.
    backend.with_state(|s| s.refuse_ws = false);
    assert!(channel.connect());
    wait_for_state(&mut state, ConnectionState::is_connected).await;

    assert!(channel.disconnect().await);
}
