//! Staff screens against the mock backend.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use tableside_admin::routes::{
    DashboardPage, MenusPage, NotificationCenter, OrdersPage, SeatsPage, StoreSettingsPage,
};
use tableside_client::{ChannelEvent, Viewer};
use tableside_core::{MenuId, OrderStatus};
use tableside_integration_tests::{
    BARISTA_EMAIL, MockBackend, OWNER_EMAIL, STORE_ID, login_as,
};

const ADMIN: Viewer = Viewer::Admin { store_id: STORE_ID };

#[tokio::test]
async fn test_notification_center_follows_pushes() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();
    login_as(&ctx, OWNER_EMAIL).await;
    let order = backend.seed_order(OrderStatus::Pending);

    let mut center = NotificationCenter::new(ctx.api.clone(), ADMIN);
    center.load().await;
    assert!(center.error.is_none());
    assert_eq!(center.unread, 0);
    assert!(center.notifications.is_empty());

    center.attach(ctx.channel_for(ADMIN));
    backend.wait_for_subscriptions(1).await;
    let pushed = backend.push_admin_notification(order.id, "New order");

    let received = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(ChannelEvent::Notification(n)) = center.next_event().await {
                return n;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(received.id, pushed.id);
    assert_eq!(center.unread, 1);
    assert_eq!(center.notifications.first().map(|n| n.id), Some(pushed.id));

    assert!(center.mark_as_read(pushed.id).await);
    assert_eq!(center.unread, 0);
    assert!(center.notifications.first().unwrap().is_read);
    assert_eq!(ctx.api.unread_count(ADMIN).await.unwrap(), 0);

    center.close().await;
}

#[tokio::test]
async fn test_mark_as_read_rolls_back_on_failure() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();
    login_as(&ctx, OWNER_EMAIL).await;
    let order = backend.seed_order(OrderStatus::Pending);
    let pushed = backend.push_admin_notification(order.id, "New order");

    let mut center = NotificationCenter::new(ctx.api.clone(), ADMIN);
    center.load().await;
    assert_eq!(center.unread, 1);

    backend.with_state(|s| s.fail_mark_read = true);
    assert!(!center.mark_as_read(pushed.id).await);
    assert_eq!(center.unread, 1);
    assert!(!center.notifications.first().unwrap().is_read);
    assert_eq!(
        center.error.as_deref(),
        Some("The server is having trouble. Please try again shortly.")
    );

    backend.with_state(|s| s.fail_mark_read = false);
    assert!(center.mark_all_as_read().await);
    assert_eq!(center.unread, 0);
    assert_eq!(ctx.api.unread_count(ADMIN).await.unwrap(), 0);
}

#[tokio::test]
async fn test_orders_page_advances_and_cancels() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();
    login_as(&ctx, BARISTA_EMAIL).await;
    let first = backend.seed_order(OrderStatus::Pending);
    let second = backend.seed_order(OrderStatus::Pending);

    let mut page = OrdersPage::new(ctx.api.clone(), STORE_ID);
    page.set_filter(Some(OrderStatus::Pending)).await;
    assert_eq!(page.orders.len(), 2);

    // Advancing takes it out of the pending view.
    assert!(page.advance(first.id).await);
    assert_eq!(page.orders.len(), 1);
    assert!(!page.advance(first.id).await);
    assert_eq!(page.error.as_deref(), Some("That order is no longer in the list."));

    assert!(page.cancel(second.id).await);
    assert!(page.orders.is_empty());

    page.set_filter(None).await;
    let statuses: Vec<(_, _)> = page.orders.iter().map(|o| (o.id, o.status)).collect();
    assert!(statuses.contains(&(first.id, OrderStatus::Preparing)));
    assert!(statuses.contains(&(second.id, OrderStatus::Cancelled)));

    // The backend refuses to cancel an order in preparation.
    assert!(!page.cancel(first.id).await);
    assert_eq!(page.error.as_deref(), Some("Order can no longer be cancelled"));

    let row = page.rows().into_iter().find(|r| r.id == first.id).unwrap();
    assert_eq!(row.items, "Americano × 1");
}

#[tokio::test]
async fn test_orders_auto_refresh_picks_up_new_orders() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();
    login_as(&ctx, OWNER_EMAIL).await;

    let mut page = OrdersPage::new(ctx.api.clone(), STORE_ID);
    page.load().await;
    assert!(page.orders.is_empty());

    page.start_auto_refresh(Duration::from_millis(50));
    backend.seed_order(OrderStatus::Pending);
    assert!(page.next_refresh().await);
    assert!(page.next_refresh().await);
    assert_eq!(page.orders.len(), 1);

    page.stop_auto_refresh();
    assert!(!page.next_refresh().await);
}

#[tokio::test]
async fn test_dashboard_counts_orders() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();
    let identity = login_as(&ctx, OWNER_EMAIL).await;
    backend.seed_order(OrderStatus::Pending);
    backend.seed_order(OrderStatus::Preparing);
    backend.seed_order(OrderStatus::Cancelled);

    let mut page = DashboardPage::new(ctx.api.clone(), identity);
    page.load().await;
    assert!(page.error.is_none(), "{:?}", page.error);
    assert_eq!(page.store_id, Some(STORE_ID));
    assert_eq!(page.recent_orders.len(), 3);

    let stats = page.stats_view().unwrap();
    assert_eq!(stats.today_orders, 3);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.preparing, 1);
    assert_eq!(stats.today_revenue, "₩9,000");
}

#[tokio::test]
async fn test_menus_page_toggles_availability() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();
    login_as(&ctx, OWNER_EMAIL).await;

    let mut page = MenusPage::new(ctx.api.clone(), STORE_ID);
    page.load().await;
    assert_eq!(page.items.len(), 3);
    let rows = page.rows();
    assert_eq!(rows.first().map(|r| r.category.as_str()), Some("Coffee"));

    assert!(page.toggle_availability(MenuId::new(3)).await);
    page.load().await;
    let cheesecake = page.items.iter().find(|m| m.id == MenuId::new(3)).unwrap();
    assert!(cheesecake.is_available);
}

#[tokio::test]
async fn test_seats_page_builds_qr_urls() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();
    login_as(&ctx, BARISTA_EMAIL).await;

    let mut page = SeatsPage::new(ctx.api.clone(), ctx.config.clone(), STORE_ID);
    page.load().await;
    let rows = page.rows();
    assert_eq!(rows.len(), 1);
    let row = rows.first().unwrap();
    assert_eq!(row.seat_number, "A1");
    assert!(row.qr_url.starts_with("http://shop.test/"));
    assert!(row.qr_url.ends_with("qr-a1"));
}

#[tokio::test]
async fn test_store_settings_toggle_open() {
    let backend = MockBackend::start().await;
    let ctx = backend.context();
    let identity = login_as(&ctx, OWNER_EMAIL).await;

    let mut page = StoreSettingsPage::new(ctx.api.clone(), identity);
    page.load().await;
    assert!(!page.is_creating());
    assert_eq!(page.form.name, "Blue Bottle");
    assert!(page.form.is_open);

    assert!(page.toggle_open().await);
    assert!(!page.form.is_open);
    assert!(!ctx.api.store(STORE_ID).await.unwrap().is_open);

    page.form.name = "Blue Bottle Seongsu".to_string();
    assert!(page.save().await);
    assert!(page.saved);
    assert_eq!(page.store.as_ref().unwrap().name, "Blue Bottle Seongsu");
}
