//! `track <order-id>`: the customer's order status screen.

use tableside_client::{AppContext, Viewer};
use tableside_core::OrderId;
use tableside_storefront::routes::OrderTracker;

use super::CliError;

#[allow(clippy::print_stdout)]
pub async fn track(ctx: &AppContext, order_id: OrderId) -> Result<(), CliError> {
    let mut tracker = OrderTracker::new(ctx.api.clone(), order_id);
    if !tracker.load().await {
        return Err(CliError::screen(tracker.error));
    }
    let print = |tracker: &OrderTracker| {
        if let Some(view) = tracker.view() {
            println!("{}  {}  {}", view.order_number, view.status, view.total);
        }
    };
    print(&tracker);

    tracker.attach(ctx.channel_for(Viewer::Customer { order_id }));
    while !tracker.is_finished() {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            update = tracker.next_update() => {
                if update.is_none() {
                    break;
                }
                if let Some(message) = &tracker.last_message {
                    println!("  {message}");
                }
                print(&tracker);
            }
        }
    }

    tracker.close().await;
    Ok(())
}
