//! `orders list|advance|cancel`.

use tableside_admin::AdminRoute;
use tableside_admin::routes::OrdersPage;
use tableside_client::AppContext;
use tableside_core::{OrderId, OrderStatus};

use super::{CliError, staff};

async fn page(ctx: &AppContext) -> Result<OrdersPage, CliError> {
    let (_, store_id) = staff(ctx, AdminRoute::Orders).await?;
    Ok(OrdersPage::new(ctx.api.clone(), store_id))
}

#[allow(clippy::print_stdout)]
pub async fn list(ctx: &AppContext, status: Option<OrderStatus>) -> Result<(), CliError> {
    let mut page = page(ctx).await?;
    page.set_filter(status).await;
    if page.error.is_some() {
        return Err(CliError::screen(page.error));
    }

    let rows = page.rows();
    if rows.is_empty() {
        println!("No orders");
    }
    for row in rows {
        println!(
            "#{:<6} {:<10} seat {:<6} {:<16} {:>10}  {}",
            row.id, row.order_number, row.seat, row.status, row.total, row.items
        );
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn advance(ctx: &AppContext, id: OrderId) -> Result<(), CliError> {
    let mut page = page(ctx).await?;
    page.load().await;
    if !page.advance(id).await {
        return Err(CliError::screen(page.error));
    }
    if let Some(order) = page.orders.iter().find(|o| o.id == id) {
        println!("Order {} is now {}", order.order_number, order.status.label());
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn cancel(ctx: &AppContext, id: OrderId) -> Result<(), CliError> {
    let mut page = page(ctx).await?;
    page.load().await;
    if !page.cancel(id).await {
        return Err(CliError::screen(page.error));
    }
    println!("Order {id} cancelled");
    Ok(())
}
