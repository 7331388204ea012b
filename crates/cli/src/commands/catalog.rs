//! `menus` and `seats`.

use tableside_admin::AdminRoute;
use tableside_admin::routes::{MenusPage, SeatsPage};
use tableside_client::AppContext;

use super::{CliError, staff};

#[allow(clippy::print_stdout)]
pub async fn menus(ctx: &AppContext) -> Result<(), CliError> {
    let (_, store_id) = staff(ctx, AdminRoute::Menus).await?;
    let mut page = MenusPage::new(ctx.api.clone(), store_id);
    page.load().await;
    if page.error.is_some() {
        return Err(CliError::screen(page.error));
    }

    for row in page.rows() {
        let sold_out = if row.available { "" } else { "  (sold out)" };
        println!(
            "#{:<5} {:<24} {:<16} {:>10}{sold_out}",
            row.id, row.name, row.category, row.price
        );
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn seats(ctx: &AppContext) -> Result<(), CliError> {
    let (_, store_id) = staff(ctx, AdminRoute::Seats).await?;
    let mut page = SeatsPage::new(ctx.api.clone(), ctx.config.clone(), store_id);
    page.load().await;
    if page.error.is_some() {
        return Err(CliError::screen(page.error));
    }

    for row in page.rows() {
        let inactive = if row.active { "" } else { "  (inactive)" };
        println!("{:<8} {}{inactive}", row.seat_number, row.qr_url);
    }
    Ok(())
}
