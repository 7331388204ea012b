//! `notifications list|read|read-all` and `watch`.

use tableside_admin::AdminRoute;
use tableside_admin::routes::NotificationCenter;
use tableside_client::{AppContext, ChannelEvent, Viewer};
use tableside_core::{Notification, NotificationId};
use tracing::info;

use super::{CliError, staff};

async fn center(ctx: &AppContext) -> Result<NotificationCenter, CliError> {
    let (_, store_id) = staff(ctx, AdminRoute::Notifications).await?;
    let mut center = NotificationCenter::new(ctx.api.clone(), Viewer::Admin { store_id });
    center.load().await;
    if center.error.is_some() {
        return Err(CliError::screen(center.error));
    }
    Ok(center)
}

fn line(notification: &Notification) -> String {
    let marker = if notification.is_read { ' ' } else { '*' };
    format!(
        "{marker} #{:<5} {}  {}",
        notification.id,
        notification.sent_at.format("%H:%M"),
        notification.message
    )
}

#[allow(clippy::print_stdout)]
pub async fn list(ctx: &AppContext) -> Result<(), CliError> {
    let center = center(ctx).await?;
    println!("{} unread", center.unread);
    for notification in &center.notifications {
        println!("{}", line(notification));
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn read(ctx: &AppContext, id: NotificationId) -> Result<(), CliError> {
    let mut center = center(ctx).await?;
    if !center.mark_as_read(id).await {
        return Err(CliError::screen(center.error));
    }
    println!("{} unread", center.unread);
    Ok(())
}

#[allow(clippy::print_stdout)]
pub async fn read_all(ctx: &AppContext) -> Result<(), CliError> {
    let mut center = center(ctx).await?;
    if !center.mark_all_as_read().await {
        return Err(CliError::screen(center.error));
    }
    println!("All notifications marked read");
    Ok(())
}

/// Print notifications as they arrive until Ctrl-C.
#[allow(clippy::print_stdout)]
pub async fn watch(ctx: &AppContext) -> Result<(), CliError> {
    let mut center = center(ctx).await?;
    center.attach(ctx.channel_for(center.viewer()));
    println!("Watching {} ({} unread). Ctrl-C to stop.", center.viewer(), center.unread);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = center.next_event() => match event {
                Some(ChannelEvent::Notification(notification)) => {
                    println!("{}", line(&notification));
                }
                Some(ChannelEvent::UnreadCount(count)) => println!("  ({count} unread)"),
                None => break,
            },
        }
    }

    info!("Stopped watching");
    center.close().await;
    Ok(())
}
