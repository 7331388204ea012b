//! Periodic refresh for live tables.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// A timer owned by a screen.
///
/// Ticks every `period` (the first tick one period after creation). Dropping
/// it stops the timer task, so a screen that goes away leaves nothing
/// running.
#[derive(Debug)]
pub struct AutoRefresh {
    ticks: mpsc::Receiver<()>,
    task: JoinHandle<()>,
}

impl AutoRefresh {
    /// Start ticking. Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(period: Duration) -> Self {
        let (tx, ticks) = mpsc::channel(1);
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                // A full slot means the screen has not caught up yet.
                if let Err(mpsc::error::TrySendError::Closed(())) = tx.try_send(()) {
                    return;
                }
            }
        });
        debug!(period_ms = period.as_millis(), "Auto-refresh started");
        Self { ticks, task }
    }

    /// Wait for the next tick.
    pub async fn tick(&mut self) {
        if self.ticks.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    /// A handle that can observe or stop the timer task.
    #[must_use]
    pub fn abort_handle(&self) -> tokio::task::AbortHandle {
        self.task.abort_handle()
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.task.abort();
    }
}
