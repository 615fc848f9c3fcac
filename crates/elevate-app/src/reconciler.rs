use std::time::Duration;

use tokio::task::JoinHandle;

use elevate_service::{ServiceDeps, reconcile};

/// ## Summary
/// Spawns the periodic reconciliation sweep. The first sweep runs one
/// `period` after startup. Sweep failures are logged and the loop continues.
#[must_use]
pub fn spawn_reconciler(deps: ServiceDeps, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(interval_secs = period.as_secs(), "Reconciliation task started");

        loop {
            ticker.tick().await;
            if let Err(e) = reconcile::sweep(&deps).await {
                tracing::error!(error = %e, "Reconciliation sweep failed");
            }
        }
    })
}
