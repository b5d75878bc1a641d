use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};
use crate::state::AppState;

// Periodic maintenance: catalog reconciliation plus idle-connection eviction.
// Each pass is isolated; a failing pass is logged and retried on the next tick.
pub async fn start_background_worker(state: Arc<AppState>) {
    info!("Starting background maintenance worker...");

    let interval = Duration::from_secs(state.config.sync_interval_secs);

    loop {
        sleep(interval).await;

        let span = info_span!("catalog_reconciliation");
        async {
            match state.catalog_sync.run_reconciliation().await {
                Ok(summary) => {
                    if summary.failed > 0 {
                        info!(
                            "Reconciliation finished with failures: {} examined, {} refreshed, {} failed",
                            summary.examined, summary.refreshed, summary.failed
                        );
                    }
                }
                Err(e) => error!("Reconciliation pass failed to start: {:?}", e),
            }
        }
            .instrument(span)
            .await;

        let evicted = state.router.evict_idle().await;
        if evicted > 0 {
            info!("Evicted {} idle tenant connection(s)", evicted);
        }
    }
}
