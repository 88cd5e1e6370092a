use super::ledger::TrustLedger;
use std::sync::Arc;
use std::time::Duration;

/// Periodically recompute and persist the trust level until `shutdown`
/// flips to `true`. A failed reassessment is logged and the loop continues.
pub async fn run_reassessment_loop(
    ledger: Arc<TrustLedger>,
    interval: Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            () = tokio::time::sleep(interval) => {
                let ledger = Arc::clone(&ledger);
                match tokio::task::spawn_blocking(move || ledger.assess()).await {
                    Ok(Ok(level)) => tracing::debug!(trust_level = level, "trust reassessed"),
                    Ok(Err(error)) => tracing::warn!(%error, "trust reassessment not persisted"),
                    Err(error) => tracing::error!(%error, "trust reassessment task failed"),
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() { break; }
            }
        }
    }
}
