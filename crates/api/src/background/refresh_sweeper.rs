//! Periodic purge of expired refresh-token records.
//!
//! Expired refresh tokens are already rejected at verification time; this job
//! only reclaims the memory their records hold.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use trancendos_db::repositories::RefreshTokenRepo;
use trancendos_db::AuthStore;

/// Run the sweep loop every `every` until `cancel` is triggered.
pub async fn run(store: AuthStore, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Refresh token sweeper started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Refresh token sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                match RefreshTokenRepo::delete_expired(&store, Utc::now()).await {
                    Ok(0) => tracing::debug!("Refresh token sweep: nothing to purge"),
                    Ok(deleted) => tracing::info!(deleted, "Refresh token sweep: purged expired records"),
                    Err(e) => tracing::error!(error = %e, "Refresh token sweep failed"),
                }
            }
        }
    }
}
