//! Periodic expiry of access grants and sessions.

use std::time::Duration;

use database::Database;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// What one sweep changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired_requests: u64,
    pub purged_sessions: u64,
}

/// Expire overdue grants and drop dead sessions once.
pub async fn run_sweep_once(db: &Database) -> database::Result<SweepReport> {
    let expired_requests = database::access_request::expire_overdue(db.pool()).await?;
    let purged_sessions = database::session::purge_expired_sessions(db.pool()).await?;

    if expired_requests > 0 {
        database::audit_log::record(
            db.pool(),
            None,
            "expire",
            "access_request",
            None,
            Some(&format!("{expired_requests} grant(s) reached their end date")),
        )
        .await?;
    }

    Ok(SweepReport {
        expired_requests,
        purged_sessions,
    })
}

/// Run [`run_sweep_once`] every `interval` until the runtime shuts down.
pub fn spawn_expiry_sweep(db: Database, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        info!(interval = ?interval, "Starting expiry sweep");

        loop {
            ticker.tick().await;

            match run_sweep_once(&db).await {
                Ok(report) if report != SweepReport::default() => {
                    info!(
                        expired_requests = report.expired_requests,
                        purged_sessions = report.purged_sessions,
                        "Expiry sweep"
                    );
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "Expiry sweep failed"),
            }
        }
    })
}
