//! Expiry sweeper task
//!
//! Periodically walks the whole member table and revokes group access for
//! everyone whose paid subscription has lapsed. The sweep itself lives in
//! the membership crate; this task only supplies the cadence and the date.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tracing::{error, info, warn};

use gatekeeper_membership::MembershipService;

/// Runs the sweep on a fixed cadence.
pub async fn run(core: Arc<MembershipService>, every: Duration) {
    info!(interval_secs = every.as_secs(), "Expiry sweeper started");

    // Run immediately on startup, then on every tick.
    sweep_once(&core).await;

    let mut interval = tokio::time::interval(every);
    interval.tick().await; // Skip first tick since we just ran

    loop {
        interval.tick().await;
        sweep_once(&core).await;
    }
}

async fn sweep_once(core: &MembershipService) {
    info!("Running scheduled expiry sweep");
    let today = Local::now().date_naive();
    match core.sweep_expired(today).await {
        Ok(summary) => {
            if summary.failures > 0 {
                warn!(
                    scanned = summary.scanned,
                    expired = summary.expired,
                    revoked = summary.revoked,
                    failures = summary.failures,
                    "Expiry sweep completed with failures"
                );
            } else {
                info!(
                    scanned = summary.scanned,
                    expired = summary.expired,
                    revoked = summary.revoked,
                    "Expiry sweep complete"
                );
            }
        }
        Err(e) => error!(error = %e, "Expiry sweep failed"),
    }
}
