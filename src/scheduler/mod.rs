//! Interval scheduler for full check runs.

use crate::monitor::BridgeMonitor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Drive a full check run every `interval`, starting with one immediately.
/// At most one run is in flight: if a run outlasts the interval, the next
/// tick is skipped rather than stacked.
pub async fn run_monitor_loop(monitor: Arc<BridgeMonitor>, interval: Duration) {
    info!(interval_secs = interval.as_secs(), "Scheduler started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let in_flight = Arc::new(AtomicBool::new(false));

    loop {
        ticker.tick().await;

        if in_flight.swap(true, Ordering::SeqCst) {
            warn!("Previous check run still in flight, skipping tick");
            continue;
        }

        let monitor = monitor.clone();
        let in_flight = in_flight.clone();
        tokio::spawn(async move {
            match monitor.check_all().await {
                Ok(summary) => {
                    info!(
                        ok = summary.ok,
                        failed = summary.failed,
                        "Scheduled check completed"
                    );
                }
                Err(e) => error!("Scheduled check failed: {:#}", e),
            }
            in_flight.store(false, Ordering::SeqCst);
        });
    }
}
