//! bridgewatch -- cross-chain bridge health monitoring and incident alerting.
//!
//! This crate probes bridge endpoints on a schedule, grades each probe into a
//! discrete health status, tracks status transitions to open and resolve
//! incidents, alerts subscribed users, and streams live status events over a
//! WebSocket API.

pub mod api;
pub mod broadcast;
pub mod config;
pub mod monitor;
pub mod notify;
pub mod probes;
pub mod scheduler;
pub mod status;
pub mod storage;

use anyhow::Result;
use std::sync::Arc;

/// Start the bridgewatch daemon: API server, scheduler, and monitor.
pub async fn serve(config: config::Config) -> Result<()> {
    // 1. Storage
    tracing::info!(db_path = %config.db_path, "Initializing database");
    let pool = storage::open_pool(&config.db_path)?;

    // 2. Monitor wiring
    let broadcast = broadcast::StatusBroadcast::default();
    let notifier = Arc::new(notify::Notifier::new(
        pool.clone(),
        Arc::new(notify::LogSender),
        config.alert_cooldown(),
    ));
    let monitor = Arc::new(monitor::BridgeMonitor::new(
        pool.clone(),
        Arc::new(probes::BridgeProber::default()),
        Some(notifier),
        broadcast.clone(),
        config.monitor_config(),
    ));

    // 3. Scheduler (background task; first run fires immediately)
    tokio::spawn(scheduler::run_monitor_loop(monitor, config.check_interval()));

    // 4. API server
    let addr: std::net::SocketAddr = config.bind.parse()?;
    let state = api::state::AppState { pool, broadcast };
    let app = api::router(state, &config.cors_origins);

    tracing::info!(%addr, "bridgewatch listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
