//! Monitoring orchestrator.
//!
//! Drives the evaluate -> decide -> apply sequence for each bridge: probe,
//! grade the outcome, persist the status row, compare against the cached
//! previous status, open or resolve incidents, alert subscribers, and push
//! the evaluated status to live observers.

pub mod cache;

use crate::broadcast::{StatusBroadcast, StatusEvent};
use crate::notify::Notifier;
use crate::probes::Prober;
use crate::status::{self, HealthStatus, ProbeOutcome, TransitionAction};
use crate::storage::incidents::IncidentManager;
use crate::storage::{self, Bridge, Pool, StatusRecord};
use anyhow::Result;
use cache::{KeyedLocks, TtlCache};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// How long a cached previous status stays fresh.
    pub status_ttl: Duration,
    /// Bounded fan-out across bridges in one run.
    pub concurrency: usize,
    /// Hard ceiling per probe; covers probes whose own budget misbehaves.
    /// Must sit above the Hop quote budget (~40s).
    pub probe_deadline: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            status_ttl: Duration::from_secs(7200),
            concurrency: 8,
            probe_deadline: Duration::from_secs(60),
        }
    }
}

/// Outcome of one full check run across all active bridges.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub ok: usize,
    pub failed: usize,
}

pub struct BridgeMonitor {
    pool: Pool,
    prober: Arc<dyn Prober>,
    incidents: IncidentManager,
    notifier: Option<Arc<Notifier>>,
    broadcast: StatusBroadcast,
    previous: TtlCache<i64, HealthStatus>,
    locks: KeyedLocks<i64>,
    config: MonitorConfig,
}

impl BridgeMonitor {
    pub fn new(
        pool: Pool,
        prober: Arc<dyn Prober>,
        notifier: Option<Arc<Notifier>>,
        broadcast: StatusBroadcast,
        config: MonitorConfig,
    ) -> Self {
        let incidents = IncidentManager::new(pool.clone());
        Self {
            pool,
            prober,
            incidents,
            notifier,
            broadcast,
            previous: TtlCache::new(),
            locks: KeyedLocks::new(),
            config,
        }
    }

    /// Check every active bridge with bounded fan-out. One bridge failing
    /// never aborts its siblings; the run ends with a summary either way.
    pub async fn check_all(&self) -> Result<RunSummary> {
        let bridges = storage::list_bridges(&self.pool, true)?;
        info!(count = bridges.len(), "Checking bridges");

        let results: Vec<(String, Result<StatusRecord>)> = stream::iter(bridges)
            .map(|bridge| async move {
                let name = bridge.name.clone();
                (name, self.check_bridge(&bridge).await)
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut summary = RunSummary {
            total: results.len(),
            ..Default::default()
        };
        for (name, result) in results {
            match result {
                Ok(_) => summary.ok += 1,
                Err(e) => {
                    summary.failed += 1;
                    error!(bridge = %name, "Check failed: {:#}", e);
                }
            }
        }

        info!(ok = summary.ok, total = summary.total, "Bridge check completed");
        Ok(summary)
    }

    /// Check one bridge end to end. Holds the per-bridge lock across the
    /// cache read / decide / cache write sequence, so concurrent checks of
    /// the same bridge cannot manufacture or swallow a transition.
    pub async fn check_bridge(&self, bridge: &Bridge) -> Result<StatusRecord> {
        let _guard = self.locks.lock(bridge.id).await;

        info!(bridge = %bridge.name, "Checking bridge");
        let outcome = self.probe_with_deadline(bridge).await;
        let new_status = status::evaluate(&outcome);

        let record = StatusRecord {
            bridge_id: bridge.id,
            status: new_status,
            response_time_ms: outcome.response_time_ms,
            error_message: outcome.error.clone(),
            extra: outcome.detail.clone(),
            checked_at: Utc::now(),
        };
        storage::save_status(&self.pool, &record)?;

        let previous = self.previous.get(&bridge.id);
        let decision = status::decide(new_status, previous);

        match decision.action {
            TransitionAction::OpenIncident => {
                // decide() only opens on a known transition edge, so both
                // the previous status and the severity are present
                if let (Some(old), Some(severity)) = (previous, decision.severity) {
                    info!(
                        bridge = %bridge.name,
                        from = %old,
                        to = %new_status,
                        %severity,
                        "Status changed, opening incident"
                    );
                    self.incidents
                        .open(bridge.id, &bridge.name, new_status, old, severity)?;

                    if let Some(notifier) = &self.notifier {
                        if let Err(e) = notifier
                            .send_bridge_alert(
                                bridge,
                                new_status,
                                previous,
                                severity,
                                outcome.response_time_ms,
                            )
                            .await
                        {
                            error!(bridge = %bridge.name, "Failed to send alert: {:#}", e);
                        }
                    }
                }
            }
            TransitionAction::ResolveIncidents => {
                let resolution = self.incidents.resolve_all(bridge.id)?;
                info!(
                    bridge = %bridge.name,
                    resolved = resolution.resolved_count,
                    "Bridge recovered, incidents resolved"
                );

                if let (Some(notifier), Some(minutes)) =
                    (&self.notifier, resolution.downtime_minutes)
                {
                    if minutes > 0 {
                        if let Err(e) = notifier.send_recovery_alert(bridge, minutes).await {
                            error!(bridge = %bridge.name, "Failed to send recovery alert: {:#}", e);
                        }
                    }
                }
            }
            TransitionAction::None => {}
        }

        // Live observers get every evaluated status, transitions or not.
        self.broadcast.publish(StatusEvent {
            bridge_id: bridge.id,
            bridge_name: bridge.name.clone(),
            status: new_status,
            response_time_ms: outcome.response_time_ms,
            old_status: previous,
            severity: decision.severity,
            checked_at: record.checked_at,
        });

        self.previous
            .set(bridge.id, new_status, self.config.status_ttl);

        info!(
            bridge = %bridge.name,
            status = %new_status,
            response_time_ms = ?outcome.response_time_ms,
            "Check finished"
        );
        Ok(record)
    }

    async fn probe_with_deadline(&self, bridge: &Bridge) -> ProbeOutcome {
        match tokio::time::timeout(self.config.probe_deadline, self.prober.probe(bridge)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(bridge = %bridge.name, "Probe hit the hard deadline");
                ProbeOutcome::timed_out()
            }
        }
    }
}
