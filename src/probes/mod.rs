//! Bridge health probes.
//!
//! Each bridge is checked over plain HTTP: a protocol API where one exists
//! (Stargate, Hop), the public portal otherwise. The prober owns the wall
//! clock and the error conversion; whatever happens inside a check, the
//! monitor always receives a `ProbeOutcome`, never an error.

pub mod hop;
pub mod http;
pub mod portal;
pub mod stargate;

use crate::status::ProbeOutcome;
use crate::storage::Bridge;
use reqwest::Client;
use std::time::{Duration, Instant};

/// Default per-probe deadline.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(15);
/// Hop's quote API is built for real transfers, not health checks, and
/// routinely takes 15-30s. Its probe gets a wider budget so a slow-but-alive
/// response lands in SLOW/WARNING instead of DOWN.
pub const HOP_TIMEOUT: Duration = Duration::from_secs(40);

/// What a bridge-specific check observed, before timing is attached.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub http_code: u16,
    pub critical_failure: bool,
    pub degraded_service: bool,
    /// The probe gave up waiting; reported upstream as an absent response
    /// time.
    pub timed_out: bool,
    pub detail: serde_json::Value,
    pub error: Option<String>,
}

impl Default for CheckResult {
    fn default() -> Self {
        Self {
            http_code: 200,
            critical_failure: false,
            degraded_service: false,
            timed_out: false,
            detail: serde_json::Value::Null,
            error: None,
        }
    }
}

/// Seam between the monitor and the probing machinery. Tests script outcomes
/// through this.
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, bridge: &Bridge) -> ProbeOutcome;
}

/// Production prober: dispatches to a bridge-specific check by name, falling
/// back to a generic availability check of the configured endpoint.
pub struct BridgeProber {
    client: Client,
}

impl Default for BridgeProber {
    fn default() -> Self {
        Self {
            // Per-request timeouts are set in the individual checks; the
            // connect timeout bounds dead hosts.
            client: Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

#[async_trait::async_trait]
impl Prober for BridgeProber {
    async fn probe(&self, bridge: &Bridge) -> ProbeOutcome {
        let start = Instant::now();

        let result = match bridge.name.as_str() {
            "Stargate" => stargate::check(&self.client).await,
            "Hop Protocol" => hop::check(&self.client).await,
            "Arbitrum Bridge" => portal::check(&self.client, "https://bridge.arbitrum.io").await,
            "Optimism Bridge" => portal::check(&self.client, "https://app.optimism.io/bridge").await,
            "Polygon Bridge" => {
                portal::check(&self.client, "https://wallet.polygon.technology/polygon/bridge").await
            }
            _ => http::check_generic(&self.client, &bridge.api_endpoint).await,
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        ProbeOutcome {
            response_time_ms: if result.timed_out { None } else { Some(elapsed_ms) },
            http_code: result.http_code,
            critical_failure: result.critical_failure,
            degraded_service: result.degraded_service,
            detail: result.detail,
            error: result.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{evaluate, HealthStatus};

    #[test]
    fn timed_out_check_evaluates_down() {
        let result = CheckResult {
            critical_failure: true,
            timed_out: true,
            error: Some("request timeout".to_string()),
            ..Default::default()
        };
        let outcome = ProbeOutcome {
            response_time_ms: if result.timed_out { None } else { Some(0) },
            http_code: result.http_code,
            critical_failure: result.critical_failure,
            degraded_service: result.degraded_service,
            detail: result.detail,
            error: result.error,
        };
        assert_eq!(outcome.response_time_ms, None);
        assert_eq!(evaluate(&outcome), HealthStatus::Down);
    }
}
