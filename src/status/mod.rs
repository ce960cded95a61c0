//! Status evaluation -- turning a raw probe outcome into a discrete health
//! state, and deciding when a state change opens or resolves incidents.
//!
//! Everything in this module is pure and synchronous. The monitor owns the
//! cache, the storage, and the notification fan-out; this module only maps
//! inputs to outputs.

pub mod transition;

pub use transition::{decide, severity, Severity, TransitionAction, TransitionDecision};

use serde::{Deserialize, Serialize};

/// Raw result of a single bridge probe. Transient, one per check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Wall-clock response time in milliseconds. `None` means the probe
    /// timed out entirely.
    pub response_time_ms: Option<u64>,
    /// HTTP status code observed (500 for transport-level failures).
    pub http_code: u16,
    /// Bridge-specific hard failure (no liquidity, contract unreachable, ...).
    pub critical_failure: bool,
    /// Bridge-specific soft failure (degraded API, partial outage).
    pub degraded_service: bool,
    /// Bridge-specific readings (token counts, bonder fees, check method).
    /// Persisted alongside the status row.
    #[serde(default)]
    pub detail: serde_json::Value,
    /// Human-readable error when the probe itself failed.
    #[serde(default)]
    pub error: Option<String>,
}

impl ProbeOutcome {
    /// An outcome representing a healthy, fast response.
    pub fn ok(response_time_ms: u64) -> Self {
        Self {
            response_time_ms: Some(response_time_ms),
            http_code: 200,
            critical_failure: false,
            degraded_service: false,
            detail: serde_json::Value::Null,
            error: None,
        }
    }

    /// An outcome for a probe that errored out before producing a response.
    /// Probe failures never propagate as errors into the evaluator; they
    /// arrive as a critical-failure outcome instead.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            response_time_ms: None,
            http_code: 500,
            critical_failure: true,
            degraded_service: false,
            detail: serde_json::Value::Null,
            error: Some(error.into()),
        }
    }

    /// An outcome for a probe that hit its deadline.
    pub fn timed_out() -> Self {
        Self {
            response_time_ms: None,
            http_code: 200,
            critical_failure: true,
            degraded_service: false,
            detail: serde_json::json!({ "error": "timeout" }),
            error: Some("request timeout".to_string()),
        }
    }
}

/// Evaluated condition of a bridge at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    Slow,
    Warning,
    Down,
}

impl HealthStatus {
    pub fn is_unhealthy(self) -> bool {
        !matches!(self, HealthStatus::Up)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Up => "UP",
            HealthStatus::Slow => "SLOW",
            HealthStatus::Warning => "WARNING",
            HealthStatus::Down => "DOWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UP" => Some(HealthStatus::Up),
            "SLOW" => Some(HealthStatus::Slow),
            "WARNING" => Some(HealthStatus::Warning),
            "DOWN" => Some(HealthStatus::Down),
            _ => None,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response time above which a bridge counts as SLOW (exclusive).
pub const SLOW_THRESHOLD_MS: u64 = 10_000;
/// Response time above which a bridge counts as WARNING (exclusive).
pub const WARNING_THRESHOLD_MS: u64 = 30_000;

/// Map a probe outcome to a health status.
///
/// The rules are checked in order and the first match wins. The order is
/// significant: an HTTP error outranks a timeout, which outranks the
/// bridge-specific flags, which outrank the latency tiers.
pub fn evaluate(outcome: &ProbeOutcome) -> HealthStatus {
    if outcome.http_code != 200 {
        return HealthStatus::Down;
    }

    // No response at all: the probe gave up waiting.
    let response_time_ms = match outcome.response_time_ms {
        Some(ms) => ms,
        None => return HealthStatus::Down,
    };

    if outcome.critical_failure {
        return HealthStatus::Down;
    }

    if outcome.degraded_service {
        return HealthStatus::Warning;
    }

    // Thresholds are exclusive lower bounds: exactly 10s is still UP,
    // exactly 30s is still SLOW.
    if response_time_ms > WARNING_THRESHOLD_MS {
        HealthStatus::Warning
    } else if response_time_ms > SLOW_THRESHOLD_MS {
        HealthStatus::Slow
    } else {
        HealthStatus::Up
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(response_time_ms: Option<u64>, http_code: u16) -> ProbeOutcome {
        ProbeOutcome {
            response_time_ms,
            http_code,
            critical_failure: false,
            degraded_service: false,
            detail: serde_json::Value::Null,
            error: None,
        }
    }

    #[test]
    fn fast_response_is_up() {
        assert_eq!(evaluate(&outcome(Some(150), 200)), HealthStatus::Up);
        assert_eq!(evaluate(&outcome(Some(9_999), 200)), HealthStatus::Up);
    }

    #[test]
    fn threshold_boundaries_are_exclusive() {
        // exactly 10s: UP, not SLOW
        assert_eq!(evaluate(&outcome(Some(10_000), 200)), HealthStatus::Up);
        assert_eq!(evaluate(&outcome(Some(10_001), 200)), HealthStatus::Slow);
        // exactly 30s: SLOW, not WARNING
        assert_eq!(evaluate(&outcome(Some(30_000), 200)), HealthStatus::Slow);
        assert_eq!(evaluate(&outcome(Some(30_001), 200)), HealthStatus::Warning);
    }

    #[test]
    fn sluggish_response_is_slow() {
        assert_eq!(evaluate(&outcome(Some(15_000), 200)), HealthStatus::Slow);
        assert_eq!(evaluate(&outcome(Some(29_000), 200)), HealthStatus::Slow);
    }

    #[test]
    fn very_slow_response_is_warning() {
        assert_eq!(evaluate(&outcome(Some(35_000), 200)), HealthStatus::Warning);
        assert_eq!(evaluate(&outcome(Some(120_000), 200)), HealthStatus::Warning);
    }

    #[test]
    fn non_200_is_down_regardless_of_latency() {
        assert_eq!(evaluate(&outcome(Some(100), 500)), HealthStatus::Down);
        assert_eq!(evaluate(&outcome(Some(100), 404)), HealthStatus::Down);
        assert_eq!(evaluate(&outcome(None, 503)), HealthStatus::Down);

        // even with the soft flags set, the HTTP code rules first
        let mut o = outcome(Some(100), 502);
        o.degraded_service = true;
        assert_eq!(evaluate(&o), HealthStatus::Down);
    }

    #[test]
    fn timeout_is_down() {
        assert_eq!(evaluate(&outcome(None, 200)), HealthStatus::Down);
    }

    #[test]
    fn critical_failure_forces_down() {
        let mut o = outcome(Some(500), 200);
        o.critical_failure = true;
        assert_eq!(evaluate(&o), HealthStatus::Down);
    }

    #[test]
    fn degraded_service_forces_warning_even_when_fast() {
        let mut o = outcome(Some(500), 200);
        o.degraded_service = true;
        assert_eq!(evaluate(&o), HealthStatus::Warning);
    }

    #[test]
    fn critical_outranks_degraded() {
        let mut o = outcome(Some(500), 200);
        o.critical_failure = true;
        o.degraded_service = true;
        assert_eq!(evaluate(&o), HealthStatus::Down);
    }

    #[test]
    fn timeout_outranks_flags() {
        // rule order: the timeout check fires before the flag checks
        let mut o = outcome(None, 200);
        o.degraded_service = true;
        assert_eq!(evaluate(&o), HealthStatus::Down);
    }

    #[test]
    fn failed_constructor_evaluates_down() {
        assert_eq!(
            evaluate(&ProbeOutcome::failed("connection refused")),
            HealthStatus::Down
        );
        assert_eq!(evaluate(&ProbeOutcome::timed_out()), HealthStatus::Down);
    }

    #[test]
    fn status_round_trips_through_str() {
        for s in [
            HealthStatus::Up,
            HealthStatus::Slow,
            HealthStatus::Warning,
            HealthStatus::Down,
        ] {
            assert_eq!(HealthStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(HealthStatus::parse("UNKNOWN"), None);
    }
}
