//! Transition tracking -- deciding whether a newly evaluated status opens an
//! incident, resolves the open ones, or does nothing, and what severity an
//! opened incident carries.

use super::HealthStatus;
use serde::{Deserialize, Serialize};

/// Urgency attached to an incident at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(Severity::Low),
            "MEDIUM" => Some(Severity::Medium),
            "HIGH" => Some(Severity::High),
            "CRITICAL" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the caller must do about a newly evaluated status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransitionAction {
    /// No transition edge: nothing to open or close.
    None,
    /// Record a new incident and alert subscribers.
    OpenIncident,
    /// Close every open incident for the bridge and send a recovery alert.
    ResolveIncidents,
}

/// Decision for one (previous, new) status pair. `severity` is set only when
/// the action is `OpenIncident`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionDecision {
    pub action: TransitionAction,
    pub severity: Option<Severity>,
}

impl TransitionDecision {
    const NONE: TransitionDecision = TransitionDecision {
        action: TransitionAction::None,
        severity: None,
    };
}

/// Severity of the current reading given what we knew before.
///
/// A repeated unhealthy reading is less urgent than a fresh transition (we
/// already know about it), and a fresh DOWN is always CRITICAL even when no
/// prior reading exists.
pub fn severity(new: HealthStatus, previous: Option<HealthStatus>) -> Severity {
    if previous == Some(new) {
        return match new {
            HealthStatus::Down => Severity::High,
            HealthStatus::Warning => Severity::Medium,
            HealthStatus::Slow | HealthStatus::Up => Severity::Low,
        };
    }

    match new {
        HealthStatus::Down => Severity::Critical,
        HealthStatus::Warning => {
            if previous == Some(HealthStatus::Up) {
                Severity::High
            } else {
                Severity::Medium
            }
        }
        HealthStatus::Slow => {
            if previous == Some(HealthStatus::Up) {
                Severity::Medium
            } else {
                Severity::Low
            }
        }
        // Recovery is good news.
        HealthStatus::Up => Severity::Low,
    }
}

/// Decide what to do about a newly evaluated status.
///
/// Actions fire only on a transition edge: the previous status must be known
/// and different from the new one. An unhealthy new status opens an incident
/// (a second concurrent incident if one is already open -- e.g. DOWN followed
/// by WARNING opens two; they all close together on recovery). A recovery
/// from any unhealthy status resolves everything open for the bridge.
pub fn decide(new: HealthStatus, previous: Option<HealthStatus>) -> TransitionDecision {
    let prev = match previous {
        Some(p) if p != new => p,
        _ => return TransitionDecision::NONE,
    };

    match new {
        HealthStatus::Down | HealthStatus::Warning | HealthStatus::Slow => TransitionDecision {
            action: TransitionAction::OpenIncident,
            severity: Some(severity(new, Some(prev))),
        },
        HealthStatus::Up => {
            debug_assert!(prev.is_unhealthy());
            TransitionDecision {
                action: TransitionAction::ResolveIncidents,
                severity: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use HealthStatus::{Down, Slow, Up, Warning};

    #[test]
    fn fresh_outage_is_critical() {
        let d = decide(Down, Some(Up));
        assert_eq!(d.action, TransitionAction::OpenIncident);
        assert_eq!(d.severity, Some(Severity::Critical));

        // CRITICAL regardless of where it came from
        assert_eq!(severity(Down, Some(Slow)), Severity::Critical);
        assert_eq!(severity(Down, Some(Warning)), Severity::Critical);
        assert_eq!(severity(Down, None), Severity::Critical);
    }

    #[test]
    fn repeated_reading_takes_no_action() {
        for s in [Up, Slow, Warning, Down] {
            let d = decide(s, Some(s));
            assert_eq!(d.action, TransitionAction::None);
            assert_eq!(d.severity, None);
        }
    }

    #[test]
    fn repeated_reading_severity_is_dampened() {
        assert_eq!(severity(Down, Some(Down)), Severity::High);
        assert_eq!(severity(Warning, Some(Warning)), Severity::Medium);
        assert_eq!(severity(Slow, Some(Slow)), Severity::Low);
        assert_eq!(severity(Up, Some(Up)), Severity::Low);
    }

    #[test]
    fn warning_severity_depends_on_where_it_came_from() {
        assert_eq!(severity(Warning, Some(Up)), Severity::High);
        assert_eq!(severity(Warning, Some(Slow)), Severity::Medium);
        assert_eq!(severity(Warning, Some(Down)), Severity::Medium);
        assert_eq!(severity(Warning, None), Severity::Medium);
    }

    #[test]
    fn slow_severity_depends_on_where_it_came_from() {
        assert_eq!(severity(Slow, Some(Up)), Severity::Medium);
        assert_eq!(severity(Slow, Some(Warning)), Severity::Low);
        assert_eq!(severity(Slow, Some(Down)), Severity::Low);
        assert_eq!(severity(Slow, None), Severity::Low);
    }

    #[test]
    fn recovery_is_low_severity() {
        assert_eq!(severity(Up, Some(Down)), Severity::Low);
        assert_eq!(severity(Up, Some(Warning)), Severity::Low);
        assert_eq!(severity(Up, None), Severity::Low);
    }

    #[test]
    fn recovery_resolves_incidents() {
        for prev in [Down, Warning, Slow] {
            let d = decide(Up, Some(prev));
            assert_eq!(d.action, TransitionAction::ResolveIncidents);
            assert_eq!(d.severity, None);
        }
    }

    #[test]
    fn up_to_up_is_a_no_op() {
        assert_eq!(decide(Up, Some(Up)).action, TransitionAction::None);
    }

    #[test]
    fn unknown_previous_takes_no_action() {
        // No prior reading means no transition edge, whatever the status.
        for s in [Up, Slow, Warning, Down] {
            assert_eq!(decide(s, None).action, TransitionAction::None);
        }
    }

    #[test]
    fn unhealthy_to_different_unhealthy_opens_again() {
        // DOWN -> WARNING opens a second incident alongside the first.
        let d = decide(Warning, Some(Down));
        assert_eq!(d.action, TransitionAction::OpenIncident);
        assert_eq!(d.severity, Some(Severity::Medium));

        let d = decide(Warning, Some(Slow));
        assert_eq!(d.action, TransitionAction::OpenIncident);
        assert_eq!(d.severity, Some(Severity::Medium));
    }

    #[test]
    fn degraded_after_up_scenario() {
        // 35s response, HTTP 200, no flags: WARNING, opened at HIGH from UP.
        let outcome = crate::status::ProbeOutcome::ok(35_000);
        let status = crate::status::evaluate(&outcome);
        assert_eq!(status, Warning);

        let d = decide(status, Some(Up));
        assert_eq!(d.action, TransitionAction::OpenIncident);
        assert_eq!(d.severity, Some(Severity::High));
    }

    #[test]
    fn timeout_after_up_scenario() {
        let outcome = crate::status::ProbeOutcome {
            response_time_ms: None,
            http_code: 200,
            critical_failure: false,
            degraded_service: false,
            detail: serde_json::Value::Null,
            error: None,
        };
        let status = crate::status::evaluate(&outcome);
        assert_eq!(status, Down);

        let d = decide(status, Some(Up));
        assert_eq!(d.action, TransitionAction::OpenIncident);
        assert_eq!(d.severity, Some(Severity::Critical));
    }

    #[test]
    fn fast_recovery_scenario() {
        let outcome = crate::status::ProbeOutcome::ok(2_000);
        let status = crate::status::evaluate(&outcome);
        assert_eq!(status, Up);
        assert_eq!(
            decide(status, Some(Down)).action,
            TransitionAction::ResolveIncidents
        );
    }
}
