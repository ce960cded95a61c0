//! Alert message formatting.

use crate::status::{HealthStatus, Severity};
use chrono::Utc;

fn status_emoji(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Up => "\u{1F7E2}",      // green circle
        HealthStatus::Slow => "\u{1F7E1}",    // yellow circle
        HealthStatus::Warning => "\u{26A0}",  // warning sign
        HealthStatus::Down => "\u{1F534}",    // red circle
    }
}

fn severity_emoji(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "\u{1F7E1}",
        Severity::Medium => "\u{1F7E0}",
        Severity::High => "\u{1F534}",
        Severity::Critical => "\u{1F525}", // fire
    }
}

/// Status-change alert: what happened, how bad, how slow.
pub fn format_alert(
    bridge_name: &str,
    new_status: HealthStatus,
    old_status: Option<HealthStatus>,
    severity: Severity,
    response_time_ms: Option<u64>,
) -> String {
    let mut lines = vec![
        format!("{} ALERT: {}", status_emoji(new_status), bridge_name),
        format!("Status: {}", new_status),
    ];

    if let Some(old) = old_status {
        if old != new_status {
            lines.push(format!("Changed from: {}", old));
        }
    }

    lines.push(format!("Severity: {} {}", severity_emoji(severity), severity));

    match response_time_ms {
        Some(ms) => lines.push(format!("Response time: {}ms", ms)),
        None if new_status == HealthStatus::Down => {
            lines.push("Response: timeout".to_string())
        }
        None => {}
    }

    lines.push(format!("\nTime: {} UTC", Utc::now().format("%H:%M:%S")));
    lines.join("\n")
}

/// Recovery alert: the bridge is back, and for how long it was not.
pub fn format_recovery(bridge_name: &str, downtime_minutes: i64) -> String {
    format!(
        "\u{1F7E2} RECOVERED: {}\nStatus: UP\nDowntime: {} minutes\n\nBridge is back to normal operation!",
        bridge_name, downtime_minutes
    )
}
