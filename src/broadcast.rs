//! Live status event channel.
//!
//! Every evaluated status (not just transitions) is published here; the
//! WebSocket route forwards events to connected observers.

use crate::status::{HealthStatus, Severity};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

/// One evaluated status, as pushed to observers.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StatusEvent {
    pub bridge_id: i64,
    pub bridge_name: String,
    pub status: HealthStatus,
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_status: Option<HealthStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub checked_at: DateTime<Utc>,
}

/// Cloneable handle over a broadcast channel. Publishing with no observers
/// connected is fine.
#[derive(Clone)]
pub struct StatusBroadcast {
    tx: broadcast::Sender<StatusEvent>,
}

impl StatusBroadcast {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: StatusEvent) {
        // Err means no receivers right now; nothing to do about it.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.tx.subscribe()
    }
}

impl Default for StatusBroadcast {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let bus = StatusBroadcast::default();
        let mut rx = bus.subscribe();

        bus.publish(StatusEvent {
            bridge_id: 1,
            bridge_name: "Stargate".to_string(),
            status: HealthStatus::Up,
            response_time_ms: Some(120),
            old_status: None,
            severity: None,
            checked_at: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.bridge_id, 1);
        assert_eq!(event.status, HealthStatus::Up);
    }

    #[test]
    fn test_publish_without_subscribers_is_harmless() {
        let bus = StatusBroadcast::default();
        bus.publish(StatusEvent {
            bridge_id: 2,
            bridge_name: "Hop Protocol".to_string(),
            status: HealthStatus::Down,
            response_time_ms: None,
            old_status: Some(HealthStatus::Up),
            severity: Some(Severity::Critical),
            checked_at: Utc::now(),
        });
    }
}
