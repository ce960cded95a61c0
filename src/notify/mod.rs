//! Push notifications to subscribed users.
//!
//! The actual delivery channel lives behind `PushSender`; this module owns
//! subscriber filtering, per-(bridge, status) cooldowns, inter-send pacing,
//! and the blocked-recipient disable policy.

pub mod message;

use crate::monitor::cache::TtlCache;
use crate::status::{HealthStatus, Severity};
use crate::storage::{users, Bridge, Pool};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

/// Pause between individual sends, to stay under push-API rate limits.
const SEND_PACING: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The recipient blocked the sender or the chat no longer exists.
    /// Retrying is pointless; the recipient gets disabled.
    #[error("recipient rejected delivery")]
    Blocked,
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// Delivery seam. The daemon wires a real push channel in here; tests wire a
/// recorder.
#[async_trait::async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, recipient_id: i64, text: &str) -> Result<(), DeliveryError>;
}

/// Default sender: logs the alert instead of delivering it. Deployments wire
/// a real push channel (Telegram bot, webhook relay, ...) behind `PushSender`;
/// the daemon itself stays chat-platform-agnostic.
pub struct LogSender;

#[async_trait::async_trait]
impl PushSender for LogSender {
    async fn send(&self, recipient_id: i64, text: &str) -> Result<(), DeliveryError> {
        info!(recipient = recipient_id, "ALERT (log sender): {}", text.replace('\n', " | "));
        Ok(())
    }
}

pub struct Notifier {
    pool: Pool,
    sender: Arc<dyn PushSender>,
    cooldown: Duration,
    cooldowns: TtlCache<(i64, HealthStatus), ()>,
}

impl Notifier {
    pub fn new(pool: Pool, sender: Arc<dyn PushSender>, cooldown: Duration) -> Self {
        Self {
            pool,
            sender,
            cooldown,
            cooldowns: TtlCache::new(),
        }
    }

    /// Alert subscribers about a status change. Repeats of the same
    /// (bridge, status) alert within the cooldown window are skipped.
    pub async fn send_bridge_alert(
        &self,
        bridge: &Bridge,
        new_status: HealthStatus,
        old_status: Option<HealthStatus>,
        severity: Severity,
        response_time_ms: Option<u64>,
    ) -> Result<()> {
        let rate_key = (bridge.id, new_status);
        if self.cooldowns.contains(&rate_key) {
            info!(bridge = %bridge.name, status = %new_status, "Alert rate limited");
            return Ok(());
        }

        let subscribers = users::subscribers_for(&self.pool, bridge.id, new_status)?;
        if subscribers.is_empty() {
            info!(bridge = %bridge.name, status = %new_status, "No subscribers for alert");
            return Ok(());
        }

        let text = message::format_alert(
            &bridge.name,
            new_status,
            old_status,
            severity,
            response_time_ms,
        );

        let (sent, failed) = self.deliver(&subscribers, &text).await;
        self.cooldowns.set(rate_key, (), self.cooldown);

        info!(
            bridge = %bridge.name,
            status = %new_status,
            sent,
            failed,
            "Alert dispatched"
        );
        Ok(())
    }

    /// Recovery alerts are never rate limited: subscribers want the good news
    /// as soon as it happens.
    pub async fn send_recovery_alert(&self, bridge: &Bridge, downtime_minutes: i64) -> Result<()> {
        let subscribers = users::subscribers_for(&self.pool, bridge.id, HealthStatus::Up)?;
        if subscribers.is_empty() {
            return Ok(());
        }

        let text = message::format_recovery(&bridge.name, downtime_minutes);
        let (sent, _) = self.deliver(&subscribers, &text).await;

        info!(bridge = %bridge.name, sent, "Recovery alert dispatched");
        Ok(())
    }

    async fn deliver(&self, subscribers: &[users::Subscriber], text: &str) -> (usize, usize) {
        let mut sent = 0usize;
        let mut failed = 0usize;

        for (i, sub) in subscribers.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(SEND_PACING).await;
            }

            match self.sender.send(sub.recipient_id, text).await {
                Ok(()) => sent += 1,
                Err(DeliveryError::Blocked) => {
                    failed += 1;
                    if let Err(e) = users::disable_notifications(&self.pool, sub.recipient_id) {
                        error!(recipient = sub.recipient_id, "Failed to disable notifications: {}", e);
                    } else {
                        info!(recipient = sub.recipient_id, "Notifications disabled (delivery rejected)");
                    }
                }
                Err(e) => {
                    failed += 1;
                    error!(recipient = sub.recipient_id, "Failed to send alert: {}", e);
                }
            }
        }

        (sent, failed)
    }
}
