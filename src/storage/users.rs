//! Subscribers and their alert preferences.

use crate::status::HealthStatus;
use crate::storage::Pool;
use anyhow::Result;
use rusqlite::params;

/// A user who can receive push alerts.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Subscriber {
    pub recipient_id: i64,
}

/// Register a user (no-op if already present). Returns the user row id.
pub fn upsert_user(pool: &Pool, recipient_id: i64) -> Result<i64> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO users (recipient_id) VALUES (?1)
         ON CONFLICT(recipient_id) DO NOTHING",
        params![recipient_id],
    )?;
    let id: i64 = conn.query_row(
        "SELECT id FROM users WHERE recipient_id = ?1",
        params![recipient_id],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Subscribe a user to a bridge with alert class preferences.
pub fn subscribe(
    pool: &Pool,
    recipient_id: i64,
    bridge_id: i64,
    alert_on_down: bool,
    alert_on_warning: bool,
    alert_on_slow: bool,
) -> Result<()> {
    let user_id = upsert_user(pool, recipient_id)?;
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO subscriptions (user_id, bridge_id, alert_on_down, alert_on_warning, alert_on_slow)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(user_id, bridge_id) DO UPDATE SET
             alert_on_down = excluded.alert_on_down,
             alert_on_warning = excluded.alert_on_warning,
             alert_on_slow = excluded.alert_on_slow",
        params![user_id, bridge_id, alert_on_down, alert_on_warning, alert_on_slow],
    )?;
    Ok(())
}

/// Users who should hear about this bridge entering `status`: notifications
/// enabled, subscribed to the bridge, opted into the alert class. Recovery
/// (UP) reuses the DOWN opt-in.
pub fn subscribers_for(pool: &Pool, bridge_id: i64, status: HealthStatus) -> Result<Vec<Subscriber>> {
    let flag_column = match status {
        HealthStatus::Warning => "alert_on_warning",
        HealthStatus::Slow => "alert_on_slow",
        HealthStatus::Down | HealthStatus::Up => "alert_on_down",
    };

    let conn = pool.get()?;
    let sql = format!(
        "SELECT u.recipient_id FROM users u
         JOIN subscriptions s ON s.user_id = u.id
         WHERE u.notifications_enabled = 1
           AND s.bridge_id = ?1
           AND s.{flag_column} = 1
         ORDER BY u.recipient_id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![bridge_id], |row| {
        Ok(Subscriber {
            recipient_id: row.get(0)?,
        })
    })?;

    let mut subscribers = Vec::new();
    for r in rows {
        subscribers.push(r?);
    }
    Ok(subscribers)
}

/// Stop sending to a recipient that rejected delivery (blocked the sender or
/// deleted the chat).
pub fn disable_notifications(pool: &Pool, recipient_id: i64) -> Result<()> {
    let conn = pool.get()?;
    conn.execute(
        "UPDATE users SET notifications_enabled = 0 WHERE recipient_id = ?1",
        params![recipient_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{test_pool, upsert_bridge};

    #[test]
    fn test_subscriber_filtering_by_alert_class() {
        let (_dir, pool) = test_pool();
        let bridge_id = upsert_bridge(&pool, "Stargate", "https://example.com").unwrap();

        // 100 wants everything, 200 only DOWN, 300 nothing for this bridge
        subscribe(&pool, 100, bridge_id, true, true, true).unwrap();
        subscribe(&pool, 200, bridge_id, true, false, false).unwrap();
        upsert_user(&pool, 300).unwrap();

        let down = subscribers_for(&pool, bridge_id, HealthStatus::Down).unwrap();
        assert_eq!(
            down.iter().map(|s| s.recipient_id).collect::<Vec<_>>(),
            vec![100, 200]
        );

        let slow = subscribers_for(&pool, bridge_id, HealthStatus::Slow).unwrap();
        assert_eq!(slow.len(), 1);
        assert_eq!(slow[0].recipient_id, 100);

        // recovery goes to the DOWN subscribers
        let up = subscribers_for(&pool, bridge_id, HealthStatus::Up).unwrap();
        assert_eq!(up.len(), 2);
    }

    #[test]
    fn test_disable_notifications_removes_subscriber() {
        let (_dir, pool) = test_pool();
        let bridge_id = upsert_bridge(&pool, "Hop Protocol", "https://example.com").unwrap();
        subscribe(&pool, 100, bridge_id, true, true, true).unwrap();

        disable_notifications(&pool, 100).unwrap();
        assert!(subscribers_for(&pool, bridge_id, HealthStatus::Down)
            .unwrap()
            .is_empty());
    }
}
