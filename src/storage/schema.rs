//! Database schema and migrations.

use anyhow::Result;
use rusqlite::Connection;

/// Run all pending migrations.
pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS bridges (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            api_endpoint TEXT NOT NULL,
            backup_endpoint TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS bridge_status (
            id INTEGER PRIMARY KEY,
            bridge_id INTEGER NOT NULL REFERENCES bridges(id) ON DELETE CASCADE,
            status TEXT NOT NULL,
            response_time_ms INTEGER,
            error_message TEXT,
            extra_json TEXT,
            checked_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS incidents (
            id TEXT PRIMARY KEY,
            bridge_id INTEGER NOT NULL REFERENCES bridges(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            state TEXT NOT NULL DEFAULT 'ACTIVE',
            severity TEXT NOT NULL DEFAULT 'MEDIUM',
            started_at TEXT NOT NULL,
            resolved_at TEXT,
            extra_json TEXT
        );

        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            recipient_id INTEGER NOT NULL UNIQUE,
            notifications_enabled INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS subscriptions (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            bridge_id INTEGER NOT NULL REFERENCES bridges(id) ON DELETE CASCADE,
            alert_on_down INTEGER NOT NULL DEFAULT 1,
            alert_on_warning INTEGER NOT NULL DEFAULT 1,
            alert_on_slow INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (user_id, bridge_id)
        );

        CREATE INDEX IF NOT EXISTS idx_bridge_status_time ON bridge_status(bridge_id, checked_at);
        CREATE INDEX IF NOT EXISTS idx_bridge_status_status ON bridge_status(status, checked_at);
        CREATE INDEX IF NOT EXISTS idx_incidents_active ON incidents(state, started_at);
        CREATE INDEX IF NOT EXISTS idx_incidents_bridge ON incidents(bridge_id, started_at);
        CREATE INDEX IF NOT EXISTS idx_subscriptions_bridge ON subscriptions(bridge_id);",
    )?;

    Ok(())
}
