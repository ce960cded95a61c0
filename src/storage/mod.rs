//! SQLite storage layer -- schema, queries, migrations.

pub mod incidents;
pub mod schema;
pub mod users;

use anyhow::Result;
use chrono::{DateTime, Utc};
use r2d2::Pool as R2D2Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use crate::status::HealthStatus;

/// Connection Pool type
pub type Pool = R2D2Pool<SqliteConnectionManager>;

/// Open (or create) the SQLite database and return a connection pool.
///
/// Each unit of concurrent work takes its own connection from the pool; no
/// handle is shared across tasks.
pub fn open_pool(path: &str) -> Result<Pool> {
    let manager = SqliteConnectionManager::file(path).with_init(|c| {
        c.execute_batch(
            "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA temp_store = MEMORY;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
        )
    });

    let pool = R2D2Pool::new(manager)?;

    // Run migrations on a single connection
    let conn = pool.get()?;
    schema::migrate(&conn)?;

    Ok(pool)
}

/// A monitored cross-chain bridge.
#[derive(Debug, Clone, Serialize)]
pub struct Bridge {
    pub id: i64,
    pub name: String,
    pub api_endpoint: String,
    pub backup_endpoint: Option<String>,
    pub is_active: bool,
}

/// One row of bridge inspection history.
#[derive(Debug, Clone, Serialize)]
pub struct StatusRecord {
    pub bridge_id: i64,
    pub status: HealthStatus,
    pub response_time_ms: Option<u64>,
    pub error_message: Option<String>,
    pub extra: serde_json::Value,
    pub checked_at: DateTime<Utc>,
}

fn bridge_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Bridge> {
    Ok(Bridge {
        id: row.get(0)?,
        name: row.get(1)?,
        api_endpoint: row.get(2)?,
        backup_endpoint: row.get(3)?,
        is_active: row.get::<_, i64>(4)? != 0,
    })
}

/// List bridges, optionally only the active ones.
pub fn list_bridges(pool: &Pool, active_only: bool) -> Result<Vec<Bridge>> {
    let conn = pool.get()?;
    let sql = if active_only {
        "SELECT id, name, api_endpoint, backup_endpoint, is_active FROM bridges WHERE is_active = 1 ORDER BY id"
    } else {
        "SELECT id, name, api_endpoint, backup_endpoint, is_active FROM bridges ORDER BY id"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], bridge_from_row)?;

    let mut bridges = Vec::new();
    for r in rows {
        bridges.push(r?);
    }
    Ok(bridges)
}

pub fn get_bridge(pool: &Pool, id: i64) -> Result<Option<Bridge>> {
    let conn = pool.get()?;
    let bridge = conn
        .query_row(
            "SELECT id, name, api_endpoint, backup_endpoint, is_active FROM bridges WHERE id = ?1",
            params![id],
            bridge_from_row,
        )
        .optional()?;
    Ok(bridge)
}

pub fn get_bridge_by_name(pool: &Pool, name: &str) -> Result<Option<Bridge>> {
    let conn = pool.get()?;
    let bridge = conn
        .query_row(
            "SELECT id, name, api_endpoint, backup_endpoint, is_active FROM bridges WHERE name = ?1",
            params![name],
            bridge_from_row,
        )
        .optional()?;
    Ok(bridge)
}

/// Insert a bridge, ignoring duplicates by name. Returns its id.
pub fn upsert_bridge(pool: &Pool, name: &str, api_endpoint: &str) -> Result<i64> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO bridges (name, api_endpoint) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET api_endpoint = excluded.api_endpoint",
        params![name, api_endpoint],
    )?;
    let id: i64 = conn.query_row(
        "SELECT id FROM bridges WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Save one status check result.
pub fn save_status(pool: &Pool, record: &StatusRecord) -> Result<()> {
    let conn = pool.get()?;
    let extra_json = if record.extra.is_null() {
        None
    } else {
        Some(serde_json::to_string(&record.extra)?)
    };

    conn.execute(
        "INSERT INTO bridge_status (bridge_id, status, response_time_ms, error_message, extra_json, checked_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.bridge_id,
            record.status.as_str(),
            record.response_time_ms.map(|ms| ms as i64),
            record.error_message,
            extra_json,
            record.checked_at.to_rfc3339(),
        ],
    )?;

    Ok(())
}

fn status_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StatusRecord> {
    let status_str: String = row.get(1)?;
    let response_time_ms: Option<i64> = row.get(2)?;
    let extra_str: Option<String> = row.get(4)?;
    let checked_at_str: String = row.get(5)?;
    Ok(StatusRecord {
        bridge_id: row.get(0)?,
        status: HealthStatus::parse(&status_str).unwrap_or(HealthStatus::Down),
        response_time_ms: response_time_ms.map(|ms| ms as u64),
        error_message: row.get(3)?,
        extra: extra_str
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or(serde_json::Value::Null),
        checked_at: DateTime::parse_from_rfc3339(&checked_at_str)
            .unwrap_or_default()
            .with_timezone(&Utc),
    })
}

/// Most recent status row for a bridge, if any.
pub fn latest_status(pool: &Pool, bridge_id: i64) -> Result<Option<StatusRecord>> {
    let conn = pool.get()?;
    let record = conn
        .query_row(
            "SELECT bridge_id, status, response_time_ms, error_message, extra_json, checked_at
             FROM bridge_status WHERE bridge_id = ?1 ORDER BY checked_at DESC LIMIT 1",
            params![bridge_id],
            status_from_row,
        )
        .optional()?;
    Ok(record)
}

/// Status history for a bridge over the trailing window.
pub fn status_history(pool: &Pool, bridge_id: i64, hours: u64) -> Result<Vec<StatusRecord>> {
    let conn = pool.get()?;
    let since = (Utc::now() - chrono::Duration::hours(hours as i64)).to_rfc3339();

    let mut stmt = conn.prepare(
        "SELECT bridge_id, status, response_time_ms, error_message, extra_json, checked_at
         FROM bridge_status WHERE bridge_id = ?1 AND checked_at > ?2
         ORDER BY checked_at DESC",
    )?;
    let rows = stmt.query_map(params![bridge_id, since], status_from_row)?;

    let mut records = Vec::new();
    for r in rows {
        records.push(r?);
    }
    Ok(records)
}

/// The bridges the original deployment watched; used by `bridgewatch seed`.
pub const DEFAULT_BRIDGES: &[(&str, &str)] = &[
    ("Stargate", "https://stargate.finance/api/v1/tokens"),
    ("Hop Protocol", "https://api.hop.exchange/v1/quote"),
    ("Arbitrum Bridge", "https://bridge.arbitrum.io"),
    ("Optimism Bridge", "https://app.optimism.io/bridge"),
    ("Polygon Bridge", "https://wallet.polygon.technology/polygon/bridge"),
];

/// Seed the default bridge set. Idempotent.
pub fn seed_bridges(pool: &Pool) -> Result<usize> {
    for (name, endpoint) in DEFAULT_BRIDGES {
        upsert_bridge(pool, name, endpoint)?;
    }
    Ok(DEFAULT_BRIDGES.len())
}

#[cfg(test)]
pub(crate) fn test_pool() -> (tempfile::TempDir, Pool) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    let pool = open_pool(path.to_str().unwrap()).unwrap();
    (dir, pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_roundtrip() {
        let (_dir, pool) = test_pool();
        let id = upsert_bridge(&pool, "Stargate", "https://stargate.finance/api/v1/tokens").unwrap();

        let bridge = get_bridge(&pool, id).unwrap().unwrap();
        assert_eq!(bridge.name, "Stargate");
        assert!(bridge.is_active);

        // upsert with same name keeps one row
        upsert_bridge(&pool, "Stargate", "https://example.com").unwrap();
        assert_eq!(list_bridges(&pool, true).unwrap().len(), 1);
    }

    #[test]
    fn test_status_history_roundtrip() {
        let (_dir, pool) = test_pool();
        let id = upsert_bridge(&pool, "Hop Protocol", "https://api.hop.exchange/v1/quote").unwrap();

        assert!(latest_status(&pool, id).unwrap().is_none());

        save_status(
            &pool,
            &StatusRecord {
                bridge_id: id,
                status: HealthStatus::Slow,
                response_time_ms: Some(15_000),
                error_message: None,
                extra: serde_json::json!({ "method": "quote_api" }),
                checked_at: Utc::now(),
            },
        )
        .unwrap();

        let latest = latest_status(&pool, id).unwrap().unwrap();
        assert_eq!(latest.status, HealthStatus::Slow);
        assert_eq!(latest.response_time_ms, Some(15_000));

        let history = status_history(&pool, id, 1).unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_seed_is_idempotent() {
        let (_dir, pool) = test_pool();
        seed_bridges(&pool).unwrap();
        seed_bridges(&pool).unwrap();
        assert_eq!(list_bridges(&pool, true).unwrap().len(), DEFAULT_BRIDGES.len());
    }
}
