//! Incident records -- opened on unhealthy transitions, resolved in bulk on
//! recovery.

use crate::status::{HealthStatus, Severity};
use crate::storage::Pool;
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

/// A sustained unhealthy period for a bridge.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Incident {
    pub id: Uuid,
    pub bridge_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub state: String, // ACTIVE or RESOLVED
    pub severity: Severity,
    pub started_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub extra: serde_json::Value,
}

/// Result of resolving a bridge's open incidents.
#[derive(Debug, Clone, Copy)]
pub struct Resolution {
    pub resolved_count: usize,
    /// Elapsed time since the earliest open incident started. None when
    /// nothing was open.
    pub downtime_minutes: Option<i64>,
}

pub struct IncidentManager {
    pool: Pool,
}

impl IncidentManager {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Record a new incident for an unhealthy transition. Deliberately does
    /// not dedup against already-open incidents: every unhealthy transition
    /// opens its own record, and they all close together on recovery.
    pub fn open(
        &self,
        bridge_id: i64,
        bridge_name: &str,
        new_status: HealthStatus,
        old_status: HealthStatus,
        severity: Severity,
    ) -> Result<Uuid> {
        let conn = self.pool.get()?;
        let id = Uuid::new_v4();
        let title = format!("{} is {}", bridge_name, new_status);
        let description = format!("Status changed from {} to {}", old_status, new_status);
        let extra = serde_json::json!({ "previous_status": old_status.as_str() });

        conn.execute(
            "INSERT INTO incidents (id, bridge_id, title, description, state, severity, started_at, extra_json)
             VALUES (?1, ?2, ?3, ?4, 'ACTIVE', ?5, ?6, ?7)",
            params![
                id.to_string(),
                bridge_id,
                title,
                description,
                severity.as_str(),
                Utc::now().to_rfc3339(),
                serde_json::to_string(&extra)?,
            ],
        )?;

        Ok(id)
    }

    /// Resolve every active incident for a bridge and report the downtime
    /// measured from the earliest open start time. Overlapping incidents
    /// close together; the downtime covers the whole unhealthy period.
    pub fn resolve_all(&self, bridge_id: i64) -> Result<Resolution> {
        let conn = self.pool.get()?;
        let now = Utc::now();

        let mut stmt = conn.prepare(
            "SELECT started_at FROM incidents WHERE bridge_id = ?1 AND state = 'ACTIVE'",
        )?;
        let rows = stmt.query_map(params![bridge_id], |row| row.get::<_, String>(0))?;

        let mut earliest: Option<DateTime<Utc>> = None;
        let mut count = 0usize;
        for r in rows {
            let started = DateTime::parse_from_rfc3339(&r?)
                .unwrap_or_default()
                .with_timezone(&Utc);
            earliest = Some(match earliest {
                Some(e) if e <= started => e,
                _ => started,
            });
            count += 1;
        }

        if count == 0 {
            return Ok(Resolution {
                resolved_count: 0,
                downtime_minutes: None,
            });
        }

        conn.execute(
            "UPDATE incidents SET state = 'RESOLVED', resolved_at = ?2
             WHERE bridge_id = ?1 AND state = 'ACTIVE'",
            params![bridge_id, now.to_rfc3339()],
        )?;

        let downtime_minutes = earliest.map(|e| (now - e).num_minutes());
        Ok(Resolution {
            resolved_count: count,
            downtime_minutes,
        })
    }

    /// List incidents, newest first.
    pub fn list(&self, bridge_id: Option<i64>, active_only: bool, limit: usize) -> Result<Vec<Incident>> {
        let conn = self.pool.get()?;
        let mut sql = String::from(
            "SELECT id, bridge_id, title, description, state, severity, started_at, resolved_at, extra_json
             FROM incidents WHERE 1=1",
        );
        if bridge_id.is_some() {
            sql.push_str(" AND bridge_id = :bridge_id");
        }
        if active_only {
            sql.push_str(" AND state = 'ACTIVE'");
        }
        sql.push_str(" ORDER BY started_at DESC LIMIT :limit");

        let mut stmt = conn.prepare(&sql)?;
        let limit = limit as i64;
        let bid = bridge_id.unwrap_or_default();
        let mut named: Vec<(&str, &dyn rusqlite::ToSql)> = vec![(":limit", &limit)];
        if bridge_id.is_some() {
            named.push((":bridge_id", &bid));
        }

        let rows = stmt.query_map(named.as_slice(), |row| {
            let id_str: String = row.get(0)?;
            let sev_str: String = row.get(5)?;
            let started_str: String = row.get(6)?;
            let resolved_str: Option<String> = row.get(7)?;
            let extra_str: Option<String> = row.get(8)?;

            Ok(Incident {
                id: Uuid::parse_str(&id_str).unwrap_or_default(),
                bridge_id: row.get(1)?,
                title: row.get(2)?,
                description: row.get(3)?,
                state: row.get(4)?,
                severity: Severity::parse(&sev_str).unwrap_or(Severity::Medium),
                started_at: DateTime::parse_from_rfc3339(&started_str)
                    .unwrap_or_default()
                    .with_timezone(&Utc),
                resolved_at: resolved_str.and_then(|s| {
                    DateTime::parse_from_rfc3339(&s)
                        .ok()
                        .map(|d| d.with_timezone(&Utc))
                }),
                extra: extra_str
                    .and_then(|s| serde_json::from_str(&s).ok())
                    .unwrap_or(serde_json::Value::Null),
            })
        })?;

        let mut incidents = Vec::new();
        for r in rows {
            incidents.push(r?);
        }
        Ok(incidents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{test_pool, upsert_bridge};
    use HealthStatus::{Down, Up, Warning};

    #[test]
    fn test_open_and_list() {
        let (_dir, pool) = test_pool();
        let bridge_id = upsert_bridge(&pool, "Stargate", "https://example.com").unwrap();
        let mgr = IncidentManager::new(pool);

        mgr.open(bridge_id, "Stargate", Down, Up, Severity::Critical)
            .unwrap();

        let active = mgr.list(Some(bridge_id), true, 10).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].severity, Severity::Critical);
        assert_eq!(active[0].title, "Stargate is DOWN");
        assert_eq!(active[0].state, "ACTIVE");
        assert!(active[0].resolved_at.is_none());
    }

    #[test]
    fn test_resolve_all_closes_overlapping_incidents() {
        let (_dir, pool) = test_pool();
        let bridge_id = upsert_bridge(&pool, "Hop Protocol", "https://example.com").unwrap();
        let mgr = IncidentManager::new(pool);

        // DOWN opens one, a later DOWN -> WARNING transition opens a second
        mgr.open(bridge_id, "Hop Protocol", Down, Up, Severity::Critical)
            .unwrap();
        mgr.open(bridge_id, "Hop Protocol", Warning, Down, Severity::Medium)
            .unwrap();
        assert_eq!(mgr.list(Some(bridge_id), true, 10).unwrap().len(), 2);

        let resolution = mgr.resolve_all(bridge_id).unwrap();
        assert_eq!(resolution.resolved_count, 2);
        // both just opened, so the whole window rounds to zero minutes
        assert_eq!(resolution.downtime_minutes, Some(0));

        assert!(mgr.list(Some(bridge_id), true, 10).unwrap().is_empty());
        let all = mgr.list(Some(bridge_id), false, 10).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|i| i.state == "RESOLVED" && i.resolved_at.is_some()));
    }

    #[test]
    fn test_downtime_measured_from_earliest_start() {
        let (_dir, pool) = test_pool();
        let bridge_id = upsert_bridge(&pool, "Polygon Bridge", "https://example.com").unwrap();

        // Backdate an incident 90 minutes, then open a fresher one.
        {
            let conn = pool.get().unwrap();
            let started = (Utc::now() - chrono::Duration::minutes(90)).to_rfc3339();
            conn.execute(
                "INSERT INTO incidents (id, bridge_id, title, state, severity, started_at)
                 VALUES (?1, ?2, 'Polygon Bridge is DOWN', 'ACTIVE', 'CRITICAL', ?3)",
                params![Uuid::new_v4().to_string(), bridge_id, started],
            )
            .unwrap();
        }
        let mgr = IncidentManager::new(pool);
        mgr.open(bridge_id, "Polygon Bridge", Warning, Down, Severity::Medium)
            .unwrap();

        let resolution = mgr.resolve_all(bridge_id).unwrap();
        assert_eq!(resolution.resolved_count, 2);
        assert_eq!(resolution.downtime_minutes, Some(90));
    }

    #[test]
    fn test_resolve_with_nothing_open() {
        let (_dir, pool) = test_pool();
        let bridge_id = upsert_bridge(&pool, "Optimism Bridge", "https://example.com").unwrap();
        let mgr = IncidentManager::new(pool);

        let resolution = mgr.resolve_all(bridge_id).unwrap();
        assert_eq!(resolution.resolved_count, 0);
        assert_eq!(resolution.downtime_minutes, None);
    }
}
