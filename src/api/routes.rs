//! API route definitions.

use super::state::AppState;
use crate::storage::{self, incidents::IncidentManager};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/bridges", get(list_bridges))
        .route("/bridges/{id}", get(get_bridge))
        .route("/bridges/{id}/history", get(bridge_history))
        .route("/bridges/{id}/incidents", get(bridge_incidents))
        .route("/incidents", get(list_incidents))
}

fn envelope(data: Value) -> Json<Value> {
    Json(json!({
        "data": data,
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

fn internal_error(e: anyhow::Error) -> (StatusCode, Json<Value>) {
    tracing::error!("API error: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal error" })),
    )
}

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

async fn health() -> Json<Value> {
    envelope(json!({ "status": "ok" }))
}

#[derive(Deserialize)]
struct BridgesQuery {
    #[serde(default = "default_true")]
    active_only: bool,
}

fn default_true() -> bool {
    true
}

fn bridge_with_latest(state: &AppState, bridge: &storage::Bridge) -> anyhow::Result<Value> {
    let latest = storage::latest_status(&state.pool, bridge.id)?;
    Ok(json!({
        "id": bridge.id,
        "name": bridge.name,
        "api_endpoint": bridge.api_endpoint,
        "is_active": bridge.is_active,
        "latest_status": latest.map(|s| json!({
            "status": s.status,
            "response_time_ms": s.response_time_ms,
            "checked_at": s.checked_at.to_rfc3339(),
        })),
    }))
}

async fn list_bridges(State(state): State<AppState>, Query(q): Query<BridgesQuery>) -> ApiResult {
    let bridges = storage::list_bridges(&state.pool, q.active_only).map_err(internal_error)?;
    let mut out = Vec::with_capacity(bridges.len());
    for bridge in &bridges {
        out.push(bridge_with_latest(&state, bridge).map_err(internal_error)?);
    }
    Ok(envelope(json!(out)))
}

async fn get_bridge(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult {
    let bridge = storage::get_bridge(&state.pool, id).map_err(internal_error)?;
    match bridge {
        Some(bridge) => {
            let body = bridge_with_latest(&state, &bridge).map_err(internal_error)?;
            Ok(envelope(body))
        }
        None => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "bridge not found" })),
        )),
    }
}

#[derive(Deserialize)]
struct HistoryQuery {
    #[serde(default = "default_hours")]
    hours: u64,
}

fn default_hours() -> u64 {
    24
}

async fn bridge_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(q): Query<HistoryQuery>,
) -> ApiResult {
    if storage::get_bridge(&state.pool, id)
        .map_err(internal_error)?
        .is_none()
    {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "bridge not found" })),
        ));
    }

    let history = storage::status_history(&state.pool, id, q.hours).map_err(internal_error)?;
    let rows: Vec<Value> = history
        .iter()
        .map(|s| {
            json!({
                "status": s.status,
                "response_time_ms": s.response_time_ms,
                "error_message": s.error_message,
                "checked_at": s.checked_at.to_rfc3339(),
            })
        })
        .collect();
    Ok(envelope(json!({ "bridge_id": id, "hours": q.hours, "history": rows })))
}

#[derive(Deserialize)]
struct IncidentsQuery {
    #[serde(default)]
    active_only: bool,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    50
}

fn incidents_json(
    state: &AppState,
    bridge_id: Option<i64>,
    active_only: bool,
    limit: usize,
) -> anyhow::Result<Value> {
    let incidents = IncidentManager::new(state.pool.clone()).list(bridge_id, active_only, limit)?;
    let rows: Vec<Value> = incidents
        .iter()
        .map(|i| {
            json!({
                "id": i.id,
                "bridge_id": i.bridge_id,
                "title": i.title,
                "description": i.description,
                "state": i.state,
                "severity": i.severity,
                "started_at": i.started_at.to_rfc3339(),
                "resolved_at": i.resolved_at.map(|t| t.to_rfc3339()),
            })
        })
        .collect();
    Ok(json!(rows))
}

async fn bridge_incidents(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(q): Query<IncidentsQuery>,
) -> ApiResult {
    let rows = incidents_json(&state, Some(id), q.active_only, q.limit).map_err(internal_error)?;
    Ok(envelope(rows))
}

async fn list_incidents(State(state): State<AppState>, Query(q): Query<IncidentsQuery>) -> ApiResult {
    let rows = incidents_json(&state, None, q.active_only, q.limit).map_err(internal_error)?;
    Ok(envelope(rows))
}
