//! Route handlers: health, metrics, vault events and log maintenance.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::MetricsSnapshot;
use crate::vault::VaultStage;

const MAX_VAULT_ID_LEN: usize = 128;
const DEFAULT_LOG_LINES: usize = 100;
const MAX_LOG_LINES: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct TransitionBody {
    pub from: VaultStage,
    pub to: VaultStage,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetBody {
    pub signature: String,
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub lines: Option<usize>,
}

/// Health report; 503 once the service counts as unhealthy.
pub async fn health(State(state): State<AppState>) -> Response {
    let report = state.monitor.get_health_status();
    let status = if report.status.is_serving() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report)).into_response()
}

pub async fn metrics_json(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.monitor.get_metrics())
}

pub async fn record_transition(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
    Json(body): Json<TransitionBody>,
) -> Result<StatusCode, ApiError> {
    let vault_id = checked_vault_id(&vault_id)?;
    state
        .monitor
        .log_vault_transition(vault_id, body.from, body.to, body.reason.as_deref());
    Ok(StatusCode::ACCEPTED)
}

pub async fn record_reset(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
    Json(body): Json<ResetBody>,
) -> Result<StatusCode, ApiError> {
    let vault_id = checked_vault_id(&vault_id)?;
    let signature = body.signature.trim();
    if signature.is_empty() {
        return Err(ApiError::bad_request("signature must not be empty"));
    }
    if !body.amount.is_finite() || body.amount < 0.0 {
        return Err(ApiError::bad_request(
            "amount must be a non-negative number",
        ));
    }

    state.monitor.log_timer_reset(vault_id, signature, body.amount);
    Ok(StatusCode::ACCEPTED)
}

/// Tail of today's log file.
pub async fn recent_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let limit = query.lines.unwrap_or(DEFAULT_LOG_LINES).min(MAX_LOG_LINES);
    let monitor = state.monitor.clone();
    let entries = tokio::task::spawn_blocking(move || monitor.recent_logs(limit))
        .await
        .map_err(ApiError::internal)?
        .map_err(ApiError::internal)?;
    Ok(Json(entries))
}

/// Run log retention now instead of waiting for the daily task.
pub async fn cleanup_logs(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let monitor = state.monitor.clone();
    let removed = tokio::task::spawn_blocking(move || monitor.cleanup_old_logs())
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(json!({ "removed": removed })))
}

pub async fn prometheus(State(state): State<AppState>) -> Response {
    match &state.prometheus {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics exporter disabled").into_response(),
    }
}

fn checked_vault_id(raw: &str) -> Result<&str, ApiError> {
    let id = raw.trim();
    if id.is_empty() || id.len() > MAX_VAULT_ID_LEN {
        return Err(ApiError::bad_request(format!(
            "vault id must be 1 to {MAX_VAULT_ID_LEN} characters"
        )));
    }
    Ok(id)
}
