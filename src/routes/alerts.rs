use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    model::{Alert, AlertCode, AlertSeverity, AlertStatus},
    service::alerts::{self, AlertFilter},
    state::AppState,
    utils::{filter::parse_time_param, max_time, min_time},
};

use super::json_body;

#[derive(Debug, Default, Deserialize)]
pub struct AlertQuery {
    pub status: Option<AlertStatus>,
    pub severity: Option<AlertSeverity>,
    pub code: Option<AlertCode>,
    pub hostname: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AckRequest {
    pub ids: Vec<String>,
}

/// `GET /alerts?status=NEW&severity=CRITICAL&code=...&hostname=...&from=...&to=...`
pub async fn list_alerts(State(state): State<AppState>, Query(q): Query<AlertQuery>) -> AppResult<Json<Vec<Alert>>> {
    let filter = AlertFilter {
        status: q.status,
        severity: q.severity,
        code: q.code,
        hostname: q.hostname.filter(|h| !h.is_empty()),
        from: parse_time_param(q.from.as_deref(), "from", min_time())?,
        to: parse_time_param(q.to.as_deref(), "to", max_time())?,
    };
    Ok(Json(alerts::list_alerts(&state.db, &filter).await?))
}

/// `POST /alerts/{id}/ack`
pub async fn acknowledge_alert(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<StatusCode> {
    alerts::acknowledge_alert(&state.db, &id).await?;
    tracing::info!(%id, "Alert acknowledged");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /alerts/ack` with `{"ids": [...]}`
pub async fn acknowledge_alerts(
    State(state): State<AppState>,
    payload: Result<Json<AckRequest>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let req = json_body(payload)?;
    let acknowledged = alerts::acknowledge_alerts(&state.db, &req.ids).await?;
    tracing::info!(requested = req.ids.len(), acknowledged, "Alerts acknowledged");
    Ok(Json(json!({ "acknowledged": acknowledged })))
}
