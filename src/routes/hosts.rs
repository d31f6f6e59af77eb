use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    model::HostData,
    service::hosts,
    state::AppState,
    utils::FilterQuery,
};

use super::json_body;

/// `POST /data/hosts`: agent upload of a host snapshot.
pub async fn insert_host_data(
    State(state): State<AppState>,
    payload: Result<Json<HostData>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let host = json_body(payload)?;
    if state.config.data_service.log_inserting_hostdata {
        tracing::info!(hostdata = %serde_json::to_string(&host).unwrap_or_default(), "Inserting host data");
    }

    let hostname = host.hostname.clone();
    match hosts::insert_host_data(&state.db, host).await {
        Ok(inserted) => {
            state.metrics.inc_hostdata_inserted();
            state.metrics.add_alerts_raised(inserted.alerts.len() as u64);
            for alert in &inserted.alerts {
                tracing::info!(%hostname, code = alert.alert_code.as_str(), severity = alert.alert_severity.as_str(), "{}", alert.description);
            }
            tracing::info!(%hostname, id = %inserted.id, "Host data inserted");
            Ok((StatusCode::OK, Json(json!({ "id": inserted.id }))))
        }
        Err(e @ AppError::ValidationError { .. }) => {
            state.metrics.inc_hostdata_rejected();
            tracing::warn!(%hostname, "Rejected host data: {}", e);
            Err(e)
        }
        Err(e) => Err(e),
    }
}

/// `GET /hosts`
pub async fn list_hosts(State(state): State<AppState>, Query(q): Query<FilterQuery>) -> AppResult<Json<Vec<HostData>>> {
    let filter = q.global_filter()?;
    Ok(Json(hosts::list_hosts(&state.db, &filter).await?))
}

/// `GET /hosts/{hostname}`
pub async fn get_host(
    State(state): State<AppState>,
    Path(hostname): Path<String>,
    Query(q): Query<FilterQuery>,
) -> AppResult<Json<HostData>> {
    let filter = q.global_filter()?;
    Ok(Json(hosts::get_host(&state.db, &hostname, filter.older_than).await?))
}

/// `DELETE /hosts/{hostname}`: dismisses the host by archiving its current snapshot.
pub async fn dismiss_host(State(state): State<AppState>, Path(hostname): Path<String>) -> AppResult<StatusCode> {
    hosts::archive_host(&state.db, &hostname).await?;
    tracing::info!(%hostname, "Host dismissed");
    Ok(StatusCode::NO_CONTENT)
}
