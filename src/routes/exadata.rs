use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    dto::{to_oracle_exadata_instance, OracleExadataInstance},
    error::AppResult,
    model,
    service::exadata,
    state::AppState,
    utils::FilterQuery,
};

use super::json_body;

#[derive(Debug, Default, Deserialize)]
pub struct ExadataListQuery {
    pub location: Option<String>,
    pub environment: Option<String>,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterNamesRequest {
    pub cluster_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterNameRequest {
    pub cluster_name: String,
}

/// `POST /data/exadata`: agent upload of a rack, merged into the stored one.
pub async fn save_exadata(
    State(state): State<AppState>,
    payload: Result<Json<model::OracleExadataInstance>, JsonRejection>,
) -> AppResult<StatusCode> {
    let rack = json_body(payload)?;
    let rack_id = rack.rack_id.clone();
    exadata::save_exadata(&state.db, rack).await?;
    state.metrics.inc_exadata_saved();
    tracing::info!(%rack_id, "Exadata saved");
    Ok(StatusCode::OK)
}

/// `GET /exadata`
pub async fn list_exadata(
    State(state): State<AppState>,
    Query(q): Query<ExadataListQuery>,
) -> AppResult<Json<Vec<OracleExadataInstance>>> {
    let filter = FilterQuery { location: q.location, environment: q.environment, ..Default::default() }.global_filter()?;
    let racks = exadata::list_exadata(&state.db, &filter, q.hidden).await?;
    let out = racks.iter().map(to_oracle_exadata_instance).collect::<Result<Vec<_>, _>>()?;
    Ok(Json(out))
}

/// `GET /exadata/{rack_id}`
pub async fn get_exadata(State(state): State<AppState>, Path(rack_id): Path<String>) -> AppResult<Json<OracleExadataInstance>> {
    let rack = exadata::get_exadata(&state.db, &rack_id).await?;
    Ok(Json(to_oracle_exadata_instance(&rack)?))
}

/// `POST /exadata/{rack_id}/hide`
pub async fn hide_exadata(State(state): State<AppState>, Path(rack_id): Path<String>) -> AppResult<StatusCode> {
    exadata::set_hidden(&state.db, &rack_id, true).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /exadata/{rack_id}/show`
pub async fn show_exadata(State(state): State<AppState>, Path(rack_id): Path<String>) -> AppResult<StatusCode> {
    exadata::set_hidden(&state.db, &rack_id, false).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /exadata/{rack_id}/components/{host_id}/cluster-names`
pub async fn update_component_cluster_names(
    State(state): State<AppState>,
    Path((rack_id, host_id)): Path<(String, String)>,
    payload: Result<Json<ClusterNamesRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let req = json_body(payload)?;
    exadata::update_component_cluster_names(&state.db, &rack_id, &host_id, req.cluster_names).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /exadata/{rack_id}/components/{host_id}/vms/{vm_name}/cluster-name`
pub async fn update_vm_cluster_name(
    State(state): State<AppState>,
    Path((rack_id, host_id, vm_name)): Path<(String, String, String)>,
    payload: Result<Json<ClusterNameRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let req = json_body(payload)?;
    exadata::update_vm_cluster_name(&state.db, &rack_id, &host_id, &vm_name, req.cluster_name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /exadata/{rack_id}/rdma`
pub async fn update_rdma(
    State(state): State<AppState>,
    Path(rack_id): Path<String>,
    payload: Result<Json<model::OracleExadataRdma>, JsonRejection>,
) -> AppResult<StatusCode> {
    let rdma = json_body(payload)?;
    exadata::update_rdma(&state.db, &rack_id, rdma).await?;
    Ok(StatusCode::NO_CONTENT)
}
