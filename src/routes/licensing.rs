use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    dto::LicenseCompliance,
    error::AppResult,
    model::{LicenseType, MySqlContract, OracleDatabaseAgreement},
    service::licensing,
    state::AppState,
};

use super::json_body;

// License types

pub async fn list_license_types(State(state): State<AppState>) -> AppResult<Json<Vec<LicenseType>>> {
    Ok(Json(licensing::list_license_types(&state.db).await?))
}

pub async fn get_license_type(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<LicenseType>> {
    Ok(Json(licensing::get_license_type(&state.db, &id).await?))
}

pub async fn add_license_type(
    State(state): State<AppState>,
    payload: Result<Json<LicenseType>, JsonRejection>,
) -> AppResult<(StatusCode, Json<LicenseType>)> {
    let t = licensing::add_license_type(&state.db, json_body(payload)?).await?;
    tracing::info!(id = %t.id, "License type added");
    Ok((StatusCode::CREATED, Json(t)))
}

pub async fn update_license_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<LicenseType>, JsonRejection>,
) -> AppResult<Json<LicenseType>> {
    Ok(Json(licensing::update_license_type(&state.db, &id, json_body(payload)?).await?))
}

pub async fn delete_license_type(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<StatusCode> {
    licensing::delete_license_type(&state.db, &id).await?;
    tracing::info!(%id, "License type deleted");
    Ok(StatusCode::NO_CONTENT)
}

// Oracle database agreements

pub async fn list_agreements(State(state): State<AppState>) -> AppResult<Json<Vec<OracleDatabaseAgreement>>> {
    Ok(Json(licensing::list_agreements(&state.db).await?))
}

pub async fn add_agreement(
    State(state): State<AppState>,
    payload: Result<Json<OracleDatabaseAgreement>, JsonRejection>,
) -> AppResult<(StatusCode, Json<OracleDatabaseAgreement>)> {
    let a = licensing::add_agreement(&state.db, json_body(payload)?).await?;
    tracing::info!(id = %a.id, agreement_id = %a.agreement_id, "Agreement added");
    Ok((StatusCode::CREATED, Json(a)))
}

pub async fn update_agreement(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<OracleDatabaseAgreement>, JsonRejection>,
) -> AppResult<Json<OracleDatabaseAgreement>> {
    Ok(Json(licensing::update_agreement(&state.db, &id, json_body(payload)?).await?))
}

pub async fn delete_agreement(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<StatusCode> {
    licensing::delete_agreement(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// MySQL contracts

pub async fn list_mysql_contracts(State(state): State<AppState>) -> AppResult<Json<Vec<MySqlContract>>> {
    Ok(Json(licensing::list_mysql_contracts(&state.db).await?))
}

pub async fn add_mysql_contract(
    State(state): State<AppState>,
    payload: Result<Json<MySqlContract>, JsonRejection>,
) -> AppResult<(StatusCode, Json<MySqlContract>)> {
    let c = licensing::add_mysql_contract(&state.db, json_body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(c)))
}

pub async fn update_mysql_contract(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<MySqlContract>, JsonRejection>,
) -> AppResult<Json<MySqlContract>> {
    Ok(Json(licensing::update_mysql_contract(&state.db, &id, json_body(payload)?).await?))
}

pub async fn delete_mysql_contract(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<StatusCode> {
    licensing::delete_mysql_contract(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Compliance

/// `GET /licenses/compliance`
pub async fn licenses_compliance(State(state): State<AppState>) -> AppResult<Json<Vec<LicenseCompliance>>> {
    Ok(Json(licensing::database_licenses_compliance(&state.db).await?))
}

/// `POST /licenses/compliance/historicize`: stores today's values right away.
pub async fn historicize(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let stored = licensing::historicize_current_compliance(&state.db).await?;
    state.metrics.inc_historicizations();
    tracing::info!(stored, "License compliance historicized on request");
    Ok(Json(json!({ "stored": stored })))
}
