//! HTTP route handlers for the ercole API.
//!
//! - `health`: liveness, readiness, metrics and version
//! - `user`: login and identity
//! - `hosts`: agent host data upload, host listing and dismissal
//! - `exadata`: agent rack upload and rack management
//! - `licensing`: license catalog, agreements, MySQL contracts and compliance
//! - `alerts`: alert listing and acknowledgement
//! - `charts`: chart data computed from the stored inventory

pub mod alerts;
pub mod charts;
pub mod exadata;
pub mod health;
pub mod hosts;
pub mod licensing;
pub mod user;

use axum::{
    extract::rejection::JsonRejection,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Json, Router,
};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_agent, require_user};
use crate::state::AppState;

/// Unwraps a JSON body, reporting malformed payloads as 400.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload.map(|Json(v)| v).map_err(|e| AppError::BadRequest(e.body_text()))
}

/// Builds the full API router. Transport layers (tracing, compression,
/// CORS, body limit) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/metrics", get(health::metrics))
        .route("/metrics/prometheus", get(health::metrics_prometheus))
        .route("/version", get(health::version))
        .route("/user/login", post(user::login));

    let agent = Router::new()
        .route("/data/hosts", post(hosts::insert_host_data))
        .route("/data/exadata", post(exadata::save_exadata))
        .route_layer(from_fn_with_state(state.clone(), require_agent));

    let api = Router::new()
        .route("/user/me", get(user::me))
        .route("/hosts", get(hosts::list_hosts))
        .route("/hosts/{hostname}", get(hosts::get_host).delete(hosts::dismiss_host))
        .route("/exadata", get(exadata::list_exadata))
        .route("/exadata/{rack_id}", get(exadata::get_exadata))
        .route("/exadata/{rack_id}/hide", post(exadata::hide_exadata))
        .route("/exadata/{rack_id}/show", post(exadata::show_exadata))
        .route("/exadata/{rack_id}/rdma", put(exadata::update_rdma))
        .route(
            "/exadata/{rack_id}/components/{host_id}/cluster-names",
            put(exadata::update_component_cluster_names),
        )
        .route(
            "/exadata/{rack_id}/components/{host_id}/vms/{vm_name}/cluster-name",
            put(exadata::update_vm_cluster_name),
        )
        .route("/licenses/types", get(licensing::list_license_types).post(licensing::add_license_type))
        .route(
            "/licenses/types/{id}",
            get(licensing::get_license_type).put(licensing::update_license_type).delete(licensing::delete_license_type),
        )
        .route("/licenses/agreements/oracle/database", get(licensing::list_agreements).post(licensing::add_agreement))
        .route(
            "/licenses/agreements/oracle/database/{id}",
            put(licensing::update_agreement).delete(licensing::delete_agreement),
        )
        .route("/licenses/contracts/mysql", get(licensing::list_mysql_contracts).post(licensing::add_mysql_contract))
        .route("/licenses/contracts/mysql/{id}", put(licensing::update_mysql_contract).delete(licensing::delete_mysql_contract))
        .route("/licenses/compliance", get(licensing::licenses_compliance))
        .route("/licenses/compliance/historicize", post(licensing::historicize))
        .route("/alerts", get(alerts::list_alerts))
        .route("/alerts/ack", post(alerts::acknowledge_alerts))
        .route("/alerts/{id}/ack", post(alerts::acknowledge_alert))
        .route("/charts/technologies/types", get(charts::technology_types))
        .route("/charts/technologies/changes", get(charts::technology_changes))
        .route("/charts/oracle/database/{metric}", get(charts::oracle_database))
        .route("/charts/hosts/cores", get(charts::host_cores))
        .route("/charts/licenses/compliance/history", get(charts::license_compliance_history))
        .route_layer(from_fn_with_state(state.clone(), require_user));

    Router::new().merge(public).merge(agent).merge(api).with_state(state)
}
