use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    charts,
    dto::{ChangeChart, Chart, HostCores, LicenseComplianceHistory, TechnologyTypesChart},
    error::AppResult,
    service::{hosts, licensing},
    state::AppState,
    utils::{filter::parse_time_param, max_time, FilterQuery, GlobalFilter},
};

#[derive(Debug, Default, Deserialize)]
pub struct ChangeChartQuery {
    pub location: Option<String>,
    pub environment: Option<String>,
    #[serde(rename = "older-than")]
    pub older_than: Option<String>,
    /// Reference time the current counts are compared with.
    pub from: Option<String>,
}

/// `GET /charts/technologies/types`
pub async fn technology_types(
    State(state): State<AppState>,
    Query(q): Query<FilterQuery>,
) -> AppResult<Json<TechnologyTypesChart>> {
    let filter = q.global_filter()?;
    let selected = hosts::list_hosts(&state.db, &filter).await?;
    let counts = charts::technology_count(&selected, &state.os_classifier);
    Ok(Json(charts::technology_types_chart(&counts, &state.os_classifier)))
}

/// `GET /charts/technologies/changes?from=...`: growth of every technology
/// between `from` and `older-than`.
pub async fn technology_changes(
    State(state): State<AppState>,
    Query(q): Query<ChangeChartQuery>,
) -> AppResult<Json<ChangeChart>> {
    let filter = FilterQuery {
        location: q.location,
        environment: q.environment,
        older_than: q.older_than,
        newer_than: None,
    }
    .global_filter()?;
    let from = parse_time_param(q.from.as_deref(), "from", max_time())?;
    let old_filter = GlobalFilter { older_than: from, ..filter.clone() };

    let new_hosts = hosts::list_hosts(&state.db, &filter).await?;
    let old_hosts = hosts::list_hosts(&state.db, &old_filter).await?;
    let new_counts = charts::technology_count(&new_hosts, &state.os_classifier);
    let old_counts = charts::technology_count(&old_hosts, &state.os_classifier);
    Ok(Json(charts::change_chart(&old_counts, &new_counts)))
}

/// `GET /charts/oracle/database/{metric}`
pub async fn oracle_database(
    State(state): State<AppState>,
    Path(metric): Path<String>,
    Query(q): Query<FilterQuery>,
) -> AppResult<Json<Chart>> {
    let filter = q.global_filter()?;
    let selected = hosts::list_hosts(&state.db, &filter).await?;
    Ok(Json(charts::oracle_database_chart(&metric, &selected)?))
}

/// `GET /charts/hosts/cores`
pub async fn host_cores(State(state): State<AppState>, Query(q): Query<FilterQuery>) -> AppResult<Json<Vec<HostCores>>> {
    let filter = q.global_filter()?;
    let newer_than = q.newer_than()?;
    let snapshots = hosts::snapshots_between(&state.db, newer_than, filter.older_than).await?;
    Ok(Json(charts::host_cores(&snapshots, &filter, newer_than)))
}

/// `GET /charts/licenses/compliance/history`
pub async fn license_compliance_history(State(state): State<AppState>) -> AppResult<Json<Vec<LicenseComplianceHistory>>> {
    Ok(Json(licensing::license_compliance_history(&state.db).await?))
}
