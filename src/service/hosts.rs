use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::error::{AppError, AppResult, OptionExt};
use crate::model::{Alert, HostData, SERVER_SCHEMA_VERSION};
use crate::service::{alerts, licensing};
use crate::utils::GlobalFilter;

pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

fn decode(row: &SqliteRow) -> AppResult<HostData> {
    let data: String = row.try_get("data")?;
    let mut host: HostData = serde_json::from_str(&data)?;
    host.archived = row.try_get::<i64, _>("archived")? != 0;
    Ok(host)
}

fn millis(t: DateTime<Utc>) -> i64 {
    t.timestamp_millis()
}

/// Outcome of [`insert_host_data`].
#[derive(Debug)]
pub struct InsertedHostData {
    pub id: String,
    /// Alerts raised by the comparison with the replaced snapshot.
    pub alerts: Vec<Alert>,
}

/// Stores a new snapshot and archives the previous current one of the same
/// hostname, raising the alerts the change calls for.
pub async fn insert_host_data(pool: &SqlitePool, mut host: HostData) -> AppResult<InsertedHostData> {
    host.validate()?;
    let license_types = licensing::list_license_types(pool).await?;
    host.resolve_license_type_ids(&license_types);

    let now = Utc::now();
    host.id = Uuid::new_v4().to_string();
    host.archived = false;
    host.created_at = Some(now);
    host.server_version = SERVER_VERSION.to_string();
    host.server_schema_version = SERVER_SCHEMA_VERSION;

    let data = serde_json::to_string(&host)?;
    let mut tx = pool.begin().await?;
    let replaced = sqlx::query("UPDATE hosts SET archived = 1 WHERE hostname = ?1 AND archived = 0 RETURNING data")
        .bind(&host.hostname)
        .fetch_all(&mut *tx)
        .await?;
    let previous = match replaced.first() {
        Some(row) => Some(serde_json::from_str::<HostData>(&row.try_get::<String, _>("data")?)?),
        None => None,
    };
    sqlx::query(
        r#"INSERT INTO hosts (id, hostname, location, environment, archived, created_at, data)
           VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)"#,
    )
    .bind(&host.id)
    .bind(&host.hostname)
    .bind(&host.location)
    .bind(&host.environment)
    .bind(millis(now))
    .bind(data)
    .execute(&mut *tx)
    .await?;

    let raised = alerts::host_data_alerts(previous.as_ref(), &host, &license_types, now);
    let acknowledged = alerts::acknowledge_resolved(&mut tx, &host).await?;
    alerts::insert_alerts(&mut tx, &raised).await?;
    tx.commit().await?;

    tracing::debug!(
        "Stored host data {} of {} ({} archived, {} alerts raised, {} acknowledged)",
        host.id,
        host.hostname,
        replaced.len(),
        raised.len(),
        acknowledged
    );
    Ok(InsertedHostData { id: host.id, alerts: raised })
}

/// For each hostname the newest snapshot created at or before `older_than`.
pub fn latest_snapshots(snapshots: Vec<HostData>, older_than: DateTime<Utc>) -> Vec<HostData> {
    let mut latest: BTreeMap<String, HostData> = BTreeMap::new();
    for host in snapshots {
        let Some(created_at) = host.created_at else { continue };
        if created_at > older_than {
            continue;
        }
        match latest.get(&host.hostname) {
            Some(current) if current.created_at >= host.created_at => {}
            _ => {
                latest.insert(host.hostname.clone(), host);
            }
        }
    }
    latest.into_values().collect()
}

/// Host snapshots selected by `filter`, ordered by hostname. The current
/// snapshots are returned when `filter.older_than` is the max time.
pub async fn list_hosts(pool: &SqlitePool, filter: &GlobalFilter) -> AppResult<Vec<HostData>> {
    let hosts = if filter.is_current() {
        sqlx::query("SELECT data, archived FROM hosts WHERE archived = 0 ORDER BY hostname")
            .fetch_all(pool)
            .await?
            .iter()
            .map(decode)
            .collect::<AppResult<Vec<_>>>()?
    } else {
        let rows = sqlx::query("SELECT data, archived FROM hosts WHERE created_at <= ?1")
            .bind(millis(filter.older_than))
            .fetch_all(pool)
            .await?;
        let snapshots = rows.iter().map(decode).collect::<AppResult<Vec<_>>>()?;
        latest_snapshots(snapshots, filter.older_than)
    };

    Ok(hosts.into_iter().filter(|h| filter.matches(&h.location, &h.environment)).collect())
}

pub async fn get_host(pool: &SqlitePool, hostname: &str, older_than: DateTime<Utc>) -> AppResult<HostData> {
    let filter = GlobalFilter { older_than, ..Default::default() };
    list_hosts(pool, &filter)
        .await?
        .into_iter()
        .find(|h| h.hostname == hostname)
        .ok_or_not_found(&format!("host {}", hostname))
}

/// Snapshots, archived ones included, created between `newer_than` and
/// `older_than` (both inclusive), oldest first.
pub async fn snapshots_between(pool: &SqlitePool, newer_than: DateTime<Utc>, older_than: DateTime<Utc>) -> AppResult<Vec<HostData>> {
    sqlx::query("SELECT data, archived FROM hosts WHERE created_at >= ?1 AND created_at <= ?2 ORDER BY created_at, rowid")
        .bind(millis(newer_than))
        .bind(millis(older_than))
        .fetch_all(pool)
        .await?
        .iter()
        .map(decode)
        .collect()
}

/// Archives the current snapshot of `hostname`.
pub async fn archive_host(pool: &SqlitePool, hostname: &str) -> AppResult<()> {
    let res = sqlx::query("UPDATE hosts SET archived = 1 WHERE hostname = ?1 AND archived = 0")
        .bind(hostname)
        .execute(pool)
        .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("host {} not found", hostname)));
    }
    Ok(())
}

/// Deletes archived snapshots created before `threshold`.
pub async fn delete_archived_hosts(pool: &SqlitePool, threshold: DateTime<Utc>) -> AppResult<u64> {
    let res = sqlx::query("DELETE FROM hosts WHERE archived = 1 AND created_at < ?1")
        .bind(millis(threshold))
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
