use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};

use crate::error::{AppError, AppResult};
use crate::model::{
    Alert, AlertCategory, AlertCode, AlertSeverity, AlertStatus, HostData, LicenseType, OracleDatabase,
    TECHNOLOGY_ORACLE_DATABASE,
};
use crate::utils::{max_time, min_time};

const DB_NAMES: &str = "dbNames";

/// Selection for [`list_alerts`], every field narrows the result.
#[derive(Debug, Clone)]
pub struct AlertFilter {
    pub status: Option<AlertStatus>,
    pub severity: Option<AlertSeverity>,
    pub code: Option<AlertCode>,
    pub hostname: Option<String>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl Default for AlertFilter {
    fn default() -> Self {
        Self { status: None, severity: None, code: None, hostname: None, from: min_time(), to: max_time() }
    }
}

fn decode(row: &SqliteRow) -> AppResult<Alert> {
    let data: String = row.try_get("data")?;
    let mut alert: Alert = serde_json::from_str(&data)?;
    alert.alert_status = match row.try_get::<String, _>("alert_status")?.as_str() {
        "ACK" => AlertStatus::Ack,
        _ => AlertStatus::New,
    };
    Ok(alert)
}

fn licensed_databases(host: &HostData) -> HashMap<&str, &OracleDatabase> {
    host.oracle_databases().iter().map(|db| (db.name.as_str(), db)).collect()
}

fn enabled_license_types(db: &OracleDatabase) -> Vec<&str> {
    let mut ids: Vec<&str> = Vec::new();
    for license in db.licenses.iter().filter(|l| l.count > 0.0 && !l.license_type_id.is_empty()) {
        if !ids.contains(&license.license_type_id.as_str()) {
            ids.push(license.license_type_id.as_str());
        }
    }
    ids
}

/// NEW_DATABASE, NEW_LICENSE and NEW_OPTION alerts for the databases of
/// `host` compared with the `previous` snapshot. Options are reported in a
/// single alert.
fn license_alerts(previous: Option<&HostData>, host: &HostData, license_types: &[LicenseType], now: DateTime<Utc>) -> Vec<Alert> {
    let types: HashMap<&str, &LicenseType> = license_types.iter().map(|t| (t.id.as_str(), t)).collect();
    let previous_dbs = previous.map(licensed_databases).unwrap_or_default();
    let enabled_before: HashSet<&str> = previous_dbs.values().flat_map(|db| enabled_license_types(*db)).collect();

    let mut alerts = Vec::new();
    let mut options: Vec<(AlertSeverity, String, &str, &str)> = Vec::new();

    for db in host.oracle_databases() {
        let old_enabled = match previous_dbs.get(db.name.as_str()) {
            Some(old) => enabled_license_types(*old),
            None => {
                alerts.push(
                    Alert::new(
                        AlertCategory::License,
                        AlertCode::NewDatabase,
                        AlertSeverity::Info,
                        &host.hostname,
                        format!("The database {} was created on the host {}", db.name, host.hostname),
                        now,
                    )
                    .with_technology(TECHNOLOGY_ORACLE_DATABASE)
                    .with_info("dbname", db.name.as_str()),
                );
                Vec::new()
            }
        };

        for id in enabled_license_types(db).into_iter().filter(|id| !old_enabled.contains(id)) {
            let Some(license_type) = types.get(id) else {
                tracing::warn!(license_type_id = %id, hostname = %host.hostname, "Enabled license type is not in the catalog");
                continue;
            };
            let (severity, suffix) = if enabled_before.contains(id) {
                (AlertSeverity::Info, " (already enabled before in this host)")
            } else {
                (AlertSeverity::Critical, "")
            };

            if license_type.option {
                let description = format!("Database {} has enabled new option: {}{}", db.name, license_type.item_description, suffix);
                options.push((severity, description, db.name.as_str(), id));
            } else {
                alerts.push(
                    Alert::new(
                        AlertCategory::License,
                        AlertCode::NewLicense,
                        severity,
                        &host.hostname,
                        format!(
                            "The database {} on {} has enabled new license: {}{}",
                            db.name, host.hostname, license_type.item_description, suffix
                        ),
                        now,
                    )
                    .with_technology(TECHNOLOGY_ORACLE_DATABASE)
                    .with_info("dbname", db.name.as_str())
                    .with_info("licenseTypeID", id),
                );
            }
        }
    }

    if !options.is_empty() {
        let severity = options.iter().map(|o| o.0).max().unwrap_or(AlertSeverity::Info);
        let description = options.iter().map(|o| o.1.as_str()).collect::<Vec<_>>().join("\n");
        let db_names = options.iter().map(|o| o.2).collect::<Vec<_>>().join(",");
        let ids = options.iter().map(|o| o.3).collect::<Vec<_>>().join(",");
        alerts.push(
            Alert::new(AlertCategory::License, AlertCode::NewOption, severity, &host.hostname, description, now)
                .with_technology(TECHNOLOGY_ORACLE_DATABASE)
                .with_info("dbname", db_names)
                .with_info("licenseTypeID", ids),
        );
    }

    alerts
}

/// Databases of `previous` no longer reported. Critical when none survived.
fn missing_databases_alert(previous: &HostData, host: &HostData, now: DateTime<Utc>) -> Option<Alert> {
    let current = licensed_databases(host);
    let mut missing: Vec<&str> = Vec::new();
    let mut severity = AlertSeverity::Critical;
    for db in previous.oracle_databases() {
        if current.contains_key(db.name.as_str()) {
            severity = AlertSeverity::Warning;
        } else {
            missing.push(db.name.as_str());
        }
    }
    if missing.is_empty() {
        return None;
    }
    missing.sort_unstable();

    Some(
        Alert::new(
            AlertCategory::License,
            AlertCode::MissingDatabase,
            severity,
            &host.hostname,
            format!(
                "The databases {:?} on {:?} are missing compared to the previous hostdata",
                missing.join(", "),
                host.hostname
            ),
            now,
        )
        .with_technology(TECHNOLOGY_ORACLE_DATABASE)
        .with_info(DB_NAMES, missing),
    )
}

fn agent_errors_alert(host: &HostData, now: DateTime<Utc>) -> Option<Alert> {
    if host.errors.is_empty() {
        return None;
    }
    let prefix = if host.errors.len() > 1 { "- " } else { "" };
    let description: String = host.errors.iter().map(|e| format!("{}{}\n", prefix, e.message)).collect();
    let errors = serde_json::to_value(&host.errors).unwrap_or(Value::Null);

    Some(
        Alert::new(AlertCategory::Engine, AlertCode::AgentError, AlertSeverity::Critical, &host.hostname, description, now)
            .with_info("errors", errors),
    )
}

/// Alerts raised by a new snapshot of a host, given the current snapshot it
/// replaces (`None` for a host seen for the first time).
pub fn host_data_alerts(previous: Option<&HostData>, host: &HostData, license_types: &[LicenseType], now: DateTime<Utc>) -> Vec<Alert> {
    let mut alerts = Vec::new();
    if previous.is_none() {
        alerts.push(Alert::new(
            AlertCategory::Engine,
            AlertCode::NewServer,
            AlertSeverity::Info,
            &host.hostname,
            format!("The host {} was added to ercole", host.hostname),
            now,
        ));
    }
    alerts.extend(license_alerts(previous, host, license_types, now));
    if let Some(alert) = previous.and_then(|p| missing_databases_alert(p, host, now)) {
        alerts.push(alert);
    }
    alerts.extend(agent_errors_alert(host, now));
    alerts
}

pub async fn insert_alerts(conn: &mut SqliteConnection, alerts: &[Alert]) -> AppResult<()> {
    for alert in alerts {
        sqlx::query(
            r#"INSERT INTO alerts (id, alert_code, alert_severity, alert_status, hostname, date, data)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
        )
        .bind(&alert.id)
        .bind(alert.alert_code.as_str())
        .bind(alert.alert_severity.as_str())
        .bind(alert.alert_status.as_str())
        .bind(alert.hostname())
        .bind(alert.date.timestamp_millis())
        .bind(serde_json::to_string(alert)?)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Acknowledges the open alerts of `host` that its new snapshot resolves:
/// NO_DATA, and MISSING_DATABASE alerts whose databases are all back.
pub async fn acknowledge_resolved(conn: &mut SqliteConnection, host: &HostData) -> AppResult<u64> {
    let mut acknowledged = sqlx::query("UPDATE alerts SET alert_status = 'ACK' WHERE hostname = ?1 AND alert_code = ?2 AND alert_status = 'NEW'")
        .bind(&host.hostname)
        .bind(AlertCode::NoData.as_str())
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let open = sqlx::query("SELECT data, alert_status FROM alerts WHERE hostname = ?1 AND alert_code = ?2 AND alert_status = 'NEW'")
        .bind(&host.hostname)
        .bind(AlertCode::MissingDatabase.as_str())
        .fetch_all(&mut *conn)
        .await?
        .iter()
        .map(decode)
        .collect::<AppResult<Vec<_>>>()?;

    let current = licensed_databases(host);
    for alert in open {
        let names = alert.other_info.get(DB_NAMES).and_then(Value::as_array).cloned().unwrap_or_default();
        let recovered = names.iter().all(|n| n.as_str().is_some_and(|n| current.contains_key(n)));
        if recovered {
            acknowledged += sqlx::query("UPDATE alerts SET alert_status = 'ACK' WHERE id = ?1")
                .bind(&alert.id)
                .execute(&mut *conn)
                .await?
                .rows_affected();
        }
    }
    Ok(acknowledged)
}

/// Alerts selected by `filter`, newest first.
pub async fn list_alerts(pool: &SqlitePool, filter: &AlertFilter) -> AppResult<Vec<Alert>> {
    sqlx::query(
        r#"SELECT data, alert_status FROM alerts
           WHERE (?1 IS NULL OR alert_status = ?1)
             AND (?2 IS NULL OR alert_severity = ?2)
             AND (?3 IS NULL OR alert_code = ?3)
             AND (?4 IS NULL OR hostname = ?4)
             AND date >= ?5 AND date <= ?6
           ORDER BY date DESC, rowid DESC"#,
    )
    .bind(filter.status.map(|s| s.as_str()))
    .bind(filter.severity.map(|s| s.as_str()))
    .bind(filter.code.map(|c| c.as_str()))
    .bind(filter.hostname.as_deref())
    .bind(filter.from.timestamp_millis())
    .bind(filter.to.timestamp_millis())
    .fetch_all(pool)
    .await?
    .iter()
    .map(decode)
    .collect()
}

/// Marks the given alerts as acknowledged. Returns how many exist.
pub async fn acknowledge_alerts(pool: &SqlitePool, ids: &[String]) -> AppResult<u64> {
    if ids.is_empty() {
        return Err(AppError::ValidationError { field: "ids".into(), message: "ids cannot be empty".into() });
    }
    let mut tx = pool.begin().await?;
    let mut found = 0;
    for id in ids {
        found += sqlx::query("UPDATE alerts SET alert_status = 'ACK' WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }
    tx.commit().await?;
    Ok(found)
}

pub async fn acknowledge_alert(pool: &SqlitePool, id: &str) -> AppResult<()> {
    match acknowledge_alerts(pool, &[id.to_string()]).await? {
        0 => Err(AppError::NotFound(format!("alert {} not found", id))),
        _ => Ok(()),
    }
}

/// Replaces the open NO_DATA alerts with one per current host whose last
/// snapshot is older than `days`. Hosts whose staleness was already
/// acknowledged are skipped.
pub async fn check_freshness(pool: &SqlitePool, days: i64, now: DateTime<Utc>) -> AppResult<Vec<Alert>> {
    let threshold = chrono::Duration::try_days(days)
        .and_then(|age| now.checked_sub_signed(age))
        .ok_or_else(|| AppError::InvalidInput(format!("freshness threshold of {} days is out of range", days)))?;

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM alerts WHERE alert_code = ?1 AND alert_status = 'NEW'")
        .bind(AlertCode::NoData.as_str())
        .execute(&mut *tx)
        .await?;

    let stale = sqlx::query(
        r#"SELECT h.hostname, h.created_at FROM hosts h
           WHERE h.archived = 0 AND h.created_at < ?1
             AND NOT EXISTS (
               SELECT 1 FROM alerts a
               WHERE a.hostname = h.hostname AND a.alert_code = ?2 AND a.alert_status = 'ACK' AND a.date > h.created_at
             )
           ORDER BY h.hostname"#,
    )
    .bind(threshold.timestamp_millis())
    .bind(AlertCode::NoData.as_str())
    .fetch_all(&mut *tx)
    .await?;

    let mut alerts = Vec::with_capacity(stale.len());
    for row in &stale {
        let hostname: String = row.try_get("hostname")?;
        let created_at = DateTime::<Utc>::from_timestamp_millis(row.try_get("created_at")?).unwrap_or(now);
        let elapsed = (now - created_at).num_days();
        alerts.push(Alert::new(
            AlertCategory::Agent,
            AlertCode::NoData,
            AlertSeverity::Critical,
            &hostname,
            format!("No data received from the host {} in the last {} day(s)", hostname, elapsed),
            now,
        ));
    }
    insert_alerts(&mut tx, &alerts).await?;
    tx.commit().await?;
    Ok(alerts)
}
