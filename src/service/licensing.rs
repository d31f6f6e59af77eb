use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::charts::{merge_mysql_licenses_compliance, sort_and_keep_only_last_entry_of_each_day};
use crate::compliance;
use crate::dto::{LicenseCompliance, LicenseComplianceHistory};
use crate::error::validation::{require_non_empty, require_non_negative};
use crate::error::{AppError, AppResult, OptionExt};
use crate::model::{LicenseComplianceHistoricValue, LicenseType, MySqlContract, OracleDatabaseAgreement};
use crate::service::hosts;
use crate::utils::{truncate_to_day, GlobalFilter};

const LICENSE_TYPES: &str = "license_types";
const AGREEMENTS: &str = "oracle_database_agreements";
const MYSQL_CONTRACTS: &str = "mysql_contracts";

async fn list_documents<T: DeserializeOwned>(pool: &SqlitePool, table: &str) -> AppResult<Vec<T>> {
    let rows = sqlx::query(&format!("SELECT data FROM {} ORDER BY id", table)).fetch_all(pool).await?;
    rows.iter()
        .map(|row| -> AppResult<T> {
            let data: String = row.try_get("data")?;
            Ok(serde_json::from_str(&data)?)
        })
        .collect()
}

async fn get_document<T: DeserializeOwned>(pool: &SqlitePool, table: &str, id: &str) -> AppResult<T> {
    let row = sqlx::query(&format!("SELECT data FROM {} WHERE id = ?1", table))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_not_found(id)?;
    let data: String = row.try_get("data")?;
    Ok(serde_json::from_str(&data)?)
}

async fn delete_document(pool: &SqlitePool, table: &str, id: &str) -> AppResult<()> {
    let res = sqlx::query(&format!("DELETE FROM {} WHERE id = ?1", table)).bind(id).execute(pool).await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("{} not found", id)));
    }
    Ok(())
}

async fn update_document<T: Serialize>(pool: &SqlitePool, table: &str, id: &str, doc: &T) -> AppResult<()> {
    let res = sqlx::query(&format!("UPDATE {} SET data = ?1 WHERE id = ?2", table))
        .bind(serde_json::to_string(doc)?)
        .bind(id)
        .execute(pool)
        .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("{} not found", id)));
    }
    Ok(())
}

// License types

pub async fn list_license_types(pool: &SqlitePool) -> AppResult<Vec<LicenseType>> {
    list_documents(pool, LICENSE_TYPES).await
}

pub async fn get_license_type(pool: &SqlitePool, id: &str) -> AppResult<LicenseType> {
    get_document(pool, LICENSE_TYPES, id).await
}

fn validate_license_type(t: &LicenseType) -> AppResult<()> {
    require_non_empty(&t.id, "id")?;
    require_non_empty(&t.item_description, "itemDescription")?;
    require_non_negative(t.cost, "cost")
}

/// Adds a license type; ids are chosen by the caller and must be unique.
pub async fn add_license_type(pool: &SqlitePool, t: LicenseType) -> AppResult<LicenseType> {
    validate_license_type(&t)?;
    sqlx::query("INSERT INTO license_types (id, data) VALUES (?1, ?2)")
        .bind(&t.id)
        .bind(serde_json::to_string(&t)?)
        .execute(pool)
        .await?;
    Ok(t)
}

pub async fn update_license_type(pool: &SqlitePool, id: &str, mut t: LicenseType) -> AppResult<LicenseType> {
    t.id = id.to_string();
    validate_license_type(&t)?;
    update_document(pool, LICENSE_TYPES, id, &t).await?;
    Ok(t)
}

pub async fn delete_license_type(pool: &SqlitePool, id: &str) -> AppResult<()> {
    delete_document(pool, LICENSE_TYPES, id).await
}

// Oracle database agreements

pub async fn list_agreements(pool: &SqlitePool) -> AppResult<Vec<OracleDatabaseAgreement>> {
    list_documents(pool, AGREEMENTS).await
}

async fn check_agreement(pool: &SqlitePool, a: &OracleDatabaseAgreement) -> AppResult<()> {
    a.validate()?;
    match get_license_type(pool, &a.license_type_id).await {
        Ok(_) => Ok(()),
        Err(AppError::NotFound(_)) => Err(AppError::ValidationError {
            field: "licenseTypeID".into(),
            message: format!("unknown license type {}", a.license_type_id),
        }),
        Err(e) => Err(e),
    }
}

pub async fn add_agreement(pool: &SqlitePool, mut a: OracleDatabaseAgreement) -> AppResult<OracleDatabaseAgreement> {
    check_agreement(pool, &a).await?;
    a.id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO oracle_database_agreements (id, license_type_id, data) VALUES (?1, ?2, ?3)")
        .bind(&a.id)
        .bind(&a.license_type_id)
        .bind(serde_json::to_string(&a)?)
        .execute(pool)
        .await?;
    Ok(a)
}

pub async fn update_agreement(pool: &SqlitePool, id: &str, mut a: OracleDatabaseAgreement) -> AppResult<OracleDatabaseAgreement> {
    a.id = id.to_string();
    check_agreement(pool, &a).await?;
    let res = sqlx::query("UPDATE oracle_database_agreements SET license_type_id = ?1, data = ?2 WHERE id = ?3")
        .bind(&a.license_type_id)
        .bind(serde_json::to_string(&a)?)
        .bind(id)
        .execute(pool)
        .await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("{} not found", id)));
    }
    Ok(a)
}

pub async fn delete_agreement(pool: &SqlitePool, id: &str) -> AppResult<()> {
    delete_document(pool, AGREEMENTS, id).await
}

// MySQL contracts

pub async fn list_mysql_contracts(pool: &SqlitePool) -> AppResult<Vec<MySqlContract>> {
    list_documents(pool, MYSQL_CONTRACTS).await
}

pub async fn add_mysql_contract(pool: &SqlitePool, mut c: MySqlContract) -> AppResult<MySqlContract> {
    c.validate()?;
    c.id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO mysql_contracts (id, data) VALUES (?1, ?2)")
        .bind(&c.id)
        .bind(serde_json::to_string(&c)?)
        .execute(pool)
        .await?;
    Ok(c)
}

pub async fn update_mysql_contract(pool: &SqlitePool, id: &str, mut c: MySqlContract) -> AppResult<MySqlContract> {
    c.id = id.to_string();
    c.validate()?;
    update_document(pool, MYSQL_CONTRACTS, id, &c).await?;
    Ok(c)
}

pub async fn delete_mysql_contract(pool: &SqlitePool, id: &str) -> AppResult<()> {
    delete_document(pool, MYSQL_CONTRACTS, id).await
}

// Compliance

/// Compliance of every license over the current host snapshots.
pub async fn database_licenses_compliance(pool: &SqlitePool) -> AppResult<Vec<LicenseCompliance>> {
    let hosts = hosts::list_hosts(pool, &GlobalFilter::default()).await?;
    let types = list_license_types(pool).await?;
    let agreements = list_agreements(pool).await?;
    let contracts = list_mysql_contracts(pool).await?;
    Ok(compliance::database_licenses_compliance(&hosts, &types, &agreements, &contracts))
}

/// Records today's values of `licenses`; a second call on the same day
/// overwrites the first.
pub async fn historicize(pool: &SqlitePool, licenses: &[LicenseCompliance], now: DateTime<Utc>) -> AppResult<usize> {
    let day = truncate_to_day(now).timestamp_millis();
    let mut tx = pool.begin().await?;
    for license in licenses {
        sqlx::query(
            r#"INSERT INTO licenses_history
                 (license_type_id, item_description, metric, date, consumed, covered, purchased)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
               ON CONFLICT(license_type_id, item_description, date) DO UPDATE SET
                 metric = excluded.metric,
                 consumed = excluded.consumed,
                 covered = excluded.covered,
                 purchased = excluded.purchased"#,
        )
        .bind(&license.license_type_id)
        .bind(&license.item_description)
        .bind(&license.metric)
        .bind(day)
        .bind(license.consumed)
        .bind(license.covered)
        .bind(license.purchased)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(licenses.len())
}

/// Computes the current compliance and stores it in the history.
pub async fn historicize_current_compliance(pool: &SqlitePool) -> AppResult<usize> {
    let licenses = database_licenses_compliance(pool).await?;
    historicize(pool, &licenses, Utc::now()).await
}

/// Stored compliance history, one entry per day, with the descriptions of the
/// license catalog and every MySQL Enterprise series merged into one.
pub async fn license_compliance_history(pool: &SqlitePool) -> AppResult<Vec<LicenseComplianceHistory>> {
    let rows = sqlx::query(
        r#"SELECT license_type_id, item_description, metric, date, consumed, covered, purchased
           FROM licenses_history ORDER BY license_type_id, item_description, date"#,
    )
    .fetch_all(pool)
    .await?;

    let mut grouped: BTreeMap<(String, String), LicenseComplianceHistory> = BTreeMap::new();
    for row in &rows {
        let license_type_id: String = row.try_get("license_type_id")?;
        let item_description: String = row.try_get("item_description")?;
        let millis: i64 = row.try_get("date")?;
        let date = DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("invalid history date {}", millis)))?;
        let value = LicenseComplianceHistoricValue {
            date,
            consumed: row.try_get("consumed")?,
            covered: row.try_get("covered")?,
            purchased: row.try_get("purchased")?,
        };

        let metric: String = row.try_get("metric")?;
        grouped
            .entry((license_type_id.clone(), item_description.clone()))
            .or_insert_with(|| LicenseComplianceHistory { license_type_id, item_description, metric, history: Vec::new() })
            .history
            .push(value);
    }

    let types = list_license_types(pool).await?;
    let types: HashMap<&str, &LicenseType> = types.iter().map(|t| (t.id.as_str(), t)).collect();

    let licenses = grouped
        .into_values()
        .map(|mut license| {
            if let Some(t) = types.get(license.license_type_id.as_str()) {
                license.item_description = t.item_description.clone();
                license.metric = t.metric.clone();
            }
            license.history = sort_and_keep_only_last_entry_of_each_day(license.history);
            license
        })
        .collect();

    Ok(merge_mysql_licenses_compliance(licenses))
}
