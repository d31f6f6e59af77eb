use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::error::validation::require_non_empty;
use crate::error::{AppError, AppResult, OptionExt};
use crate::model::{OracleExadataInstance, OracleExadataRdma};
use crate::utils::GlobalFilter;

fn decode(row: &SqliteRow) -> AppResult<OracleExadataInstance> {
    let data: String = row.try_get("data")?;
    let mut rack: OracleExadataInstance = serde_json::from_str(&data)?;
    rack.hidden = row.try_get::<i64, _>("hidden")? != 0;
    Ok(rack)
}

fn validate(rack: &OracleExadataInstance) -> AppResult<()> {
    require_non_empty(&rack.rack_id, "rackID")?;
    if let Some(c) = rack.components.iter().find(|c| c.hostname.trim().is_empty()) {
        return Err(AppError::ValidationError {
            field: "components.hostname".into(),
            message: format!("component {} has no hostname", c.host_id),
        });
    }
    Ok(())
}

/// Folds a freshly submitted rack into the stored one. Components are matched
/// by hostname; matched ones are replaced but keep their user assigned
/// cluster names, unmatched ones are appended.
pub fn merge_exadata(stored: &mut OracleExadataInstance, incoming: OracleExadataInstance, now: DateTime<Utc>) {
    if stored.hostname != incoming.hostname {
        tracing::info!("Exadata {} renamed from {} to {}", stored.rack_id, stored.hostname, incoming.hostname);
        stored.hostname = incoming.hostname;
    }
    stored.environment = incoming.environment;
    stored.location = incoming.location;

    for mut component in incoming.components {
        match stored.components.iter_mut().find(|c| c.hostname == component.hostname) {
            Some(existing) => {
                if component.cluster_names.is_empty() {
                    component.cluster_names = std::mem::take(&mut existing.cluster_names);
                }
                let mut vm_clusters: HashMap<String, String> = existing
                    .vms
                    .drain(..)
                    .filter(|vm| !vm.cluster_name.is_empty())
                    .map(|vm| (vm.name, vm.cluster_name))
                    .collect();
                for vm in component.vms.iter_mut().filter(|vm| vm.cluster_name.is_empty()) {
                    if let Some(name) = vm_clusters.remove(&vm.name) {
                        vm.cluster_name = name;
                    }
                }
                *existing = component;
            }
            None => stored.components.push(component),
        }
    }

    stored.updated_at = Some(now);
}

/// Opens a transaction that already holds the database write lock, so that
/// concurrent read-merge-store sequences on racks are serialized.
async fn begin_write(pool: &SqlitePool) -> AppResult<Transaction<'static, Sqlite>> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE exadatas SET hidden = hidden WHERE rack_id IS NULL").execute(&mut *tx).await?;
    Ok(tx)
}

async fn fetch(conn: &mut SqliteConnection, rack_id: &str) -> AppResult<Option<OracleExadataInstance>> {
    sqlx::query("SELECT data, hidden FROM exadatas WHERE rack_id = ?1")
        .bind(rack_id)
        .fetch_optional(conn)
        .await?
        .as_ref()
        .map(decode)
        .transpose()
}

pub async fn find_exadata(pool: &SqlitePool, rack_id: &str) -> AppResult<Option<OracleExadataInstance>> {
    let mut conn = pool.acquire().await?;
    fetch(&mut conn, rack_id).await
}

async fn store(conn: &mut SqliteConnection, rack: &OracleExadataInstance) -> AppResult<()> {
    sqlx::query(
        r#"INSERT INTO exadatas (rack_id, hostname, environment, location, hidden, data)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT(rack_id) DO UPDATE SET
             hostname = excluded.hostname,
             environment = excluded.environment,
             location = excluded.location,
             hidden = excluded.hidden,
             data = excluded.data"#,
    )
    .bind(&rack.rack_id)
    .bind(&rack.hostname)
    .bind(&rack.environment)
    .bind(&rack.location)
    .bind(rack.hidden as i64)
    .bind(serde_json::to_string(rack)?)
    .execute(conn)
    .await?;
    Ok(())
}

/// Inserts a new rack or merges it into the stored one with the same rack id.
pub async fn save_exadata(pool: &SqlitePool, mut incoming: OracleExadataInstance) -> AppResult<()> {
    validate(&incoming)?;
    let now = Utc::now();

    let mut tx = begin_write(pool).await?;
    match fetch(&mut tx, &incoming.rack_id).await? {
        Some(mut stored) => {
            merge_exadata(&mut stored, incoming, now);
            store(&mut tx, &stored).await?;
        }
        None => {
            incoming.created_at = Some(now);
            incoming.updated_at = Some(now);
            incoming.hidden = false;
            store(&mut tx, &incoming).await?;
        }
    }
    tx.commit().await?;
    Ok(())
}

pub async fn list_exadata(pool: &SqlitePool, filter: &GlobalFilter, hidden: bool) -> AppResult<Vec<OracleExadataInstance>> {
    let racks = sqlx::query("SELECT data, hidden FROM exadatas WHERE hidden = ?1 ORDER BY hostname, rack_id")
        .bind(hidden as i64)
        .fetch_all(pool)
        .await?
        .iter()
        .map(decode)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(racks
        .into_iter()
        .filter(|r| filter.matches(&r.location, &r.environment))
        .collect())
}

pub async fn get_exadata(pool: &SqlitePool, rack_id: &str) -> AppResult<OracleExadataInstance> {
    find_exadata(pool, rack_id).await?.ok_or_not_found(&format!("exadata {}", rack_id))
}

/// Loads a rack, applies `f` and stores it back.
async fn update<F>(pool: &SqlitePool, rack_id: &str, f: F) -> AppResult<()>
where
    F: FnOnce(&mut OracleExadataInstance) -> AppResult<()>,
{
    let mut tx = begin_write(pool).await?;
    let mut rack = fetch(&mut tx, rack_id).await?.ok_or_not_found(&format!("exadata {}", rack_id))?;
    f(&mut rack)?;
    store(&mut tx, &rack).await?;
    tx.commit().await?;
    Ok(())
}

pub async fn set_hidden(pool: &SqlitePool, rack_id: &str, hidden: bool) -> AppResult<()> {
    update(pool, rack_id, |rack| {
        rack.hidden = hidden;
        Ok(())
    })
    .await
}

pub async fn update_component_cluster_names(pool: &SqlitePool, rack_id: &str, host_id: &str, names: Vec<String>) -> AppResult<()> {
    update(pool, rack_id, |rack| {
        let component = rack
            .component_mut(host_id)
            .ok_or_else(|| AppError::NotFound(format!("component {} not found in exadata {}", host_id, rack_id)))?;
        component.cluster_names = names;
        Ok(())
    })
    .await
}

pub async fn update_vm_cluster_name(pool: &SqlitePool, rack_id: &str, host_id: &str, vm_name: &str, name: String) -> AppResult<()> {
    update(pool, rack_id, |rack| {
        let component = rack
            .component_mut(host_id)
            .ok_or_else(|| AppError::NotFound(format!("component {} not found in exadata {}", host_id, rack_id)))?;
        let vm = component
            .vm_mut(vm_name)
            .ok_or_else(|| AppError::NotFound(format!("vm {} not found in component {}", vm_name, host_id)))?;
        vm.cluster_name = name;
        Ok(())
    })
    .await
}

pub async fn update_rdma(pool: &SqlitePool, rack_id: &str, rdma: OracleExadataRdma) -> AppResult<()> {
    update(pool, rack_id, |rack| {
        rack.rdma = Some(rdma);
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OracleExadataComponent, OracleExadataVm, DOM0};

    fn component(hostname: &str, cpu: i64, clusters: &[&str]) -> OracleExadataComponent {
        OracleExadataComponent {
            host_type: DOM0.into(),
            hostname: hostname.into(),
            host_id: format!("id-{}", hostname),
            total_cpu: cpu,
            cluster_names: clusters.iter().map(|c| c.to_string()).collect(),
            vms: vec![OracleExadataVm { name: "vm1".into(), cluster_name: String::new(), ..Default::default() }],
            ..Default::default()
        }
    }

    #[test]
    fn merge_keeps_cluster_names_and_appends_new_components() {
        let mut stored = OracleExadataInstance {
            rack_id: "rack".into(),
            hostname: "exa01".into(),
            components: vec![component("db01", 48, &["cl1"])],
            ..Default::default()
        };
        stored.components[0].vms[0].cluster_name = "vmcl".into();

        let incoming = OracleExadataInstance {
            rack_id: "rack".into(),
            hostname: "exa01-new".into(),
            components: vec![component("db01", 96, &[]), component("db02", 48, &[])],
            ..Default::default()
        };
        let now = Utc::now();
        merge_exadata(&mut stored, incoming, now);

        assert_eq!(stored.hostname, "exa01-new");
        assert_eq!(stored.components.len(), 2);
        assert_eq!(stored.components[0].total_cpu, 96);
        assert_eq!(stored.components[0].cluster_names, vec!["cl1".to_string()]);
        assert_eq!(stored.components[0].vms[0].cluster_name, "vmcl");
        assert_eq!(stored.components[1].hostname, "db02");
        assert_eq!(stored.updated_at, Some(now));
    }
}
