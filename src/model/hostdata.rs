use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FieldError, LicenseType};

/// Version of the stored host data layout.
pub const SERVER_SCHEMA_VERSION: i32 = 1;

pub const CLOUD_MEMBERSHIP_AWS: &str = "aws";

#[derive(Debug, Error, PartialEq)]
pub enum HostDataError {
    #[error("host is not part of a veritas cluster with more than two members")]
    HostNotInCluster,
}

/// A snapshot of inventory facts submitted by an agent for one host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostData {
    pub id: String,
    pub archived: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub server_version: String,
    pub server_schema_version: i32,

    pub hostname: String,
    pub location: String,
    pub environment: String,
    pub agent_version: String,
    pub tags: Vec<String>,
    pub info: Host,
    pub cluster_membership_status: ClusterMembershipStatus,
    pub features: Features,
    pub filesystems: Vec<Filesystem>,
    pub clusters: Vec<ClusterInfo>,
    pub cloud: Cloud,
    pub errors: Vec<AgentError>,
    /// Fields sent by newer agents that this server does not model.
    #[serde(flatten)]
    pub other_info: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Host {
    pub hostname: String,
    pub cpu_model: String,
    pub cpu_frequency: String,
    pub cpu_sockets: i64,
    pub cpu_cores: i64,
    pub cpu_threads: i64,
    pub threads_per_core: i64,
    pub cores_per_socket: i64,
    pub hardware_abstraction: String,
    pub hardware_abstraction_technology: String,
    pub kernel: String,
    pub kernel_version: String,
    pub os: String,
    pub os_version: String,
    /// GiB
    pub memory_total: f64,
    /// GiB
    pub swap_total: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterMembershipStatus {
    pub oracle_cluster_ware: bool,
    pub sun_cluster: bool,
    pub hacmp: bool,
    pub veritas_cluster_server: bool,
    pub veritas_cluster_hostnames: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Filesystem {
    pub filesystem: String,
    pub r#type: String,
    pub mount_point: String,
    pub size: i64,
    pub used_space: i64,
    pub available_space: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterInfo {
    pub fetch_error_message: String,
    pub r#type: String,
    pub name: String,
    pub cpu: i64,
    pub sockets: i64,
    pub vms: Vec<VmInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VmInfo {
    pub name: String,
    pub cluster_name: String,
    pub hostname: String,
    pub physical_host: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cloud {
    pub membership: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentError {
    pub message: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Features {
    pub oracle: Option<OracleFeature>,
    pub mysql: Option<MySqlFeature>,
    pub microsoft: Option<MicrosoftFeature>,
    pub postgresql: Option<PostgreSqlFeature>,
    pub mongodb: Option<MongoDbFeature>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OracleFeature {
    pub database: Option<OracleDatabaseFeature>,
    pub exadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OracleDatabaseFeature {
    pub databases: Vec<OracleDatabase>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OracleDatabase {
    pub instance_number: i64,
    pub instance_name: String,
    pub name: String,
    pub unique_name: String,
    pub status: String,
    pub role: String,
    #[serde(rename = "isCDB")]
    pub is_cdb: bool,
    pub version: String,
    pub platform: String,
    pub archivelog: bool,
    pub charset: String,
    pub cpu_count: i64,
    pub datafile_size: f64,
    pub segments_size: f64,
    pub work: Option<f64>,
    pub dataguard: bool,
    pub licenses: Vec<OracleDatabaseLicense>,
}

impl OracleDatabase {
    /// Fills the type of licenses the agent reported by name only, matching
    /// the name against the aliases of `types`. A type is used at most once
    /// per database, explicitly typed licenses included.
    pub fn resolve_license_type_ids(&mut self, types: &[LicenseType]) {
        let mut used: Vec<String> = self
            .licenses
            .iter()
            .filter(|l| !l.license_type_id.is_empty())
            .map(|l| l.license_type_id.clone())
            .collect();

        for license in self.licenses.iter_mut().filter(|l| l.license_type_id.is_empty()) {
            let found = types
                .iter()
                .filter(|t| !used.contains(&t.id))
                .find(|t| t.aliases.iter().any(|alias| alias == &license.name));
            if let Some(t) = found {
                license.license_type_id = t.id.clone();
                used.push(t.id.clone());
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OracleDatabaseLicense {
    #[serde(rename = "licenseTypeID")]
    pub license_type_id: String,
    pub name: String,
    pub count: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MySqlFeature {
    pub instances: Vec<MySqlInstance>,
}

pub const MYSQL_EDITION_ENTERPRISE: &str = "ENTERPRISE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MySqlInstance {
    pub name: String,
    pub version: String,
    pub edition: String,
    pub platform: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MicrosoftFeature {
    pub sql_server: Option<SqlServerFeature>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SqlServerFeature {
    pub instances: Vec<SqlServerInstance>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SqlServerInstance {
    pub name: String,
    pub version: String,
    pub edition: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostgreSqlFeature {
    pub instances: Vec<PostgreSqlInstance>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostgreSqlInstance {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MongoDbFeature {
    pub instances: Vec<MongoDbInstance>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MongoDbInstance {
    pub instance_name: String,
    pub version: String,
}

impl HostData {
    pub fn oracle_databases(&self) -> &[OracleDatabase] {
        self.features
            .oracle
            .as_ref()
            .and_then(|o| o.database.as_ref())
            .map(|d| d.databases.as_slice())
            .unwrap_or(&[])
    }

    pub fn mysql_instances(&self) -> &[MySqlInstance] {
        self.features.mysql.as_ref().map(|m| m.instances.as_slice()).unwrap_or(&[])
    }

    pub fn sql_server_instances(&self) -> &[SqlServerInstance] {
        self.features
            .microsoft
            .as_ref()
            .and_then(|m| m.sql_server.as_ref())
            .map(|s| s.instances.as_slice())
            .unwrap_or(&[])
    }

    pub fn postgresql_instances(&self) -> &[PostgreSqlInstance] {
        self.features.postgresql.as_ref().map(|p| p.instances.as_slice()).unwrap_or(&[])
    }

    pub fn mongodb_instances(&self) -> &[MongoDbInstance] {
        self.features.mongodb.as_ref().map(|m| m.instances.as_slice()).unwrap_or(&[])
    }

    /// Core factor used for processor licensing, AWS hosts count every core.
    pub fn core_factor(&self) -> f64 {
        if self.cloud.membership == CLOUD_MEMBERSHIP_AWS {
            1.0
        } else {
            0.5
        }
    }

    /// Whether the host is a member of a veritas cluster large enough to be
    /// licensed as a whole.
    pub fn is_in_licensed_cluster(&self) -> bool {
        let cms = &self.cluster_membership_status;
        cms.veritas_cluster_server && cms.veritas_cluster_hostnames.len() > 2
    }

    /// Sum of the cores of all veritas cluster members. Members without data
    /// count with the cores of this host.
    pub fn cluster_cores(&self, hosts_by_name: &HashMap<String, &HostData>) -> Result<i64, HostDataError> {
        if !self.is_in_licensed_cluster() {
            return Err(HostDataError::HostNotInCluster);
        }

        Ok(self
            .cluster_membership_status
            .veritas_cluster_hostnames
            .iter()
            .map(|h| hosts_by_name.get(h).map(|other| other.info.cpu_cores).unwrap_or(self.info.cpu_cores))
            .sum())
    }

    /// Resolves the licenses of every Oracle database, see
    /// [`OracleDatabase::resolve_license_type_ids`].
    pub fn resolve_license_type_ids(&mut self, types: &[LicenseType]) {
        let databases = self.features.oracle.as_mut().and_then(|o| o.database.as_mut());
        for db in databases.into_iter().flat_map(|d| d.databases.iter_mut()) {
            db.resolve_license_type_ids(types);
        }
    }

    /// Checks the fields every stored snapshot must carry.
    pub fn validate(&self) -> Result<(), FieldError> {
        let required = [("hostname", &self.hostname), ("location", &self.location), ("environment", &self.environment)];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(FieldError::new(field, format!("{} cannot be empty", field)));
            }
        }
        let counters = [
            ("info.cpuSockets", self.info.cpu_sockets),
            ("info.cpuCores", self.info.cpu_cores),
            ("info.cpuThreads", self.info.cpu_threads),
        ];
        for (field, value) in counters {
            if value < 0 {
                return Err(FieldError::new(field, format!("value must not be negative, got {}", value)));
            }
        }
        Ok(())
    }
}
