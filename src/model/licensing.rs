use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FieldError;

pub const METRIC_PROCESSOR_PERPETUAL: &str = "Processor Perpetual";
pub const METRIC_COMPUTER_PERPETUAL: &str = "Computer Perpetual";
pub const METRIC_NAMED_USER_PLUS_PERPETUAL: &str = "Named User Plus Perpetual";

/// Users covered by one Named User Plus license.
pub const NAMED_USER_PLUS_USERS_PER_LICENSE: f64 = 25.0;

pub const TECHNOLOGY_ORACLE_DATABASE: &str = "Oracle/Database";
pub const TECHNOLOGY_ORACLE_MYSQL: &str = "Oracle/MySQL";
pub const TECHNOLOGY_MICROSOFT_SQLSERVER: &str = "Microsoft/SQLServer";
pub const TECHNOLOGY_POSTGRESQL: &str = "PostgreSQL/PostgreSQL";
pub const TECHNOLOGY_MONGODB: &str = "MongoDB/MongoDB";
pub const TECHNOLOGY_UNKNOWN_OPERATING_SYSTEM: &str = "Unknown/Unknown";

/// Database technologies in the order they are charted.
pub const DATABASE_TECHNOLOGIES: [&str; 5] = [
    TECHNOLOGY_ORACLE_DATABASE,
    TECHNOLOGY_ORACLE_MYSQL,
    TECHNOLOGY_MICROSOFT_SQLSERVER,
    TECHNOLOGY_POSTGRESQL,
    TECHNOLOGY_MONGODB,
];

/// A purchasable license part, e.g. `A90611` "Oracle Database Enterprise Edition".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LicenseType {
    #[serde(rename = "id")]
    pub id: String,
    pub item_description: String,
    pub metric: String,
    pub cost: f64,
    pub aliases: Vec<String>,
    pub option: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OracleDatabaseAgreement {
    pub id: String,
    #[serde(rename = "agreementID")]
    pub agreement_id: String,
    #[serde(rename = "licenseTypeID")]
    pub license_type_id: String,
    pub csi: String,
    pub reference_number: String,
    pub unlimited: bool,
    pub count: f64,
    pub catch_all: bool,
    pub hosts: Vec<String>,
}

pub const MYSQL_CONTRACT_TYPE_HOST: &str = "HOST";
pub const MYSQL_CONTRACT_TYPE_CLUSTER: &str = "CLUSTER";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MySqlContract {
    pub id: String,
    #[serde(rename = "contractID")]
    pub contract_id: String,
    pub r#type: String,
    pub number_of_licenses: f64,
    pub clusters: Vec<String>,
    pub hosts: Vec<String>,
}

/// One day of a license compliance time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseComplianceHistoricValue {
    pub date: DateTime<Utc>,
    pub consumed: f64,
    pub covered: f64,
    pub purchased: f64,
}

impl OracleDatabaseAgreement {
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.agreement_id.trim().is_empty() {
            return Err(FieldError::new("agreementID", "agreementID cannot be empty"));
        }
        if self.license_type_id.trim().is_empty() {
            return Err(FieldError::new("licenseTypeID", "licenseTypeID cannot be empty"));
        }
        if self.count < 0.0 {
            return Err(FieldError::new("count", format!("count must not be negative, got {}", self.count)));
        }
        let mut hosts = self.hosts.clone();
        hosts.sort();
        hosts.dedup();
        if hosts.len() != self.hosts.len() {
            return Err(FieldError::new("hosts", "hosts must be unique"));
        }
        Ok(())
    }
}

impl MySqlContract {
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.contract_id.trim().is_empty() {
            return Err(FieldError::new("contractID", "contractID cannot be empty"));
        }
        if self.r#type != MYSQL_CONTRACT_TYPE_HOST && self.r#type != MYSQL_CONTRACT_TYPE_CLUSTER {
            return Err(FieldError::new("type", format!("type must be {} or {}", MYSQL_CONTRACT_TYPE_HOST, MYSQL_CONTRACT_TYPE_CLUSTER)));
        }
        if self.number_of_licenses < 0.0 {
            return Err(FieldError::new("numberOfLicenses", "numberOfLicenses must not be negative"));
        }
        Ok(())
    }
}
