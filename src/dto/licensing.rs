use serde::{Deserialize, Serialize};

use crate::model::LicenseComplianceHistoricValue;

/// Compliance of one license type across the selected hosts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseCompliance {
    #[serde(rename = "licenseTypeID")]
    pub license_type_id: String,
    pub item_description: String,
    pub metric: String,
    pub consumed: f64,
    pub covered: f64,
    pub purchased: f64,
    pub compliance: f64,
    pub unlimited: bool,
    pub available: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseComplianceHistory {
    #[serde(rename = "licenseTypeID")]
    pub license_type_id: String,
    pub item_description: String,
    pub metric: String,
    pub history: Vec<LicenseComplianceHistoricValue>,
}
