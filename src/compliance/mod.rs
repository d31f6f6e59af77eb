//! License compliance: what the inventoried databases consume against what
//! the stored agreements and contracts cover.

pub mod mysql;
pub mod oracle;

use crate::dto::LicenseCompliance;
use crate::model::{HostData, LicenseType, MySqlContract, OracleDatabaseAgreement};

pub use mysql::mysql_licenses_compliance;
pub use oracle::oracle_licenses_compliance;

/// Oracle compliance followed by MySQL compliance.
pub fn database_licenses_compliance(
    hosts: &[HostData],
    license_types: &[LicenseType],
    agreements: &[OracleDatabaseAgreement],
    contracts: &[MySqlContract],
) -> Vec<LicenseCompliance> {
    let mut out = oracle_licenses_compliance(hosts, license_types, agreements);
    out.extend(mysql_licenses_compliance(hosts, contracts));
    out
}
