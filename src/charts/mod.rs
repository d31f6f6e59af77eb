//! Chart computations over stored host snapshots and compliance history.

pub mod cores;
pub mod history;
pub mod oracle;
pub mod technology;

pub use cores::host_cores;
pub use history::{merge_license_compliance_historic_values, merge_mysql_licenses_compliance, sort_and_keep_only_last_entry_of_each_day};
pub use oracle::oracle_database_chart;
pub use technology::{change_chart, technology_count, technology_types_chart, OsClassifier};
