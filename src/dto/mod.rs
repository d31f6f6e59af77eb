//! Response shapes served by the REST endpoints.

pub mod chart;
pub mod exadata;
pub mod licensing;

pub use chart::*;
pub use exadata::{to_oracle_exadata_instance, OracleExadataComponent, OracleExadataInstance, OracleExadataStorageCell, OracleExadataVm};
pub use licensing::*;
