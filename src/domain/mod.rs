//! Domain values computed from the stored model: unit-normalized Exadata
//! capacities and their usage percentages.

pub mod exadata;
pub mod measurement;

pub use exadata::{OracleExadataComponent, OracleExadataInstance, OracleExadataStorageCell, OracleExadataVm};
pub use measurement::{MeasurementError, OracleExadataMeasurement};

/// Maps every element of a lower layer with a fallible conversion, stopping at
/// the first error.
pub fn to_upper_level_layers<T, U, E>(items: &[T], convert: impl Fn(&T) -> Result<U, E>) -> Result<Vec<U>, E> {
    items.iter().map(convert).collect()
}
