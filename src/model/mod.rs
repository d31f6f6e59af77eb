//! Persisted shapes of the inventory data: host snapshots, Exadata racks and
//! licensing documents.

pub mod alert;
pub mod exadata;
pub mod hostdata;
pub mod licensing;

pub use alert::*;
pub use exadata::*;
pub use hostdata::*;
pub use licensing::*;

/// A document field that failed validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}
