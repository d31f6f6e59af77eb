//! Storage backed operations used by the HTTP handlers and background jobs.

pub mod alerts;
pub mod exadata;
pub mod hosts;
pub mod licensing;
