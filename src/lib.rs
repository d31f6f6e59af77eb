//! # ercole
//!
//! Backend for asset inventory and license compliance of database estates.
//! Monitoring agents upload host snapshots and Exadata racks; users browse
//! them, manage the license catalog and agreements, and read compliance and
//! chart data.
//!
//! ## Architecture
//!
//! - **Axum**: HTTP server and routing
//! - **SQLx**: SQLite storage of JSON documents with indexed scalar columns
//! - **Tokio**: async runtime and periodic jobs
//!
//! ## Core Components
//!
//! - [`auth`]: Basic and LDAP credential providers, JWT tokens
//! - [`config`]: layered configuration
//! - [`db`]: schema initialization
//! - [`model`]: persisted shapes of host data, racks and licensing documents
//! - [`domain`]: Exadata values with normalized units and computed usage
//! - [`dto`]: response shapes
//! - [`compliance`]: license consumption and coverage
//! - [`charts`]: chart aggregations
//! - [`service`]: storage-backed operations used by the routes and jobs
//! - [`routes`]: HTTP handlers and the router
//! - [`jobs`]: compliance historicization and archived host cleaning

pub mod auth;
pub mod charts;
pub mod compliance;
pub mod config;
pub mod db;
pub mod domain;
pub mod dto;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod model;
pub mod routes;
pub mod service;
pub mod state;
pub mod utils;

#[cfg(test)]
mod tests;
