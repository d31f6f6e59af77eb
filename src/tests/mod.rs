//! Integration and unit tests for ercole.
//!
//! ## Test Modules
//!
//! - **api_tests**: authentication and the REST surface end to end
//! - **alerts_api_tests**: alerts raised by uploads and freshness checks, acknowledgement
//! - **licensing_api_tests**: license catalog, compliance and history over HTTP
//! - **exadata_api_tests**: rack upload and management over HTTP
//! - **service_tests**: storage-backed services against SQLite
//! - **error_tests**: error classes and responses
//! - **config_tests**: default configuration and validation
//! - **db_tests**: schema initialization
//! - **health_api_tests**: health, metrics and version endpoints
//!
//! Every test gets its own in-memory database.

pub mod alerts_api_tests;
pub mod config_tests;
pub mod error_tests;
pub mod exadata_api_tests;
pub mod licensing_api_tests;
pub mod service_tests;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{prelude::BASE64_STANDARD, Engine};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::net::SocketAddr;
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::state::AppState;

/// A single-connection in-memory database with the schema applied. One
/// connection only, since every `sqlite::memory:` connection is its own database.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    crate::db::init_db(&pool).await.unwrap();
    pool
}

pub async fn test_state() -> AppState {
    test_state_with(AppConfig::default()).await
}

pub async fn test_state_with(config: AppConfig) -> AppState {
    AppState::new(memory_pool().await, config).unwrap()
}

pub async fn test_app() -> (Router, AppState) {
    test_app_with(AppConfig::default()).await
}

pub async fn test_app_with(config: AppConfig) -> (Router, AppState) {
    let state = test_state_with(config).await;
    (crate::routes::router(state.clone()), state)
}

pub fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", BASE64_STANDARD.encode(format!("{}:{}", username, password)))
}

/// Credentials of the default configuration.
pub fn user_auth() -> String {
    basic("user", "password")
}

pub fn agent_auth() -> String {
    basic("agent", "password")
}

pub async fn send(app: &Router, method: Method, uri: &str, auth: Option<&str>, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

/// Posts a login as if it arrived over a connection from `peer`, optionally
/// carrying an `X-Forwarded-For` header.
pub async fn login_from(app: &Router, peer: SocketAddr, forwarded_for: Option<&str>, password: &str) -> StatusCode {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/user/login")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(xff) = forwarded_for {
        builder = builder.header("x-forwarded-for", xff);
    }
    let body = serde_json::json!({ "username": "user", "password": password });
    let mut req = builder.body(Body::from(body.to_string())).unwrap();
    req.extensions_mut().insert(ConnectInfo(peer));
    app.clone().oneshot(req).await.unwrap().status()
}

/// Like [`send`], decoding the body as JSON (`Value::Null` when empty).
pub async fn send_json(app: &Router, method: Method, uri: &str, auth: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, auth, body).await;
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

/// Agent payload of a Red Hat host with one Oracle database.
pub fn host_payload(hostname: &str, location: &str, cores: i64, version: &str, ee_licenses: f64) -> Value {
    serde_json::json!({
        "hostname": hostname,
        "location": location,
        "environment": "PROD",
        "agentVersion": "1.6.6",
        "info": {
            "hostname": hostname,
            "cpuCores": cores,
            "os": "Red Hat Enterprise Linux",
            "osVersion": "7.6"
        },
        "features": {
            "oracle": {
                "database": {
                    "databases": [{
                        "name": "ERCOLE",
                        "version": version,
                        "work": 3.5,
                        "licenses": [
                            { "licenseTypeID": "A90611", "name": "Oracle EE", "count": ee_licenses }
                        ]
                    }]
                }
            }
        }
    })
}
