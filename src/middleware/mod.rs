//! Middleware components for HTTP request processing.
//!
//! Authentication of users and agents, client identification and the
//! per-endpoint rate limiter used by the login handler.

pub mod auth;
pub mod ip;
pub mod rate_limit;

pub use rate_limit::EndpointRateLimiter;
