use std::sync::Arc;

use crate::auth::AuthenticationProvider;
use crate::charts::OsClassifier;
use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::middleware::EndpointRateLimiter;

/// Route key used for the login rate limit.
pub const LOGIN_ENDPOINT: &str = "/user/login";

/// The shared application state.
///
/// Cloned into every handler and middleware by axum; everything inside is
/// either `Arc`ed or cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: sqlx::SqlitePool,
    /// The application configuration.
    pub config: Arc<AppConfig>,
    /// Counters exposed on `/metrics`.
    pub metrics: Metrics,
    /// Per-endpoint rate limiter, currently only guarding login attempts.
    pub rate_limiter: EndpointRateLimiter,
    /// The user authentication backend selected by `auth.provider`.
    pub auth: Arc<dyn AuthenticationProvider>,
    /// Operating system aggregation rules compiled once at startup.
    pub os_classifier: Arc<OsClassifier>,
}

impl AppState {
    /// Builds the state from an initialized pool and a validated config.
    ///
    /// Fails when the configured auth provider cannot be built or an
    /// aggregation rule does not compile.
    pub fn new(db: sqlx::SqlitePool, config: AppConfig) -> anyhow::Result<Self> {
        let auth = crate::auth::build_provider(&config.auth)?;
        Self::with_auth(db, config, auth)
    }

    /// Same as [`AppState::new`] with an explicit authentication provider.
    pub fn with_auth(db: sqlx::SqlitePool, config: AppConfig, auth: Arc<dyn AuthenticationProvider>) -> anyhow::Result<Self> {
        let os_classifier = OsClassifier::new(&config.chart.operating_system_aggregation_rules)?;
        let rate_limiter = EndpointRateLimiter::new().with_limits(vec![
            (LOGIN_ENDPOINT, 30, 60), // 30 login attempts per minute per client
        ]);

        Ok(Self {
            db,
            config: Arc::new(config),
            metrics: Metrics::new(),
            rate_limiter,
            auth,
            os_classifier: Arc::new(os_classifier),
        })
    }
}
