use std::net::IpAddr;
use std::path::Path;

use serde::Deserialize;

/// Upper bound for `auth.token_validity_timeout`: ten years.
pub const MAX_TOKEN_VALIDITY_SECS: u64 = 10 * 365 * 24 * 3600;
/// Upper bound for `data_service.archived_host_cleaning_hour_threshold`: a hundred years.
pub const MAX_ARCHIVED_HOST_CLEANING_HOURS: i64 = 100 * 365 * 24;
/// Upper bound for `alert_service.freshness_check_days`: ten years.
pub const MAX_FRESHNESS_CHECK_DAYS: i64 = 10 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Reverse proxies whose `X-Forwarded-For` / `X-Real-IP` headers are
    /// trusted. Requests from any other peer are keyed on the peer address.
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Which backend verifies user credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProviderKind {
    Basic,
    Ldap,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LdapConfig {
    pub host: String,
    pub port: u16,
    pub use_ssl: bool,
    pub base: String,
    pub bind_dn: String,
    pub bind_password: String,
    /// Search filter, `%s` is replaced by the (escaped) username.
    pub user_filter: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub provider: AuthProviderKind,
    pub username: String,
    pub password: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub token_validity_timeout: u64,
    pub ldap: Option<LdapConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataServiceConfig {
    pub agent_username: String,
    pub agent_password: String,
    pub log_inserting_hostdata: bool,
    /// Archived snapshots older than this many hours are deleted.
    pub archived_host_cleaning_hour_threshold: i64,
    pub cleaning_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperatingSystemAggregationRule {
    pub regex: String,
    pub group: String,
    pub product: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChartConfig {
    #[serde(default)]
    pub operating_system_aggregation_rules: Vec<OperatingSystemAggregationRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComplianceConfig {
    pub historicize_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertServiceConfig {
    /// Current hosts without a new snapshot for this many days get a NO_DATA alert.
    pub freshness_check_days: i64,
    pub freshness_check_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub data_service: DataServiceConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    pub compliance: ComplianceConfig,
    pub alert_service: AlertServiceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        let defaults: &str = include_str!("../config/default.toml");
        match ::config::Config::builder()
            .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => {
                    eprintln!("FATAL: Failed to deserialize default config: {}", e);
                    panic!("Failed to deserialize default config: {}", e);
                }
            },
            Err(e) => {
                eprintln!("FATAL: Failed to parse default config: {}", e);
                panic!("Failed to parse default config: {}", e);
            }
        }
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let defaults: &str = include_str!("../config/default.toml");
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
        // Optional local file: ercole.toml (in CWD)
        .add_source(::config::File::with_name("ercole").required(false));

    if let Ok(custom_path) = std::env::var("ERCOLE_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("ERCOLE").separator("__"));

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

pub fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    // Auth
    if cfg.auth.jwt_secret.is_empty() {
        return Err(anyhow::anyhow!("auth.jwt_secret must not be empty"));
    }
    if cfg.auth.token_validity_timeout == 0 || cfg.auth.token_validity_timeout > MAX_TOKEN_VALIDITY_SECS {
        return Err(anyhow::anyhow!(
            "auth.token_validity_timeout must be between 1 and {} seconds, got {}",
            MAX_TOKEN_VALIDITY_SECS,
            cfg.auth.token_validity_timeout
        ));
    }
    if cfg.auth.provider == AuthProviderKind::Ldap && cfg.auth.ldap.is_none() {
        return Err(anyhow::anyhow!("auth.ldap section is required when auth.provider = \"ldap\""));
    }
    if let Some(ldap) = &cfg.auth.ldap {
        if !ldap.user_filter.contains("%s") {
            return Err(anyhow::anyhow!("auth.ldap.user_filter must contain the %s placeholder"));
        }
    }

    if cfg.data_service.agent_username.is_empty() {
        return Err(anyhow::anyhow!("data_service.agent_username must not be empty"));
    }

    for rule in &cfg.chart.operating_system_aggregation_rules {
        regex::Regex::new(&rule.regex)
            .map_err(|e| anyhow::anyhow!("invalid operating system aggregation regex {:?}: {}", rule.regex, e))?;
    }

    let threshold = cfg.data_service.archived_host_cleaning_hour_threshold;
    if threshold <= 0 || threshold > MAX_ARCHIVED_HOST_CLEANING_HOURS {
        return Err(anyhow::anyhow!(
            "data_service.archived_host_cleaning_hour_threshold must be between 1 and {}, got {}",
            MAX_ARCHIVED_HOST_CLEANING_HOURS,
            threshold
        ));
    }
    if cfg.data_service.cleaning_interval_secs < 60 {
        return Err(anyhow::anyhow!("data_service.cleaning_interval_secs must be >= 60"));
    }

    if cfg.compliance.historicize_interval_secs < 60 {
        return Err(anyhow::anyhow!("compliance.historicize_interval_secs must be >= 60"));
    }

    let days = cfg.alert_service.freshness_check_days;
    if days <= 0 || days > MAX_FRESHNESS_CHECK_DAYS {
        return Err(anyhow::anyhow!(
            "alert_service.freshness_check_days must be between 1 and {}, got {}",
            MAX_FRESHNESS_CHECK_DAYS,
            days
        ));
    }
    if cfg.alert_service.freshness_check_interval_secs < 60 {
        return Err(anyhow::anyhow!("alert_service.freshness_check_interval_secs must be >= 60"));
    }

    Ok(())
}

pub fn ensure_sqlite_parent_dir(url: &str) -> anyhow::Result<()> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }
    Ok(())
}
