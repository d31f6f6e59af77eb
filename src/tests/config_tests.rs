#[cfg(test)]
mod tests {
    use crate::config::{self, AppConfig, AuthProviderKind};

    #[test]
    fn test_default_config() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 11113);
        assert_eq!(cfg.auth.provider, AuthProviderKind::Basic);
        assert_eq!(cfg.auth.username, "user");
        assert_eq!(cfg.data_service.agent_username, "agent");
        assert!(cfg.auth.ldap.is_some());
        assert!(!cfg.chart.operating_system_aggregation_rules.is_empty());
        assert!(cfg.server.trusted_proxies.is_empty());
        assert_eq!(cfg.alert_service.freshness_check_days, 1);
        assert!(config::validate(&cfg).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = AppConfig::default();
        cfg.server.port = 0;
        assert!(config::validate(&cfg).is_err());

        let mut cfg = AppConfig::default();
        cfg.auth.jwt_secret.clear();
        assert!(config::validate(&cfg).is_err());

        let mut cfg = AppConfig::default();
        cfg.auth.token_validity_timeout = 0;
        assert!(config::validate(&cfg).is_err());

        let mut cfg = AppConfig::default();
        cfg.compliance.historicize_interval_secs = 1;
        assert!(config::validate(&cfg).is_err());
    }

    #[test]
    fn test_durations_are_bounded() {
        let mut cfg = AppConfig::default();
        cfg.auth.token_validity_timeout = config::MAX_TOKEN_VALIDITY_SECS;
        assert!(config::validate(&cfg).is_ok());
        cfg.auth.token_validity_timeout = config::MAX_TOKEN_VALIDITY_SECS + 1;
        assert!(config::validate(&cfg).is_err());
        cfg.auth.token_validity_timeout = u64::MAX;
        assert!(config::validate(&cfg).is_err());

        let mut cfg = AppConfig::default();
        cfg.data_service.archived_host_cleaning_hour_threshold = 0;
        assert!(config::validate(&cfg).is_err());
        cfg.data_service.archived_host_cleaning_hour_threshold = i64::MAX;
        let err = config::validate(&cfg).unwrap_err();
        assert!(err.to_string().contains("archived_host_cleaning_hour_threshold"));

        let mut cfg = AppConfig::default();
        cfg.alert_service.freshness_check_days = config::MAX_FRESHNESS_CHECK_DAYS + 1;
        assert!(config::validate(&cfg).is_err());
        cfg.alert_service.freshness_check_days = 0;
        assert!(config::validate(&cfg).is_err());
    }

    #[test]
    fn test_ldap_settings_are_checked() {
        let mut cfg = AppConfig::default();
        cfg.auth.provider = AuthProviderKind::Ldap;
        assert!(config::validate(&cfg).is_ok());

        if let Some(ldap) = cfg.auth.ldap.as_mut() {
            ldap.user_filter = "(uid=admin)".into();
        }
        let err = config::validate(&cfg).unwrap_err();
        assert!(err.to_string().contains("%s"));

        cfg.auth.ldap = None;
        assert!(config::validate(&cfg).is_err());
    }

    #[test]
    fn test_invalid_os_rule_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.chart.operating_system_aggregation_rules[0].regex = "([unclosed".into();
        assert!(config::validate(&cfg).is_err());
    }

    #[test]
    fn test_sqlite_parent_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("ercole.db");
        config::ensure_sqlite_parent_dir(&format!("sqlite://{}", db.display())).unwrap();
        assert!(dir.path().join("nested").is_dir());

        // Non file URLs are left alone.
        config::ensure_sqlite_parent_dir("sqlite::memory:").unwrap();
    }
}
