#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sqlx::Row;

    use crate::config::AppConfig;
    use crate::error::AppError;
    use crate::jobs;
    use crate::model::{HostData, OracleExadataComponent, OracleExadataInstance};
    use crate::service::{exadata, hosts, licensing};
    use crate::tests::{host_payload, memory_pool, test_state, test_state_with};
    use crate::utils::{max_time, min_time, GlobalFilter};

    fn host(hostname: &str, cores: i64) -> HostData {
        serde_json::from_value(host_payload(hostname, "Italy", cores, "19.0.0.0.0", 2.0)).unwrap()
    }

    async fn count(pool: &sqlx::SqlitePool, sql: &str) -> i64 {
        sqlx::query(sql).fetch_one(pool).await.unwrap().get::<i64, _>(0)
    }

    #[tokio::test]
    async fn test_insert_archives_previous_snapshot() {
        let pool = memory_pool().await;
        let first = hosts::insert_host_data(&pool, host("srv1", 2)).await.unwrap();
        let second = hosts::insert_host_data(&pool, host("srv1", 4)).await.unwrap();
        assert_ne!(first.id, second.id);

        assert_eq!(count(&pool, "SELECT COUNT(*) FROM hosts").await, 2);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM hosts WHERE archived = 0").await, 1);

        let current = hosts::get_host(&pool, "srv1", max_time()).await.unwrap();
        assert_eq!(current.id, second.id);
        assert_eq!(current.info.cpu_cores, 4);
        assert!(!current.archived);
        assert_eq!(current.server_version, hosts::SERVER_VERSION);
    }

    #[tokio::test]
    async fn test_older_than_selects_past_snapshots() {
        let pool = memory_pool().await;
        hosts::insert_host_data(&pool, host("srv1", 2)).await.unwrap();

        let past = GlobalFilter { older_than: Utc::now() - Duration::days(1), ..Default::default() };
        assert!(hosts::list_hosts(&pool, &past).await.unwrap().is_empty());

        let soon = GlobalFilter { older_than: Utc::now() + Duration::minutes(1), ..Default::default() };
        let listed = hosts::list_hosts(&pool, &soon).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].hostname, "srv1");
    }

    #[tokio::test]
    async fn test_snapshots_between_bounds_creation_time() {
        let pool = memory_pool().await;
        let before = Utc::now() - Duration::seconds(1);
        hosts::insert_host_data(&pool, host("srv1", 2)).await.unwrap();
        hosts::insert_host_data(&pool, host("srv1", 4)).await.unwrap();
        let after = Utc::now() + Duration::seconds(1);

        let all = hosts::snapshots_between(&pool, before, after).await.unwrap();
        assert_eq!(all.iter().map(|h| h.info.cpu_cores).collect::<Vec<_>>(), [2, 4]);
        assert!(all[0].archived);

        assert!(hosts::snapshots_between(&pool, after, max_time()).await.unwrap().is_empty());
        assert!(hosts::snapshots_between(&pool, min_time(), before).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_archive_and_delete_archived_hosts() {
        let pool = memory_pool().await;
        hosts::insert_host_data(&pool, host("srv1", 2)).await.unwrap();
        hosts::archive_host(&pool, "srv1").await.unwrap();
        assert!(hosts::archive_host(&pool, "srv1").await.is_err());
        assert!(hosts::list_hosts(&pool, &GlobalFilter::default()).await.unwrap().is_empty());

        // Nothing is older than a threshold in the past.
        assert_eq!(hosts::delete_archived_hosts(&pool, Utc::now() - Duration::hours(1)).await.unwrap(), 0);
        assert_eq!(hosts::delete_archived_hosts(&pool, Utc::now() + Duration::hours(1)).await.unwrap(), 1);
        assert!(hosts::snapshots_between(&pool, min_time(), max_time()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cleaning_job_uses_configured_threshold() {
        let state = test_state().await;
        hosts::insert_host_data(&state.db, host("srv1", 2)).await.unwrap();
        hosts::insert_host_data(&state.db, host("srv1", 4)).await.unwrap();

        let threshold = state.config.data_service.archived_host_cleaning_hour_threshold;
        assert_eq!(jobs::clean_archived_hosts_once(&state, Utc::now()).await.unwrap(), 0);
        let later = Utc::now() + Duration::hours(threshold + 1);
        assert_eq!(jobs::clean_archived_hosts_once(&state, later).await.unwrap(), 1);
        assert_eq!(state.metrics.get_snapshot().archived_hosts_deleted, 1);

        // The current snapshot is never cleaned.
        assert_eq!(hosts::list_hosts(&state.db, &GlobalFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cleaning_job_rejects_out_of_range_threshold() {
        let mut config = AppConfig::default();
        config.data_service.archived_host_cleaning_hour_threshold = i64::MAX;
        let state = test_state_with(config).await;
        hosts::insert_host_data(&state.db, host("srv1", 2)).await.unwrap();
        hosts::insert_host_data(&state.db, host("srv1", 4)).await.unwrap();

        let err = jobs::clean_archived_hosts_once(&state, Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(state.metrics.get_snapshot().archived_hosts_deleted, 0);
    }

    #[tokio::test]
    async fn test_concurrent_exadata_uploads_are_merged() {
        let pool = memory_pool().await;
        let rack = |component: &str| OracleExadataInstance {
            rack_id: "rack01".into(),
            hostname: "exa01".into(),
            components: vec![OracleExadataComponent {
                hostname: component.into(),
                host_id: format!("id-{}", component),
                ..Default::default()
            }],
            ..Default::default()
        };

        let (first, second) = tokio::join!(exadata::save_exadata(&pool, rack("db01")), exadata::save_exadata(&pool, rack("db02")));
        first.unwrap();
        second.unwrap();

        let stored = exadata::get_exadata(&pool, "rack01").await.unwrap();
        let mut components: Vec<&str> = stored.components.iter().map(|c| c.hostname.as_str()).collect();
        components.sort();
        assert_eq!(components, ["db01", "db02"]);
    }

    #[tokio::test]
    async fn test_historicize_keeps_one_value_per_day() {
        let state = test_state().await;
        hosts::insert_host_data(&state.db, host("srv1", 2)).await.unwrap();

        assert_eq!(jobs::historicize_once(&state).await.unwrap(), 1);
        hosts::insert_host_data(
            &state.db,
            serde_json::from_value(host_payload("srv2", "Italy", 4, "19.0.0.0.0", 3.0)).unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(jobs::historicize_once(&state).await.unwrap(), 1);

        let history = licensing::license_compliance_history(&state.db).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].license_type_id, "A90611");
        // Unknown to the catalog, so the name reported by the agent is used.
        assert_eq!(history[0].item_description, "Oracle EE");
        assert_eq!(history[0].history.len(), 1);
        assert_eq!(history[0].history[0].consumed, 5.0);

        let yesterday = licensing::database_licenses_compliance(&state.db).await.unwrap();
        licensing::historicize(&state.db, &yesterday, Utc::now() - Duration::days(1)).await.unwrap();
        let history = licensing::license_compliance_history(&state.db).await.unwrap();
        assert_eq!(history[0].history.len(), 2);
        assert!(history[0].history[0].date < history[0].history[1].date);
    }
}
