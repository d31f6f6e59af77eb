//! Background tasks spawned by the binary.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time;

use crate::error::{AppError, AppResult};
use crate::service::{alerts, hosts, licensing};
use crate::state::AppState;

/// Runs one historicization of the current compliance.
pub async fn historicize_once(state: &AppState) -> AppResult<usize> {
    let stored = licensing::historicize_current_compliance(&state.db).await?;
    state.metrics.inc_historicizations();
    Ok(stored)
}

/// Deletes archived host snapshots older than the configured threshold.
pub async fn clean_archived_hosts_once(state: &AppState, now: DateTime<Utc>) -> AppResult<u64> {
    let hours = state.config.data_service.archived_host_cleaning_hour_threshold;
    let threshold = chrono::Duration::try_hours(hours)
        .and_then(|age| now.checked_sub_signed(age))
        .ok_or_else(|| AppError::InvalidInput(format!("archived host cleaning threshold of {} hours is out of range", hours)))?;
    let deleted = hosts::delete_archived_hosts(&state.db, threshold).await?;
    state.metrics.add_archived_hosts_deleted(deleted);
    Ok(deleted)
}

/// Raises NO_DATA alerts for hosts without recent snapshots.
pub async fn check_freshness_once(state: &AppState, now: DateTime<Utc>) -> AppResult<usize> {
    let raised = alerts::check_freshness(&state.db, state.config.alert_service.freshness_check_days, now).await?;
    state.metrics.add_alerts_raised(raised.len() as u64);
    for alert in &raised {
        tracing::warn!(hostname = alert.hostname(), "{}", alert.description);
    }
    Ok(raised.len())
}

/// Stores today's compliance every `compliance.historicize_interval_secs`.
pub fn spawn_historicizer(state: AppState) -> tokio::task::JoinHandle<()> {
    let every = Duration::from_secs(state.config.compliance.historicize_interval_secs);
    tokio::spawn(async move {
        let mut ticker = time::interval(every);
        loop {
            ticker.tick().await;
            match historicize_once(&state).await {
                Ok(stored) => tracing::debug!(stored, "License compliance historicized"),
                Err(e) => tracing::warn!("License compliance historicization failed: {}", e),
            }
        }
    })
}

/// Purges old archived snapshots every `data_service.cleaning_interval_secs`.
pub fn spawn_archived_host_cleaner(state: AppState) -> tokio::task::JoinHandle<()> {
    let every = Duration::from_secs(state.config.data_service.cleaning_interval_secs);
    tokio::spawn(async move {
        let mut ticker = time::interval(every);
        loop {
            ticker.tick().await;
            match clean_archived_hosts_once(&state, Utc::now()).await {
                Ok(0) => {}
                Ok(deleted) => tracing::info!(deleted, "Deleted old archived hosts"),
                Err(e) => tracing::warn!("Archived host cleaning failed: {}", e),
            }
        }
    })
}

/// Runs the freshness check every `alert_service.freshness_check_interval_secs`.
pub fn spawn_freshness_checker(state: AppState) -> tokio::task::JoinHandle<()> {
    let every = Duration::from_secs(state.config.alert_service.freshness_check_interval_secs);
    tokio::spawn(async move {
        let mut ticker = time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = check_freshness_once(&state, Utc::now()).await {
                tracing::warn!("Freshness check failed: {}", e);
            }
        }
    })
}

/// Keeps the login rate limiter from growing without bound.
pub fn spawn_rate_limiter_cleanup(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(Duration::from_secs(300));
        loop {
            ticker.tick().await;
            state.rate_limiter.cleanup_all().await;
        }
    })
}
