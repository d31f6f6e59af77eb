use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Process wide counters exposed on `/metrics`
#[derive(Clone)]
pub struct Metrics {
    pub hostdata_inserted: Arc<AtomicU64>,
    pub hostdata_rejected: Arc<AtomicU64>,
    pub exadata_saved: Arc<AtomicU64>,
    pub logins_succeeded: Arc<AtomicU64>,
    pub logins_failed: Arc<AtomicU64>,
    pub historicizations: Arc<AtomicU64>,
    pub archived_hosts_deleted: Arc<AtomicU64>,
    pub alerts_raised: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            hostdata_inserted: Arc::new(AtomicU64::new(0)),
            hostdata_rejected: Arc::new(AtomicU64::new(0)),
            exadata_saved: Arc::new(AtomicU64::new(0)),
            logins_succeeded: Arc::new(AtomicU64::new(0)),
            logins_failed: Arc::new(AtomicU64::new(0)),
            historicizations: Arc::new(AtomicU64::new(0)),
            archived_hosts_deleted: Arc::new(AtomicU64::new(0)),
            alerts_raised: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_hostdata_inserted(&self) {
        self.hostdata_inserted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_hostdata_rejected(&self) {
        self.hostdata_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_exadata_saved(&self) {
        self.exadata_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_logins_succeeded(&self) {
        self.logins_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_logins_failed(&self) {
        self.logins_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_historicizations(&self) {
        self.historicizations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_archived_hosts_deleted(&self, count: u64) {
        self.archived_hosts_deleted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_alerts_raised(&self, count: u64) {
        self.alerts_raised.fetch_add(count, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hostdata_inserted: self.hostdata_inserted.load(Ordering::Relaxed),
            hostdata_rejected: self.hostdata_rejected.load(Ordering::Relaxed),
            exadata_saved: self.exadata_saved.load(Ordering::Relaxed),
            logins_succeeded: self.logins_succeeded.load(Ordering::Relaxed),
            logins_failed: self.logins_failed.load(Ordering::Relaxed),
            historicizations: self.historicizations.load(Ordering::Relaxed),
            archived_hosts_deleted: self.archived_hosts_deleted.load(Ordering::Relaxed),
            alerts_raised: self.alerts_raised.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub hostdata_inserted: u64,
    pub hostdata_rejected: u64,
    pub exadata_saved: u64,
    pub logins_succeeded: u64,
    pub logins_failed: u64,
    pub historicizations: u64,
    pub archived_hosts_deleted: u64,
    pub alerts_raised: u64,
    pub uptime_seconds: u64,
}
