use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::dto::HostCores;
use crate::model::HostData;
use crate::utils::{truncate_to_day, GlobalFilter};

/// Total cores per UTC day. For each day every hostname contributes the cores
/// of its last snapshot of that day; only snapshots created between
/// `newer_than` and `filter.older_than` are considered.
pub fn host_cores(snapshots: &[HostData], filter: &GlobalFilter, newer_than: DateTime<Utc>) -> Vec<HostCores> {
    let mut days: BTreeMap<DateTime<Utc>, HashMap<&str, (DateTime<Utc>, i64)>> = BTreeMap::new();

    for host in snapshots {
        let Some(created_at) = host.created_at else { continue };
        if created_at < newer_than || created_at > filter.older_than || !filter.matches(&host.location, &host.environment) {
            continue;
        }

        let day = days.entry(truncate_to_day(created_at)).or_default();
        let slot = day.entry(host.hostname.as_str()).or_insert((created_at, host.info.cpu_cores));
        if created_at >= slot.0 {
            *slot = (created_at, host.info.cpu_cores);
        }
    }

    days.into_iter()
        .map(|(date, hosts)| HostCores { date, cores: hosts.values().map(|(_, cores)| cores).sum() })
        .collect()
}
