use std::collections::{BTreeMap, HashMap, HashSet};

use crate::dto::LicenseCompliance;
use crate::model::{HostData, LicenseType, OracleDatabaseAgreement, METRIC_NAMED_USER_PLUS_PERPETUAL, NAMED_USER_PLUS_USERS_PER_LICENSE};

/// Consumption of one license type on one host.
#[derive(Debug, Clone, PartialEq)]
pub struct HostUsage {
    pub hostname: String,
    pub consumed: f64,
    /// Part of `consumed` not yet covered by an agreement.
    pub remaining: f64,
}

fn multiplier(metric: &str) -> f64 {
    if metric == METRIC_NAMED_USER_PLUS_PERPETUAL {
        NAMED_USER_PLUS_USERS_PER_LICENSE
    } else {
        1.0
    }
}

/// Licenses consumed by every host, grouped by license type id. Metrics are
/// looked up in `types`; unknown types are treated as processor licenses.
pub fn host_usages(hosts: &[HostData], types: &HashMap<&str, &LicenseType>) -> BTreeMap<String, Vec<HostUsage>> {
    let by_name: HashMap<String, &HostData> = hosts.iter().map(|h| (h.hostname.clone(), h)).collect();
    let mut counted_clusters: HashSet<(Vec<String>, String)> = HashSet::new();
    let mut out: BTreeMap<String, Vec<HostUsage>> = BTreeMap::new();

    for host in hosts {
        let mut per_type: BTreeMap<&str, f64> = BTreeMap::new();
        for license in host.oracle_databases().iter().flat_map(|db| &db.licenses) {
            // Licenses no type was resolved for cannot be checked.
            if license.count > 0.0 && !license.license_type_id.is_empty() {
                let count = per_type.entry(license.license_type_id.as_str()).or_insert(0.0);
                *count = count.max(license.count);
            }
        }

        for (license_type_id, count) in per_type {
            let metric = types.get(license_type_id).map(|t| t.metric.as_str()).unwrap_or_default();
            let mut consumed = count;

            if host.is_in_licensed_cluster() && metric != METRIC_NAMED_USER_PLUS_PERPETUAL {
                let mut members = host.cluster_membership_status.veritas_cluster_hostnames.clone();
                members.sort();
                consumed = if counted_clusters.insert((members, license_type_id.to_string())) {
                    match host.cluster_cores(&by_name) {
                        Ok(cores) => cores as f64 * host.core_factor(),
                        Err(e) => {
                            tracing::warn!("Cannot compute cluster cores of {}: {}", host.hostname, e);
                            count
                        }
                    }
                } else {
                    0.0
                };
            }

            consumed *= multiplier(metric);
            out.entry(license_type_id.to_string()).or_default().push(HostUsage {
                hostname: host.hostname.clone(),
                consumed,
                remaining: consumed,
            });
        }
    }

    out
}

/// Covers the remaining usage of `usages`, largest first, with at most
/// `available` licenses. Returns what is left of `available`.
fn cover(usages: &mut [&mut HostUsage], mut available: f64, covered: &mut f64) -> f64 {
    usages.sort_by(|a, b| b.remaining.total_cmp(&a.remaining));
    for usage in usages.iter_mut() {
        if available <= 0.0 {
            break;
        }
        let amount = usage.remaining.min(available);
        usage.remaining -= amount;
        available -= amount;
        *covered += amount;
    }
    available
}

pub fn oracle_licenses_compliance(
    hosts: &[HostData],
    license_types: &[LicenseType],
    agreements: &[OracleDatabaseAgreement],
) -> Vec<LicenseCompliance> {
    let types: HashMap<&str, &LicenseType> = license_types.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut usages = host_usages(hosts, &types);

    let reported_names: HashMap<&str, &str> = hosts
        .iter()
        .flat_map(|h| h.oracle_databases())
        .flat_map(|db| &db.licenses)
        .map(|l| (l.license_type_id.as_str(), l.name.as_str()))
        .collect();
    let new_compliance = |id: &str| match types.get(id) {
        Some(t) => LicenseCompliance {
            license_type_id: id.to_string(),
            item_description: t.item_description.clone(),
            metric: t.metric.clone(),
            ..Default::default()
        },
        None => LicenseCompliance {
            license_type_id: id.to_string(),
            item_description: reported_names.get(id).map(|n| n.to_string()).unwrap_or_default(),
            ..Default::default()
        },
    };

    let mut licenses: BTreeMap<String, LicenseCompliance> = BTreeMap::new();
    for (id, host_usages) in &usages {
        let license = licenses.entry(id.clone()).or_insert_with(|| new_compliance(id.as_str()));
        license.consumed = host_usages.iter().map(|u| u.consumed).sum();
    }

    let mut catch_all_leftovers: Vec<(&str, f64)> = Vec::new();
    for agreement in agreements {
        let id = agreement.license_type_id.as_str();
        let license = licenses.entry(id.to_string()).or_insert_with(|| new_compliance(id));
        let per_license = multiplier(&license.metric);
        license.purchased += agreement.count * per_license;
        license.unlimited |= agreement.unlimited;

        let available = if agreement.unlimited { f64::INFINITY } else { agreement.count * per_license };
        let host_usages = usages.entry(id.to_string()).or_default();
        let mut associated: Vec<&mut HostUsage> =
            host_usages.iter_mut().filter(|u| agreement.hosts.contains(&u.hostname)).collect();
        let left = cover(&mut associated, available, &mut license.covered);

        if agreement.catch_all && left > 0.0 {
            catch_all_leftovers.push((id, left));
        }
    }

    for (id, available) in catch_all_leftovers {
        if let (Some(license), Some(host_usages)) = (licenses.get_mut(id), usages.get_mut(id)) {
            let mut all: Vec<&mut HostUsage> = host_usages.iter_mut().collect();
            cover(&mut all, available, &mut license.covered);
        }
    }

    licenses
        .into_values()
        .map(|mut license| {
            license.compliance = if license.unlimited || license.consumed == 0.0 { 1.0 } else { license.covered / license.consumed };
            license.available = (license.purchased - license.covered).max(0.0);
            license
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ClusterMembershipStatus, Features, Host, OracleDatabase, OracleDatabaseFeature, OracleDatabaseLicense, OracleFeature,
        METRIC_PROCESSOR_PERPETUAL,
    };

    fn license(id: &str, count: f64) -> OracleDatabaseLicense {
        OracleDatabaseLicense { license_type_id: id.into(), name: format!("name of {}", id), count }
    }

    fn host(name: &str, cores: i64, dbs: Vec<Vec<OracleDatabaseLicense>>) -> HostData {
        HostData {
            hostname: name.into(),
            info: Host { cpu_cores: cores, ..Default::default() },
            features: Features {
                oracle: Some(OracleFeature {
                    database: Some(OracleDatabaseFeature {
                        databases: dbs.into_iter().map(|licenses| OracleDatabase { licenses, ..Default::default() }).collect(),
                    }),
                    exadata: None,
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn types() -> Vec<LicenseType> {
        vec![
            LicenseType {
                id: "A90611".into(),
                item_description: "Oracle Database Enterprise Edition".into(),
                metric: METRIC_PROCESSOR_PERPETUAL.into(),
                ..Default::default()
            },
            LicenseType {
                id: "L10006".into(),
                item_description: "Oracle Partitioning".into(),
                metric: METRIC_NAMED_USER_PLUS_PERPETUAL.into(),
                ..Default::default()
            },
        ]
    }

    fn agreement(license_type_id: &str, count: f64, hosts: &[&str]) -> OracleDatabaseAgreement {
        OracleDatabaseAgreement {
            agreement_id: "AID".into(),
            license_type_id: license_type_id.into(),
            count,
            hosts: hosts.iter().map(|h| h.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn usage_is_the_max_across_databases() {
        let hosts = vec![host("h1", 4, vec![vec![license("A90611", 2.0)], vec![license("A90611", 3.0), license("L10006", 0.0)]])];
        let types = types();
        let index: HashMap<&str, &LicenseType> = types.iter().map(|t| (t.id.as_str(), t)).collect();
        let usages = host_usages(&hosts, &index);
        assert_eq!(usages.len(), 1);
        assert_eq!(usages["A90611"], vec![HostUsage { hostname: "h1".into(), consumed: 3.0, remaining: 3.0 }]);
    }

    #[test]
    fn veritas_cluster_is_counted_once() {
        let members: Vec<String> = vec!["v1".into(), "v2".into(), "v3".into()];
        let cluster = ClusterMembershipStatus { veritas_cluster_server: true, veritas_cluster_hostnames: members, ..Default::default() };
        let mut hosts = vec![
            host("v1", 4, vec![vec![license("A90611", 2.0)]]),
            host("v2", 8, vec![vec![license("A90611", 2.0)]]),
            host("v3", 4, vec![]),
        ];
        for h in hosts.iter_mut() {
            h.cluster_membership_status = cluster.clone();
        }

        let out = oracle_licenses_compliance(&hosts, &types(), &[]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].consumed, 8.0);
        assert_eq!(out[0].compliance, 0.0);
    }

    #[test]
    fn agreements_cover_largest_usage_first_then_catch_all() {
        let hosts = vec![
            host("h1", 4, vec![vec![license("A90611", 2.0)]]),
            host("h2", 4, vec![vec![license("A90611", 5.0)]]),
            host("h3", 4, vec![vec![license("A90611", 1.0)]]),
        ];
        let mut catch_all = agreement("A90611", 3.0, &[]);
        catch_all.catch_all = true;
        let agreements = vec![agreement("A90611", 4.0, &["h1", "h2"]), catch_all];

        let out = oracle_licenses_compliance(&hosts, &types(), &agreements);
        let a = &out[0];
        assert_eq!(a.item_description, "Oracle Database Enterprise Edition");
        assert_eq!(a.consumed, 8.0);
        assert_eq!(a.purchased, 7.0);
        // 4 on h2, then 3 more from the catch-all leftover
        assert_eq!(a.covered, 7.0);
        assert_eq!(a.compliance, 7.0 / 8.0);
        assert_eq!(a.available, 0.0);
    }

    #[test]
    fn named_user_plus_counts_users() {
        let hosts = vec![host("h1", 4, vec![vec![license("L10006", 10.0)]])];
        let agreements = vec![agreement("L10006", 6.0, &["h1"])];

        let out = oracle_licenses_compliance(&hosts, &types(), &agreements);
        assert_eq!(out[0].consumed, 250.0);
        assert_eq!(out[0].purchased, 150.0);
        assert_eq!(out[0].covered, 150.0);
        assert_eq!(out[0].compliance, 0.6);
    }

    #[test]
    fn unlimited_agreement_is_compliant() {
        let hosts = vec![host("h1", 4, vec![vec![license("A90611", 12.0)]])];
        let mut unlimited = agreement("A90611", 0.0, &["h1"]);
        unlimited.unlimited = true;

        let out = oracle_licenses_compliance(&hosts, &types(), &[unlimited]);
        assert!(out[0].unlimited);
        assert_eq!(out[0].covered, 12.0);
        assert_eq!(out[0].compliance, 1.0);
    }

    #[test]
    fn unknown_types_use_the_reported_name() {
        let hosts = vec![host("h1", 4, vec![vec![license("Z00001", 1.0)]])];
        let out = oracle_licenses_compliance(&hosts, &types(), &[agreement("A90611", 2.0, &[])]);
        let ids: Vec<_> = out.iter().map(|l| l.license_type_id.as_str()).collect();
        assert_eq!(ids, vec!["A90611", "Z00001"]);
        assert_eq!(out[0].compliance, 1.0);
        assert_eq!(out[0].available, 2.0);
        assert_eq!(out[1].item_description, "name of Z00001");
    }
}
