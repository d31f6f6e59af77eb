use std::collections::{HashMap, HashSet};

use crate::dto::LicenseCompliance;
use crate::model::{HostData, MySqlContract, MYSQL_CONTRACT_TYPE_CLUSTER, MYSQL_CONTRACT_TYPE_HOST, MYSQL_EDITION_ENTERPRISE};

pub const MYSQL_ENTERPRISE_PER_HOST: &str = "MySQL Enterprise per host";
pub const MYSQL_ENTERPRISE_PER_CLUSTER: &str = "MySQL Enterprise per cluster";

/// Hypervisor clusters each hostname runs in, as reported by the cluster
/// hosts themselves.
fn clusters_by_vm(hosts: &[HostData]) -> HashMap<&str, HashSet<&str>> {
    let mut out: HashMap<&str, HashSet<&str>> = HashMap::new();
    for cluster in hosts.iter().flat_map(|h| &h.clusters) {
        for vm in &cluster.vms {
            out.entry(vm.hostname.as_str()).or_default().insert(cluster.name.as_str());
        }
    }
    out
}

fn finish(item_description: &str, consumed: f64, covered: f64, purchased: f64) -> LicenseCompliance {
    LicenseCompliance {
        license_type_id: String::new(),
        item_description: item_description.to_string(),
        metric: String::new(),
        consumed,
        covered,
        purchased,
        compliance: if consumed == 0.0 { 1.0 } else { covered / consumed },
        unlimited: false,
        available: (purchased - covered).max(0.0),
    }
}

pub fn mysql_licenses_compliance(hosts: &[HostData], contracts: &[MySqlContract]) -> Vec<LicenseCompliance> {
    let clusters_by_vm = clusters_by_vm(hosts);
    let licensed_clusters: HashSet<&str> = contracts
        .iter()
        .filter(|c| c.r#type == MYSQL_CONTRACT_TYPE_CLUSTER)
        .flat_map(|c| c.clusters.iter().map(String::as_str))
        .collect();
    let host_contracts: Vec<&MySqlContract> = contracts.iter().filter(|c| c.r#type == MYSQL_CONTRACT_TYPE_HOST).collect();
    let mut host_contract_left: Vec<f64> = host_contracts.iter().map(|c| c.number_of_licenses).collect();

    let (mut per_host, mut per_cluster) = ((0.0, 0.0), (0.0, 0.0));
    for host in hosts {
        let enterprise = host.mysql_instances().iter().filter(|i| i.edition == MYSQL_EDITION_ENTERPRISE).count();
        if enterprise == 0 {
            continue;
        }
        let enterprise = enterprise as f64;

        let in_licensed_cluster = clusters_by_vm
            .get(host.hostname.as_str())
            .is_some_and(|clusters| clusters.iter().any(|c| licensed_clusters.contains(c)));
        if in_licensed_cluster {
            per_cluster.0 += enterprise;
            per_cluster.1 += enterprise;
            continue;
        }

        per_host.0 += enterprise;
        let mut uncovered = enterprise;
        for (contract, left) in host_contracts.iter().zip(host_contract_left.iter_mut()) {
            if uncovered <= 0.0 {
                break;
            }
            if contract.hosts.contains(&host.hostname) {
                let amount = uncovered.min(*left);
                *left -= amount;
                uncovered -= amount;
                per_host.1 += amount;
            }
        }
    }

    let purchased = |kind: &str| contracts.iter().filter(|c| c.r#type == kind).map(|c| c.number_of_licenses).sum::<f64>();
    let mut out = Vec::new();
    for (description, (consumed, covered), kind) in [
        (MYSQL_ENTERPRISE_PER_HOST, per_host, MYSQL_CONTRACT_TYPE_HOST),
        (MYSQL_ENTERPRISE_PER_CLUSTER, per_cluster, MYSQL_CONTRACT_TYPE_CLUSTER),
    ] {
        let total = purchased(kind);
        if consumed > 0.0 || total > 0.0 {
            out.push(finish(description, consumed, covered, total));
        }
    }
    out
}
