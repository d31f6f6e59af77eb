use std::collections::BTreeMap;

use regex::Regex;

use crate::config::OperatingSystemAggregationRule;
use crate::dto::{size_legend, ChangeChart, ChangeChartBubble, TechnologyTypeChartBubble, TechnologyTypesChart};
use crate::model::{self, HostData};

/// Maps `"{os} {os_version}"` strings onto the configured operating system
/// products.
#[derive(Debug, Clone)]
pub struct OsClassifier {
    rules: Vec<(Regex, String)>,
}

impl OsClassifier {
    pub fn new(rules: &[OperatingSystemAggregationRule]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|r| Ok((Regex::new(&r.regex)?, r.product.clone())))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Configured products, first occurrence order, without duplicates.
    pub fn products(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for (_, product) in &self.rules {
            if !out.contains(&product.as_str()) {
                out.push(product);
            }
        }
        out
    }

    /// Products whose rules match the host operating system. Several rules may
    /// match the same host; each product is reported once.
    pub fn classify(&self, host: &HostData) -> Vec<&str> {
        let os = format!("{} {}", host.info.os, host.info.os_version);
        let mut out: Vec<&str> = Vec::new();
        for (re, product) in &self.rules {
            if re.is_match(&os) && !out.contains(&product.as_str()) {
                out.push(product);
            }
        }
        out
    }
}

/// Counts operating systems and database technologies over a set of host
/// snapshots. Technologies absent from every host are left out of the map.
pub fn technology_count(hosts: &[HostData], classifier: &OsClassifier) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<String, f64> = BTreeMap::new();
    let mut add = |technology: &str, n: usize| {
        if n > 0 {
            *counts.entry(technology.to_string()).or_default() += n as f64;
        }
    };

    for host in hosts {
        let products = classifier.classify(host);
        if products.is_empty() {
            add(model::TECHNOLOGY_UNKNOWN_OPERATING_SYSTEM, 1);
        }
        for product in products {
            add(product, 1);
        }

        add(model::TECHNOLOGY_ORACLE_DATABASE, host.oracle_databases().len());
        add(model::TECHNOLOGY_ORACLE_MYSQL, host.mysql_instances().len());
        add(model::TECHNOLOGY_MICROSOFT_SQLSERVER, host.sql_server_instances().len());
        add(model::TECHNOLOGY_POSTGRESQL, host.postgresql_instances().len());
        add(model::TECHNOLOGY_MONGODB, host.mongodb_instances().len());
    }

    counts
}

pub fn technology_types_chart(counts: &BTreeMap<String, f64>, classifier: &OsClassifier) -> TechnologyTypesChart {
    let bubble = |name: &str| {
        counts
            .get(name)
            .filter(|size| **size > 0.0)
            .map(|size| TechnologyTypeChartBubble { name: name.to_string(), size: *size })
    };

    let databases = model::DATABASE_TECHNOLOGIES.iter().filter_map(|t| bubble(t)).collect();
    let mut operating_systems: Vec<_> = classifier.products().into_iter().filter_map(bubble).collect();
    operating_systems.extend(bubble(model::TECHNOLOGY_UNKNOWN_OPERATING_SYSTEM));

    TechnologyTypesChart {
        operating_systems,
        databases,
        middlewares: Vec::new(),
        legend: size_legend("Number of occurrences"),
    }
}

/// Relative change of every technology still present in `new`.
pub fn change_chart(old: &BTreeMap<String, f64>, new: &BTreeMap<String, f64>) -> ChangeChart {
    let data = new
        .iter()
        .filter(|(_, size)| **size > 0.0)
        .map(|(name, size)| {
            let before = old.get(name).copied().unwrap_or(0.0);
            let change = if before == 0.0 { 0.0 } else { size / before - 1.0 };
            ChangeChartBubble { name: name.clone(), size: *size, change }
        })
        .collect();

    ChangeChart { data, legend: size_legend("Number of occurrences") }
}
