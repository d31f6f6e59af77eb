use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

const PALETTE: [&str; 12] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f", "#bcbd22", "#17becf", "#393b79", "#ad494a",
];

/// Picks a palette color for a bubble. The same name always gets the same
/// color so that charts stay stable across refreshes.
pub fn colorize(name: &str) -> String {
    // FNV-1a
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in name.bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    PALETTE[(hash % PALETTE.len() as u64) as usize].to_string()
}

pub fn size_legend(description: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("size".to_string(), description.to_string())])
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBubble {
    pub name: String,
    pub size: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub data: Vec<ChartBubble>,
    pub legend: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeChartBubble {
    pub name: String,
    pub size: f64,
    pub change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeChart {
    pub data: Vec<ChangeChartBubble>,
    pub legend: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnologyTypeChartBubble {
    pub name: String,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyTypesChart {
    pub operating_systems: Vec<TechnologyTypeChartBubble>,
    pub databases: Vec<TechnologyTypeChartBubble>,
    pub middlewares: Vec<TechnologyTypeChartBubble>,
    pub legend: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostCores {
    pub date: DateTime<Utc>,
    pub cores: i64,
}
