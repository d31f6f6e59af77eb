use std::collections::BTreeMap;

use crate::dto::{colorize, size_legend, Chart, ChartBubble};
use crate::error::{AppError, AppResult};
use crate::model::HostData;

pub const METRIC_VERSION: &str = "version";
pub const METRIC_WORK: &str = "work";

/// Chart of the Oracle databases found on `hosts`, either counted by version
/// or sized by their work value.
pub fn oracle_database_chart(metric: &str, hosts: &[HostData]) -> AppResult<Chart> {
    match metric {
        METRIC_VERSION => {
            let mut by_version: BTreeMap<&str, f64> = BTreeMap::new();
            for db in hosts.iter().flat_map(|h| h.oracle_databases()) {
                *by_version.entry(db.version.as_str()).or_default() += 1.0;
            }
            let data = by_version
                .into_iter()
                .map(|(version, size)| ChartBubble { name: version.to_string(), size, color: colorize(version) })
                .collect();
            Ok(Chart { data, legend: size_legend("Number of occurrences") })
        }
        METRIC_WORK => {
            let mut data: Vec<ChartBubble> = hosts
                .iter()
                .flat_map(|h| h.oracle_databases().iter().map(move |db| (h, db)))
                .filter_map(|(h, db)| {
                    let work = db.work?;
                    let name = format!("{}/{}", h.hostname, db.name);
                    let color = colorize(&name);
                    Some(ChartBubble { name, size: work, color })
                })
                .collect();
            data.sort_by(|a, b| b.size.total_cmp(&a.size).then_with(|| a.name.cmp(&b.name)));
            Ok(Chart { data, legend: size_legend("Value of work") })
        }
        other => Err(AppError::unprocessable("UNSUPPORTED_METRIC", format!("Unsupported metric: {}", other))),
    }
}
