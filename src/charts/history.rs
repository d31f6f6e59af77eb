use crate::dto::LicenseComplianceHistory;
use crate::model::LicenseComplianceHistoricValue;
use crate::utils::truncate_to_day;

pub const MYSQL_ENTERPRISE: &str = "MySQL Enterprise";

/// Sorts a history by date and collapses every day to its last entry, dated
/// at midnight UTC.
pub fn sort_and_keep_only_last_entry_of_each_day(
    mut history: Vec<LicenseComplianceHistoricValue>,
) -> Vec<LicenseComplianceHistoricValue> {
    history.sort_by_key(|v| v.date);

    let mut out: Vec<LicenseComplianceHistoricValue> = Vec::with_capacity(history.len());
    for mut entry in history {
        entry.date = truncate_to_day(entry.date);
        match out.last_mut() {
            Some(last) if last.date == entry.date => *last = entry,
            _ => out.push(entry),
        }
    }
    out
}

/// Folds every `MySQL Enterprise ...` history into a single entry appended at
/// the end. Lists without MySQL entries are returned untouched.
pub fn merge_mysql_licenses_compliance(licenses: Vec<LicenseComplianceHistory>) -> Vec<LicenseComplianceHistory> {
    let (mysql, mut out): (Vec<_>, Vec<_>) =
        licenses.into_iter().partition(|l| l.item_description.starts_with(MYSQL_ENTERPRISE));

    if mysql.is_empty() {
        return out;
    }

    let history = mysql
        .into_iter()
        .fold(Vec::new(), |acc, l| merge_license_compliance_historic_values(&acc, &l.history));
    out.push(LicenseComplianceHistory {
        license_type_id: String::new(),
        item_description: MYSQL_ENTERPRISE.to_string(),
        metric: String::new(),
        history,
    });
    out
}

/// Union of two date-sorted histories; values on the same date are summed.
pub fn merge_license_compliance_historic_values(
    a: &[LicenseComplianceHistoricValue],
    b: &[LicenseComplianceHistoricValue],
) -> Vec<LicenseComplianceHistoricValue> {
    let mut out: Vec<LicenseComplianceHistoricValue> = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        let (x, y) = (&a[i], &b[j]);
        if x.date == y.date {
            out.push(LicenseComplianceHistoricValue {
                date: x.date,
                consumed: x.consumed + y.consumed,
                covered: x.covered + y.covered,
                purchased: x.purchased + y.purchased,
            });
            i += 1;
            j += 1;
        } else if x.date < y.date {
            out.push(x.clone());
            i += 1;
        } else {
            out.push(y.clone());
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}
