use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Raw query string parameters shared by list and chart endpoints.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FilterQuery {
    pub location: Option<String>,
    pub environment: Option<String>,
    #[serde(rename = "older-than")]
    pub older_than: Option<String>,
    #[serde(rename = "newer-than")]
    pub newer_than: Option<String>,
}

/// Location/environment/age filter applied to stored host snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalFilter {
    /// Comma separated list of accepted locations, empty means any.
    pub location: String,
    pub environment: String,
    pub older_than: DateTime<Utc>,
}

impl Default for GlobalFilter {
    fn default() -> Self {
        Self { location: String::new(), environment: String::new(), older_than: super::max_time() }
    }
}

impl GlobalFilter {
    /// Whether the filter selects the current (non archived) snapshots.
    pub fn is_current(&self) -> bool {
        self.older_than == super::max_time()
    }

    pub fn matches(&self, location: &str, environment: &str) -> bool {
        let location_ok = self.location.is_empty()
            || self.location.split(',').map(str::trim).any(|l| l == location);
        let environment_ok = self.environment.is_empty() || self.environment == environment;
        location_ok && environment_ok
    }
}

impl FilterQuery {
    pub fn global_filter(&self) -> AppResult<GlobalFilter> {
        Ok(GlobalFilter {
            location: self.location.clone().unwrap_or_default(),
            environment: self.environment.clone().unwrap_or_default(),
            older_than: parse_time_param(self.older_than.as_deref(), "older-than", super::max_time())?,
        })
    }

    pub fn newer_than(&self) -> AppResult<DateTime<Utc>> {
        parse_time_param(self.newer_than.as_deref(), "newer-than", super::min_time())
    }
}

/// Parses an RFC 3339 query parameter. Missing or empty values yield `default`,
/// malformed values are reported as 422.
pub fn parse_time_param(raw: Option<&str>, name: &str, default: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| AppError::unprocessable("UNPROCESSABLE_ENTITY", format!("Unable to parse {}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        let f = GlobalFilter::default();
        assert!(f.is_current());
        assert!(f.matches("Italy", "PROD"));
    }

    #[test]
    fn location_list_and_environment() {
        let f = GlobalFilter { location: "Italy, Germany".into(), environment: "PROD".into(), ..Default::default() };
        assert!(f.matches("Germany", "PROD"));
        assert!(!f.matches("France", "PROD"));
        assert!(!f.matches("Italy", "TST"));
    }

    #[test]
    fn bad_time_is_unprocessable() {
        let q = FilterQuery { older_than: Some("yesterday".into()), ..Default::default() };
        let err = q.global_filter().unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);

        let q = FilterQuery { older_than: Some("2020-04-10T08:46:58Z".into()), ..Default::default() };
        assert!(!q.global_filter().unwrap().is_current());
    }
}
