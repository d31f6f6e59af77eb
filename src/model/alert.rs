use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCategory {
    Agent,
    Engine,
    License,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCode {
    NewServer,
    NewDatabase,
    NewLicense,
    NewOption,
    MissingDatabase,
    AgentError,
    NoData,
}

impl AlertCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCode::NewServer => "NEW_SERVER",
            AlertCode::NewDatabase => "NEW_DATABASE",
            AlertCode::NewLicense => "NEW_LICENSE",
            AlertCode::NewOption => "NEW_OPTION",
            AlertCode::MissingDatabase => "MISSING_DATABASE",
            AlertCode::AgentError => "AGENT_ERROR",
            AlertCode::NoData => "NO_DATA",
        }
    }
}

/// Ordered from the least to the most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "INFO",
            AlertSeverity::Warning => "WARNING",
            AlertSeverity::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    New,
    Ack,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::New => "NEW",
            AlertStatus::Ack => "ACK",
        }
    }
}

/// Something about the inventory a user should look at, e.g. a database
/// that started using a new license.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub alert_category: AlertCategory,
    pub alert_affected_technology: Option<String>,
    pub alert_code: AlertCode,
    pub alert_severity: AlertSeverity,
    pub alert_status: AlertStatus,
    pub description: String,
    pub date: DateTime<Utc>,
    /// Context of the alert; `hostname` is always present.
    pub other_info: Map<String, Value>,
}

impl Alert {
    pub fn new(
        category: AlertCategory,
        code: AlertCode,
        severity: AlertSeverity,
        hostname: &str,
        description: String,
        now: DateTime<Utc>,
    ) -> Self {
        let mut other_info = Map::new();
        other_info.insert("hostname".into(), Value::from(hostname));
        Self {
            id: Uuid::new_v4().to_string(),
            alert_category: category,
            alert_affected_technology: None,
            alert_code: code,
            alert_severity: severity,
            alert_status: AlertStatus::New,
            description,
            date: now,
            other_info,
        }
    }

    pub fn with_technology(mut self, technology: &str) -> Self {
        self.alert_affected_technology = Some(technology.to_string());
        self
    }

    pub fn with_info(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.other_info.insert(key.to_string(), value.into());
        self
    }

    pub fn hostname(&self) -> &str {
        self.other_info.get("hostname").and_then(Value::as_str).unwrap_or_default()
    }
}
