// ── Event and alert domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::ids::{AlertId, EventId};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    #[default]
    #[strum(to_string = "info", serialize = "low")]
    Info,
    #[strum(to_string = "warning", serialize = "warn", serialize = "medium")]
    Warning,
    #[strum(to_string = "critical", serialize = "error", serialize = "high")]
    Critical,
}

impl Severity {
    /// Parse a wire severity. Anything unrecognised is `Info`.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.trim().parse().unwrap_or_default()
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EventStatus {
    #[default]
    Active,
    Monitoring,
    Resolved,
}

/// An entry in the network event log. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: DateTime<Utc>,
    /// Free-form category from the backend (`"Connection"`, `"Status Change"`, ...).
    pub category: String,
    /// Address of the device the event concerns.
    pub device: Option<String>,
    pub description: String,
    pub severity: Severity,
    pub status: EventStatus,
}

/// An event before the store has given it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub id: Option<EventId>,
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub device: Option<String>,
    pub description: String,
    pub severity: Severity,
    pub status: EventStatus,
}

impl EventDraft {
    /// A new active event stamped now.
    pub fn new(category: impl Into<String>, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: None,
            timestamp: Utc::now(),
            category: category.into(),
            device: None,
            description: description.into(),
            severity,
            status: EventStatus::Active,
        }
    }

    pub fn with_device(mut self, device: Option<String>) -> Self {
        self.device = device;
        self
    }

    pub(crate) fn finish(self, id: EventId) -> Event {
        Event {
            id,
            timestamp: self.timestamp,
            category: self.category,
            device: self.device,
            description: self.description,
            severity: self.severity,
            status: self.status,
        }
    }
}

/// A security alert. Acknowledging replaces the stored copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityAlert {
    pub id: AlertId,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub source: Option<String>,
    pub severity: Severity,
    pub acknowledged: bool,
}

/// An alert before the store has given it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub id: Option<AlertId>,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub source: Option<String>,
    pub severity: Severity,
    pub acknowledged: bool,
}

impl AlertDraft {
    pub(crate) fn finish(self, id: AlertId) -> SecurityAlert {
        SecurityAlert {
            id,
            timestamp: self.timestamp,
            description: self.description,
            source: self.source,
            severity: self.severity,
            acknowledged: self.acknowledged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_aliases() {
        assert_eq!(Severity::parse_lenient("high"), Severity::Critical);
        assert_eq!(Severity::parse_lenient("WARN"), Severity::Warning);
        assert_eq!(Severity::parse_lenient("whatever"), Severity::Info);
        assert_eq!(Severity::Critical.to_string(), "critical");
        assert!(Severity::Critical > Severity::Warning);
    }
}
