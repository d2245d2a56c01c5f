// Endpoint templates
//
// Every REST path lives in an `EndpointTable` so deployments can remap
// routes from configuration. Templates use `{name}` placeholders.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A path template such as `/devices/{id}/ping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointTemplate(String);

impl EndpointTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Placeholder names in order of appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.0.as_str();
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else { break };
            names.push(&after[..close]);
            rest = &after[close + 1..];
        }
        names
    }

    /// Substitute each `{name}` with its value.
    ///
    /// # Panics
    ///
    /// Panics if the template contains a placeholder missing from `params`.
    /// Templates loaded from configuration are checked by
    /// [`EndpointTable::validate`], so this only fires on a programming error.
    pub fn fill(&self, params: &[(&str, &str)]) -> String {
        let mut filled = self.0.clone();
        for name in self.placeholders() {
            let Some((_, value)) = params.iter().find(|(key, _)| *key == name) else {
                panic!(
                    "endpoint template '{}' has no value for placeholder '{{{name}}}'",
                    self.0
                );
            };
            filled = filled.replace(&format!("{{{name}}}"), value);
        }
        filled
    }
}

impl From<&str> for EndpointTemplate {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// All REST routes, relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointTable {
    pub network_stats: EndpointTemplate,
    pub bandwidth_usage: EndpointTemplate,
    pub system_health: EndpointTemplate,
    pub devices: EndpointTemplate,
    pub device: EndpointTemplate,
    pub device_scan: EndpointTemplate,
    pub device_ping: EndpointTemplate,
    pub device_trace: EndpointTemplate,
    pub events: EndpointTemplate,
    pub events_export: EndpointTemplate,
    pub security_alerts: EndpointTemplate,
    pub alert_acknowledge: EndpointTemplate,
    pub security_logs: EndpointTemplate,
    pub traffic_realtime: EndpointTemplate,
    pub traffic_historical: EndpointTemplate,
    pub traffic_by_device: EndpointTemplate,
    pub topology: EndpointTemplate,
    pub network_map: EndpointTemplate,
    pub dashboard_config: EndpointTemplate,
    pub user_preferences: EndpointTemplate,
    pub health: EndpointTemplate,
}

impl Default for EndpointTable {
    fn default() -> Self {
        Self {
            network_stats: "/metrics/network".into(),
            bandwidth_usage: "/metrics/bandwidth".into(),
            system_health: "/metrics/system".into(),
            devices: "/devices".into(),
            device: "/devices/{id}".into(),
            device_scan: "/devices/scan".into(),
            device_ping: "/devices/{id}/ping".into(),
            device_trace: "/devices/{id}/trace".into(),
            events: "/events".into(),
            events_export: "/events/export".into(),
            security_alerts: "/security/alerts".into(),
            alert_acknowledge: "/security/alerts/{id}/acknowledge".into(),
            security_logs: "/security/logs".into(),
            traffic_realtime: "/traffic/realtime".into(),
            traffic_historical: "/traffic/historical".into(),
            traffic_by_device: "/traffic/device/{id}".into(),
            topology: "/network/topology".into(),
            network_map: "/network/map".into(),
            dashboard_config: "/config/dashboard".into(),
            user_preferences: "/config/user".into(),
            health: "/health".into(),
        }
    }
}

impl EndpointTable {
    /// Every template with its name and the placeholders it is filled with.
    fn entries(&self) -> [(&'static str, &EndpointTemplate, &'static [&'static str]); 21] {
        const NONE: &[&str] = &[];
        const ID: &[&str] = &["id"];
        [
            ("network_stats", &self.network_stats, NONE),
            ("bandwidth_usage", &self.bandwidth_usage, NONE),
            ("system_health", &self.system_health, NONE),
            ("devices", &self.devices, NONE),
            ("device", &self.device, ID),
            ("device_scan", &self.device_scan, NONE),
            ("device_ping", &self.device_ping, ID),
            ("device_trace", &self.device_trace, ID),
            ("events", &self.events, NONE),
            ("events_export", &self.events_export, NONE),
            ("security_alerts", &self.security_alerts, NONE),
            ("alert_acknowledge", &self.alert_acknowledge, ID),
            ("security_logs", &self.security_logs, NONE),
            ("traffic_realtime", &self.traffic_realtime, NONE),
            ("traffic_historical", &self.traffic_historical, NONE),
            ("traffic_by_device", &self.traffic_by_device, ID),
            ("topology", &self.topology, NONE),
            ("network_map", &self.network_map, NONE),
            ("dashboard_config", &self.dashboard_config, NONE),
            ("user_preferences", &self.user_preferences, NONE),
            ("health", &self.health, NONE),
        ]
    }

    /// Check that every template is an absolute path using exactly the
    /// placeholders its endpoint supplies.
    pub fn validate(&self) -> Result<(), Error> {
        for (name, template, expected) in self.entries() {
            let invalid = |reason: String| Error::InvalidTemplate {
                name: name.into(),
                template: template.as_str().into(),
                reason,
            };

            if !template.as_str().starts_with('/') {
                return Err(invalid("must start with '/'".into()));
            }

            let found = template.placeholders();
            if let Some(unknown) = found.iter().find(|p| !expected.contains(*p)) {
                return Err(invalid(format!("unknown placeholder '{{{unknown}}}'")));
            }
            if let Some(missing) = expected.iter().find(|p| !found.contains(*p)) {
                return Err(invalid(format!("missing placeholder '{{{missing}}}'")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fill_substitutes_placeholders() {
        let template = EndpointTemplate::new("/devices/{id}/ping");
        assert_eq!(template.fill(&[("id", "dev-7")]), "/devices/dev-7/ping");
    }

    #[test]
    fn fill_ignores_extra_params() {
        let template = EndpointTemplate::new("/health");
        assert_eq!(template.fill(&[("id", "x")]), "/health");
    }

    #[test]
    #[should_panic(expected = "no value for placeholder '{id}'")]
    fn fill_panics_on_unfilled_placeholder() {
        EndpointTemplate::new("/devices/{id}").fill(&[]);
    }

    #[test]
    fn placeholders_in_order() {
        let template = EndpointTemplate::new("/a/{site}/b/{id}");
        assert_eq!(template.placeholders(), vec!["site", "id"]);
    }

    #[test]
    fn default_table_is_valid() {
        assert!(EndpointTable::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_unknown_placeholder() {
        let table = EndpointTable {
            devices: "/sites/{site}/devices".into(),
            ..EndpointTable::default()
        };
        let err = table.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate { ref name, .. } if name == "devices"));
    }

    #[test]
    fn validate_rejects_missing_placeholder() {
        let table = EndpointTable {
            device_ping: "/devices/ping".into(),
            ..EndpointTable::default()
        };
        assert!(table.validate().is_err());
    }
}
