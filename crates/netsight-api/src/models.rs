// Wire types for REST responses and WebSocket push payloads.
//
// Field names follow the backend, with aliases for the alternative
// spellings it is known to emit (`ip` / `ip_address`, `type` /
// `device_type`, ...). Numeric fields are parsed leniently because the
// backend mixes numbers and strings like `"12ms"`.

use serde::{Deserialize, Serialize};

// ── Devices ──────────────────────────────────────────────────────────

/// Device record from `GET /devices`, `POST /devices/scan`, or `PUT /devices/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDevice {
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, alias = "ip", skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(default, alias = "name", skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(
        default,
        alias = "ping",
        deserialize_with = "lenient::opt_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub ping_ms: Option<f64>,

    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,

    #[serde(default, alias = "mac", skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,

    #[serde(default, alias = "manufacturer", skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// A list response that is either a bare array or wrapped in an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Items(Vec<T>),
    Devices { devices: Vec<T> },
    Events { events: Vec<T> },
    Alerts { alerts: Vec<T> },
    Data { data: Vec<T> },
}

impl<T> Listing<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Items(items)
            | Self::Devices { devices: items }
            | Self::Events { events: items }
            | Self::Alerts { alerts: items }
            | Self::Data { data: items } => items,
        }
    }
}

/// Response of `POST /devices/{id}/ping`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PingResult {
    #[serde(
        default,
        alias = "ping",
        alias = "ping_ms",
        alias = "time",
        deserialize_with = "lenient::opt_f64"
    )]
    pub latency_ms: Option<f64>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default, alias = "success")]
    pub reachable: Option<bool>,
}

// ── Events & alerts ──────────────────────────────────────────────────

/// Event from `GET /events` or the `network-events` push channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    #[serde(default, alias = "device", skip_serializing_if = "Option::is_none")]
    pub device_ip: Option<String>,

    #[serde(default, alias = "message", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, alias = "level", skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Alert from `GET /security/alerts` or the `security-alerts` push channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAlert {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub timestamp: Option<String>,

    #[serde(default, alias = "message")]
    pub description: Option<String>,

    #[serde(default, alias = "source", alias = "ip")]
    pub source_ip: Option<String>,

    #[serde(default, alias = "level")]
    pub severity: Option<String>,

    #[serde(default)]
    pub acknowledged: bool,
}

// ── Metrics ──────────────────────────────────────────────────────────

/// One headline figure: `{ percentage | current | total | active, change }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGauge {
    #[serde(
        default,
        alias = "percentage",
        alias = "current",
        alias = "total",
        alias = "active",
        deserialize_with = "lenient::opt_f64"
    )]
    pub value: Option<f64>,

    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub change: Option<f64>,
}

/// `GET /metrics/network` and the `network` half of a `network-metrics` push.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNetworkStats {
    #[serde(default)]
    pub uptime: Option<RawGauge>,
    #[serde(default)]
    pub bandwidth: Option<RawGauge>,
    #[serde(default)]
    pub devices: Option<RawGauge>,
    #[serde(default)]
    pub alerts: Option<RawGauge>,
}

/// `GET /metrics/system` and the `system-health` push channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSystemHealth {
    #[serde(default, alias = "cpu", deserialize_with = "lenient::opt_f64")]
    pub cpu_usage: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub cpu_change: Option<f64>,
    #[serde(default, alias = "memory", deserialize_with = "lenient::opt_f64")]
    pub memory_usage: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub memory_change: Option<f64>,
    #[serde(default, alias = "disk", deserialize_with = "lenient::opt_f64")]
    pub disk_usage: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub disk_change: Option<f64>,
}

// ── Traffic ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTrafficPoint {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub upload: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub download: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTrafficHistory {
    #[serde(default)]
    pub upload: Vec<f64>,
    #[serde(default)]
    pub download: Vec<f64>,
    #[serde(default)]
    pub timestamps: Option<Vec<String>>,
}

/// `GET /traffic/realtime` and `GET /traffic/historical`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTraffic {
    #[serde(default)]
    pub realtime: Option<RawTrafficPoint>,
    #[serde(default)]
    pub historical: Option<RawTrafficHistory>,
}

// ── Push payloads ────────────────────────────────────────────────────

/// `network-metrics` push payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetricsPush {
    #[serde(default)]
    pub network: Option<RawNetworkStats>,
    #[serde(default)]
    pub system: Option<RawSystemHealth>,
}

/// `device-status` push payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatusPush {
    #[serde(default, alias = "id", deserialize_with = "lenient::opt_string")]
    pub device_id: Option<String>,

    #[serde(default, alias = "ip", alias = "ip_address")]
    pub device_ip: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default, alias = "ping_ms", deserialize_with = "lenient::opt_f64")]
    pub ping: Option<f64>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub uptime: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub timestamp: Option<String>,

    #[serde(default)]
    pub status_changed: bool,
}

/// `device-discovered` push payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DiscoveryPush {
    #[serde(default, alias = "id", deserialize_with = "lenient::opt_string")]
    pub device_id: Option<String>,

    #[serde(default, alias = "hostname")]
    pub name: Option<String>,

    #[serde(default, alias = "ip_address")]
    pub ip: Option<String>,

    #[serde(default, alias = "mac_address")]
    pub mac: Option<String>,

    #[serde(default, rename = "type", alias = "device_type")]
    pub device_type: Option<String>,

    #[serde(default, alias = "vendor")]
    pub manufacturer: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default, alias = "ping_ms", deserialize_with = "lenient::opt_f64")]
    pub ping: Option<f64>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub uptime: Option<String>,
}

/// `device-removed` push payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemovalPush {
    #[serde(default, alias = "id", deserialize_with = "lenient::opt_string")]
    pub device_id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

// ── Lenient field parsers ────────────────────────────────────────────

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Accept a string, number, or bool as a string.
    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }

    /// Accept a number or a numeric string with a unit suffix (`"12ms"`, `"+2.1%"`).
    /// Anything unparseable (`"N/A"`) becomes `None`.
    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => parse_numeric_prefix(&s),
            _ => None,
        })
    }

    pub(super) fn parse_numeric_prefix(raw: &str) -> Option<f64> {
        let trimmed = raw.trim().trim_start_matches('+');
        let end = trimmed
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (c == '-' && i == 0)))
            .map_or(trimmed.len(), |(i, _)| i);
        trimmed.get(..end)?.parse().ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn device_accepts_alternate_field_names() {
        let device: RawDevice = serde_json::from_value(json!({
            "id": 17,
            "ip": "192.168.1.20",
            "name": "printer-2f",
            "type": "printer",
            "status": "online",
            "ping": "4ms",
            "mac": "AA-BB-CC-DD-EE-FF",
            "manufacturer": "HP"
        }))
        .unwrap();

        assert_eq!(device.id.as_deref(), Some("17"));
        assert_eq!(device.ip_address.as_deref(), Some("192.168.1.20"));
        assert_eq!(device.hostname.as_deref(), Some("printer-2f"));
        assert_eq!(device.device_type.as_deref(), Some("printer"));
        assert_eq!(device.ping_ms, Some(4.0));
        assert_eq!(device.vendor.as_deref(), Some("HP"));
    }

    #[test]
    fn unparseable_latency_is_absent() {
        let device: RawDevice =
            serde_json::from_value(json!({ "ip_address": "10.0.0.9", "ping_ms": "N/A" })).unwrap();
        assert_eq!(device.ping_ms, None);
    }

    #[test]
    fn numeric_prefix_parsing() {
        assert_eq!(lenient::parse_numeric_prefix("12.5 ms"), Some(12.5));
        assert_eq!(lenient::parse_numeric_prefix("+2.1%"), Some(2.1));
        assert_eq!(lenient::parse_numeric_prefix("-0.3"), Some(-0.3));
        assert_eq!(lenient::parse_numeric_prefix("N/A"), None);
    }

    #[test]
    fn listing_accepts_bare_and_wrapped_arrays() {
        let bare: Listing<RawDevice> =
            serde_json::from_value(json!([{ "ip": "10.0.0.1" }])).unwrap();
        let wrapped: Listing<RawDevice> =
            serde_json::from_value(json!({ "devices": [{ "ip": "10.0.0.1" }, { "ip": "10.0.0.2" }] }))
                .unwrap();

        assert_eq!(bare.into_items().len(), 1);
        assert_eq!(wrapped.into_items().len(), 2);
    }

    #[test]
    fn network_stats_gauges_use_their_own_value_key() {
        let stats: RawNetworkStats = serde_json::from_value(json!({
            "uptime": { "percentage": 99.9, "change": 0.1 },
            "bandwidth": { "current": 847, "change": -5.1 },
            "devices": { "total": 24, "change": 2 },
            "alerts": { "active": 3, "change": 1 }
        }))
        .unwrap();

        assert_eq!(stats.uptime.unwrap().value, Some(99.9));
        assert_eq!(stats.bandwidth.unwrap().change, Some(-5.1));
        assert_eq!(stats.devices.unwrap().value, Some(24.0));
        assert_eq!(stats.alerts.unwrap().value, Some(3.0));
    }

    #[test]
    fn event_push_uses_short_field_names() {
        let event: RawEvent = serde_json::from_value(json!({
            "type": "Connection",
            "device": "192.168.1.15",
            "description": "New device connected",
            "severity": "info"
        }))
        .unwrap();

        assert!(event.id.is_none());
        assert_eq!(event.event_type.as_deref(), Some("Connection"));
        assert_eq!(event.device_ip.as_deref(), Some("192.168.1.15"));
    }
}
