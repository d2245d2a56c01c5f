// ── API-to-domain type conversions ──
//
// Bridges raw `netsight_api::models` wire types into canonical
// `netsight_core::model` domain types. Unknown enum strings are dropped,
// timestamps are parsed leniently, and missing figures become zero.

use chrono::{DateTime, TimeDelta, Utc};

use netsight_api::models::{
    DiscoveryPush, RawAlert, RawDevice, RawEvent, RawGauge, RawNetworkStats, RawSystemHealth,
    RawTrafficHistory, RawTrafficPoint, StatusPush,
};

use crate::model::{
    AlertDraft, AlertId, CurrentTraffic, DeviceId, DeviceKind, DeviceStatus, DeviceUpdate,
    EventDraft, EventId, EventStatus, MacAddress, NetworkStats, Severity, SystemHealth,
    TrafficSample,
};

/// Spacing, in seconds, assumed between historical traffic points that
/// arrive without timestamps.
const HISTORY_STEP_SECS: i64 = 60;

// ── Helpers ────────────────────────────────────────────────────────

/// Parse an RFC 3339 string or an epoch value (seconds or milliseconds).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let epoch: i64 = raw.parse().ok()?;
    // Anything past the year 2286 in seconds is treated as milliseconds.
    if epoch > 9_999_999_999 {
        DateTime::from_timestamp_millis(epoch)
    } else {
        DateTime::from_timestamp(epoch, 0)
    }
}

fn timestamp_or_now(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(parse_timestamp).unwrap_or_else(Utc::now)
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

fn parse_status(raw: Option<&str>) -> Option<DeviceStatus> {
    raw.and_then(|s| s.trim().parse().ok())
}

fn gauge(g: Option<&RawGauge>) -> (f64, f64) {
    g.map_or((0.0, 0.0), |g| {
        (g.value.unwrap_or_default(), g.change.unwrap_or_default())
    })
}

// ── Devices ────────────────────────────────────────────────────────

impl From<RawDevice> for DeviceUpdate {
    fn from(raw: RawDevice) -> Self {
        Self {
            id: non_empty(raw.id).map(DeviceId::from),
            address: non_empty(raw.ip_address),
            mac: non_empty(raw.mac_address).map(MacAddress::new),
            name: non_empty(raw.hostname),
            kind: raw.device_type.as_deref().map(DeviceKind::parse_lenient),
            status: parse_status(raw.status.as_deref()),
            latency_ms: raw.ping_ms,
            last_seen: raw.last_seen.as_deref().and_then(parse_timestamp),
            uptime: non_empty(raw.uptime),
            manufacturer: non_empty(raw.vendor),
            location: non_empty(raw.location),
            group: non_empty(raw.group),
        }
    }
}

impl From<&DeviceUpdate> for RawDevice {
    fn from(update: &DeviceUpdate) -> Self {
        Self {
            id: update.id.as_ref().map(ToString::to_string),
            ip_address: update.address.clone(),
            hostname: update.name.clone(),
            device_type: update.kind.map(|k| k.to_string()),
            status: update.status.map(|s| s.to_string()),
            ping_ms: update.latency_ms,
            uptime: update.uptime.clone(),
            last_seen: update.last_seen.map(|t| t.to_rfc3339()),
            mac_address: update.mac.as_ref().map(ToString::to_string),
            vendor: update.manufacturer.clone(),
            location: update.location.clone(),
            group: update.group.clone(),
        }
    }
}

/// A `device-status` push becomes a merge with `last_seen` stamped.
impl From<&StatusPush> for DeviceUpdate {
    fn from(push: &StatusPush) -> Self {
        Self {
            id: non_empty(push.device_id.clone()).map(DeviceId::from),
            address: non_empty(push.device_ip.clone()),
            status: parse_status(push.status.as_deref()),
            latency_ms: push.ping,
            uptime: non_empty(push.uptime.clone()),
            last_seen: Some(timestamp_or_now(push.timestamp.as_deref())),
            ..Self::default()
        }
    }
}

/// A `device-discovered` push. Status defaults to online and the group to
/// `"guest"`.
impl From<DiscoveryPush> for DeviceUpdate {
    fn from(push: DiscoveryPush) -> Self {
        Self {
            id: non_empty(push.device_id).map(DeviceId::from),
            address: non_empty(push.ip),
            mac: non_empty(push.mac).map(MacAddress::new),
            name: non_empty(push.name),
            kind: push.device_type.as_deref().map(DeviceKind::parse_lenient),
            status: parse_status(push.status.as_deref()),
            latency_ms: push.ping,
            last_seen: Some(Utc::now()),
            uptime: non_empty(push.uptime),
            manufacturer: non_empty(push.manufacturer),
            location: None,
            group: None,
        }
    }
}

// ── Events & alerts ────────────────────────────────────────────────

impl From<RawEvent> for EventDraft {
    fn from(raw: RawEvent) -> Self {
        Self {
            id: non_empty(raw.id).map(EventId::from),
            timestamp: timestamp_or_now(raw.timestamp.as_deref()),
            category: non_empty(raw.event_type).unwrap_or_else(|| "Event".into()),
            device: non_empty(raw.device_ip),
            description: raw.description.unwrap_or_default(),
            severity: raw
                .severity
                .as_deref()
                .map(Severity::parse_lenient)
                .unwrap_or_default(),
            status: raw
                .status
                .as_deref()
                .and_then(|s| s.trim().parse::<EventStatus>().ok())
                .unwrap_or_default(),
        }
    }
}

impl From<RawAlert> for AlertDraft {
    fn from(raw: RawAlert) -> Self {
        Self {
            id: non_empty(raw.id).map(AlertId::from),
            timestamp: timestamp_or_now(raw.timestamp.as_deref()),
            description: raw.description.unwrap_or_default(),
            source: non_empty(raw.source_ip),
            severity: raw
                .severity
                .as_deref()
                .map(Severity::parse_lenient)
                .unwrap_or_default(),
            acknowledged: raw.acknowledged,
        }
    }
}

// ── Metrics ────────────────────────────────────────────────────────

impl From<&RawNetworkStats> for NetworkStats {
    fn from(raw: &RawNetworkStats) -> Self {
        let (uptime_pct, uptime_change) = gauge(raw.uptime.as_ref());
        let (bandwidth_mbps, bandwidth_change) = gauge(raw.bandwidth.as_ref());
        let (devices_total, devices_change) = gauge(raw.devices.as_ref());
        let (alerts_active, alerts_change) = gauge(raw.alerts.as_ref());
        Self {
            uptime_pct,
            uptime_change,
            bandwidth_mbps,
            bandwidth_change,
            devices_total,
            devices_change,
            alerts_active,
            alerts_change,
        }
    }
}

impl From<&RawSystemHealth> for SystemHealth {
    fn from(raw: &RawSystemHealth) -> Self {
        Self {
            cpu_usage: raw.cpu_usage.unwrap_or_default(),
            cpu_change: raw.cpu_change.unwrap_or_default(),
            memory_usage: raw.memory_usage.unwrap_or_default(),
            memory_change: raw.memory_change.unwrap_or_default(),
            disk_usage: raw.disk_usage.unwrap_or_default(),
            disk_change: raw.disk_change.unwrap_or_default(),
        }
    }
}

impl From<&RawTrafficPoint> for CurrentTraffic {
    fn from(raw: &RawTrafficPoint) -> Self {
        Self {
            upload: raw.upload.unwrap_or_default(),
            download: raw.download.unwrap_or_default(),
        }
    }
}

/// A realtime reading as a history sample stamped `at`.
pub fn traffic_sample(raw: &RawTrafficPoint, at: DateTime<Utc>) -> TrafficSample {
    let current = CurrentTraffic::from(raw);
    TrafficSample {
        upload: current.upload,
        download: current.download,
        timestamp: at,
    }
}

/// Flatten the parallel historical arrays into samples, oldest first.
///
/// Series of unequal length are cut to the shortest. Missing or
/// unparseable timestamps are synthesized one minute apart, ending at `now`.
pub fn traffic_history(raw: &RawTrafficHistory, now: DateTime<Utc>) -> Vec<TrafficSample> {
    let len = raw.upload.len().min(raw.download.len());
    let given = raw.timestamps.as_deref().unwrap_or_default();

    (0..len)
        .map(|i| {
            let synthesized = || {
                let back = i64::try_from(len - 1 - i).unwrap_or(i64::MAX);
                now - TimeDelta::seconds(back.saturating_mul(HISTORY_STEP_SECS))
            };
            let timestamp = given
                .get(i)
                .and_then(|t| parse_timestamp(t))
                .unwrap_or_else(synthesized);
            TrafficSample {
                upload: raw.upload[i],
                download: raw.download[i],
                timestamp,
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_device_maps_fields_and_drops_unknown_status() {
        let raw: RawDevice = serde_json::from_value(json!({
            "id": "d7",
            "ip": "192.168.1.30",
            "name": "  ",
            "type": "desktop",
            "status": "unknown",
            "mac": "AA-BB-CC-DD-EE-01",
            "last_seen": "2024-05-01T10:00:00Z"
        }))
        .unwrap();

        let update = DeviceUpdate::from(raw);
        assert_eq!(update.id, Some(DeviceId::from("d7")));
        assert_eq!(update.name, None);
        assert_eq!(update.kind, Some(DeviceKind::Workstation));
        assert_eq!(update.status, None);
        assert_eq!(update.mac.unwrap().as_str(), "aa:bb:cc:dd:ee:01");
        assert_eq!(update.last_seen.unwrap().to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn discovery_leaves_omitted_fields_absent() {
        let push: DiscoveryPush = serde_json::from_value(json!({
            "ip": "10.0.0.44",
            "name": "camera",
            "type": "iot"
        }))
        .unwrap();

        let update = DeviceUpdate::from(push);
        assert_eq!(update.status, None);
        assert_eq!(update.group, None);
        assert_eq!(update.kind, Some(DeviceKind::Iot));
        assert!(update.id.is_none());
    }

    #[test]
    fn epoch_timestamps() {
        let secs = parse_timestamp("1714557600").unwrap();
        let millis = parse_timestamp("1714557600000").unwrap();
        assert_eq!(secs, millis);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn event_defaults() {
        let draft = EventDraft::from(RawEvent {
            event_type: Some("Security".into()),
            description: Some("Failed login".into()),
            ..RawEvent::default()
        });
        assert!(draft.id.is_none());
        assert_eq!(draft.severity, Severity::Info);
        assert_eq!(draft.status, EventStatus::Active);
    }

    #[test]
    fn history_synthesizes_minute_spaced_timestamps() {
        let now = Utc::now();
        let raw = RawTrafficHistory {
            upload: vec![1.0, 2.0, 3.0],
            download: vec![10.0, 20.0, 30.0, 40.0],
            timestamps: None,
        };

        let samples = traffic_history(&raw, now);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[2].timestamp, now);
        assert_eq!(samples[0].timestamp, now - TimeDelta::seconds(120));
        assert_eq!(samples[1].download, 20.0);
    }

    #[test]
    fn network_stats_missing_gauges_are_zero() {
        let stats = NetworkStats::from(&RawNetworkStats {
            devices: Some(RawGauge {
                value: Some(24.0),
                change: Some(2.0),
            }),
            ..RawNetworkStats::default()
        });
        assert_eq!(stats.devices_total, 24.0);
        assert_eq!(stats.uptime_pct, 0.0);
    }
}
