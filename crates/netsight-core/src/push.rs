// ── Push bridge ──
//
// Decodes WebSocket channel payloads and applies them through the
// DataStore merge API. Each channel gets one listener on its coarse
// topic; a payload that fails to decode is reported back to the
// listener registry, which logs it and moves on.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use netsight_api::models::{
    DiscoveryPush, MetricsPush, RawAlert, RawEvent, RawSystemHealth, RawTrafficPoint,
    RemovalPush, StatusPush,
};
use netsight_api::pubsub::SubscriptionToken;
use netsight_api::websocket::{Connector, TransportEvent, WebSocketClient, topics};

use crate::config::ChannelTable;
use crate::convert;
use crate::model::{
    AlertDraft, CurrentTraffic, DeviceId, DeviceStatus, DeviceUpdate, EventDraft, NetworkStats,
    Severity, SystemHealth,
};
use crate::store::DataStore;

/// Attach a listener for every channel in `channels`. Returns the tokens so
/// the caller can detach them on shutdown.
pub(crate) fn register<C: Connector>(
    ws: &WebSocketClient<C>,
    store: &Arc<DataStore>,
    channels: &ChannelTable,
) -> Vec<SubscriptionToken> {
    let mut tokens = vec![
        on_payload(ws, &channels.metrics, store, |s, p: MetricsPush| {
            apply_metrics(s, &p);
        }),
        on_payload(ws, &channels.system_health, store, |s, p: RawSystemHealth| {
            s.apply_system_health(SystemHealth::from(&p));
        }),
        on_payload(ws, &channels.events, store, |s, p: RawEvent| {
            s.append_event(EventDraft::from(p));
        }),
        on_payload(ws, &channels.alerts, store, apply_alert),
        on_payload(ws, &channels.device_status, store, |s, p: StatusPush| {
            apply_status(s, &p);
        }),
        on_payload(ws, &channels.traffic, store, |s, p: RawTrafficPoint| {
            apply_traffic(s, &p);
        }),
        on_payload(ws, &channels.device_discovered, store, apply_discovery),
        on_payload(ws, &channels.device_removed, store, |s, p: RemovalPush| {
            apply_removal(s, &p);
        }),
    ];

    tokens.push(ws.on(topics::MAX_RECONNECTS_REACHED, |event| {
        if let TransportEvent::MaxReconnectsReached { attempts } = event {
            error!(attempts, "push channel gave up reconnecting; staying on full polling");
        }
        Ok(())
    }));

    tokens
}

fn on_payload<C, T, F>(
    ws: &WebSocketClient<C>,
    channel: &str,
    store: &Arc<DataStore>,
    apply: F,
) -> SubscriptionToken
where
    C: Connector,
    T: DeserializeOwned,
    F: Fn(&DataStore, T) + Send + Sync + 'static,
{
    let store = Arc::clone(store);
    ws.on_message(channel, move |envelope| {
        let payload: T = serde_json::from_value(envelope.payload.clone())?;
        apply(&store, payload);
        Ok(())
    })
}

// ── Per-channel application ──────────────────────────────────────────

fn apply_metrics(store: &DataStore, push: &MetricsPush) {
    if let Some(network) = &push.network {
        store.apply_network_stats(NetworkStats::from(network));
    }
    if let Some(system) = &push.system {
        store.apply_system_health(SystemHealth::from(system));
    }
}

fn apply_alert(store: &DataStore, raw: RawAlert) {
    let draft = AlertDraft::from(raw);
    let event = EventDraft::new("Security Alert", draft.description.clone(), Severity::Critical)
        .with_device(draft.source.clone());

    store.append_alert(draft);
    store.append_event(event);
    store.increment_active_alerts();
}

fn apply_status(store: &DataStore, push: &StatusPush) {
    let outcome = store.upsert_device(DeviceUpdate::from(push));

    if push.status_changed {
        let status = push.status.as_deref().unwrap_or("unknown");
        let address = push
            .device_ip
            .clone()
            .or_else(|| outcome.device().map(|d| d.address.clone()));
        let severity = if matches!(status.parse::<DeviceStatus>(), Ok(DeviceStatus::Offline)) {
            Severity::Warning
        } else {
            Severity::Info
        };
        let description = format!(
            "Device {} status changed to {status}",
            address.as_deref().unwrap_or("unknown")
        );
        store.append_event(EventDraft::new("Status Change", description, severity).with_device(address));
    }
}

fn apply_traffic(store: &DataStore, point: &RawTrafficPoint) {
    store.push_traffic_sample(convert::traffic_sample(point, Utc::now()));
    store.apply_current_traffic(CurrentTraffic::from(point));
}

/// Status and group for devices first seen through discovery. A push about
/// a known device keeps what the store already holds.
fn discovery_defaults() -> DeviceUpdate {
    DeviceUpdate {
        status: Some(DeviceStatus::Online),
        group: Some("guest".to_owned()),
        ..DeviceUpdate::default()
    }
}

fn apply_discovery(store: &DataStore, push: DiscoveryPush) {
    let outcome = store.upsert_device_or_insert_with(DeviceUpdate::from(push), discovery_defaults());
    if let Some(device) = outcome.device() {
        debug!(address = %device.address, new = outcome.is_inserted(), "device discovered");
    }
}

fn apply_removal(store: &DataStore, push: &RemovalPush) {
    match push.device_id.as_deref() {
        Some(id) => {
            if store.remove_device(&DeviceId::from(id)).is_none() {
                debug!(id, "removal for unknown device");
            }
        }
        None => debug!("removal push without device id"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::EventStatus;
    use serde_json::json;

    fn decode<T: DeserializeOwned>(value: serde_json::Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    fn seeded() -> DataStore {
        let store = DataStore::default();
        store.upsert_device(DeviceUpdate {
            id: Some(DeviceId::from("d1")),
            address: Some("192.168.1.10".into()),
            status: Some(DeviceStatus::Online),
            latency_ms: Some(12.0),
            ..DeviceUpdate::default()
        });
        store
    }

    #[test]
    fn status_change_merges_and_logs_event() {
        let store = seeded();
        apply_status(
            &store,
            &decode(json!({ "device_id": "d1", "status": "offline", "status_changed": true })),
        );

        let device = store.device_by_id(&DeviceId::from("d1")).unwrap();
        assert_eq!(device.status, DeviceStatus::Offline);
        assert_eq!(device.latency_ms, Some(12.0));
        assert!(device.last_seen.is_some());

        let events = store.events_snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].category, "Status Change");
        assert_eq!(events[0].severity, Severity::Warning);
        assert_eq!(events[0].status, EventStatus::Active);
        assert_eq!(
            events[0].description,
            "Device 192.168.1.10 status changed to offline"
        );
    }

    #[test]
    fn unknown_status_string_keeps_stored_status() {
        let store = seeded();
        apply_status(&store, &decode(json!({ "device_id": "d1", "status": "unknown" })));
        let device = store.device_by_id(&DeviceId::from("d1")).unwrap();
        assert_eq!(device.status, DeviceStatus::Online);
        assert!(store.events_snapshot().is_empty());
    }

    #[test]
    fn alert_push_adds_alert_event_and_count() {
        let store = DataStore::default();
        apply_alert(
            &store,
            decode(json!({ "description": "Port scan", "source_ip": "203.0.113.9", "severity": "high" })),
        );

        assert_eq!(store.alerts_snapshot().len(), 1);
        let events = store.events_snapshot();
        assert_eq!(events[0].category, "Security Alert");
        assert_eq!(events[0].severity, Severity::Critical);
        assert_eq!(events[0].device.as_deref(), Some("203.0.113.9"));
        assert_eq!(store.network_stats().unwrap().alerts_active, 1.0);
    }

    #[test]
    fn discovery_then_removal() {
        let store = DataStore::default();
        apply_discovery(&store, decode(json!({ "device_id": "d5", "ip": "10.0.0.5", "type": "iot" })));
        assert_eq!(store.device_count(), 1);

        apply_removal(&store, &decode(json!({ "device_id": "d5" })));
        assert_eq!(store.device_count(), 0);
    }

    #[test]
    fn new_discovery_gets_online_guest_defaults() {
        let store = DataStore::default();
        apply_discovery(&store, decode(json!({ "ip": "10.0.0.7" })));

        let device = store.device_by_address("10.0.0.7").unwrap();
        assert_eq!(device.status, DeviceStatus::Online);
        assert_eq!(device.metadata.group.as_deref(), Some("guest"));
    }

    #[test]
    fn rediscovery_keeps_known_status_and_group() {
        let store = DataStore::default();
        store.upsert_device(DeviceUpdate {
            id: Some(DeviceId::from("d1")),
            address: Some("10.0.0.5".into()),
            status: Some(DeviceStatus::Warning),
            group: Some("servers".into()),
            ..DeviceUpdate::default()
        });

        apply_discovery(&store, decode(json!({ "ip": "10.0.0.5" })));

        assert_eq!(store.device_count(), 1);
        let device = store.device_by_id(&DeviceId::from("d1")).unwrap();
        assert_eq!(device.status, DeviceStatus::Warning);
        assert_eq!(device.metadata.group.as_deref(), Some("servers"));
        assert!(device.last_seen.is_some());
    }

    #[test]
    fn traffic_push_updates_window_and_current() {
        let store = DataStore::default();
        apply_traffic(&store, &decode(json!({ "upload": 12.5, "download": "80 Mbps" })));

        assert_eq!(store.traffic().len(), 1);
        let current = store.current_traffic().unwrap();
        assert_eq!(current.download, 80.0);
    }

    #[test]
    fn metrics_push_may_carry_either_half() {
        let store = DataStore::default();
        apply_metrics(&store, &decode(json!({ "system": { "cpu_usage": 41.0 } })));
        assert!(store.network_stats().is_none());
        assert_eq!(store.system_health().unwrap().cpu_usage, 41.0);
    }
}
