// ── Runtime synchronization configuration ──
//
// These types describe *what* to sync and *how often*. They carry no
// credentials and never touch disk. The CLI builds a `SyncConfig` (usually
// through netsight-config) and hands it in.

use std::time::Duration;

use url::Url;

use netsight_api::rest::{EndpointTable, RestConfig, RetryPolicy};
use netsight_api::transport::TransportConfig;
use netsight_api::websocket::ReconnectConfig;

use crate::scheduler::PollCategory;

/// Push channel names, one per data class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTable {
    pub metrics: String,
    pub system_health: String,
    pub events: String,
    pub alerts: String,
    pub device_status: String,
    pub traffic: String,
    pub device_discovered: String,
    pub device_removed: String,
}

impl Default for ChannelTable {
    fn default() -> Self {
        Self {
            metrics: "network-metrics".into(),
            system_health: "system-health".into(),
            events: "network-events".into(),
            alerts: "security-alerts".into(),
            device_status: "device-status".into(),
            traffic: "traffic-updates".into(),
            device_discovered: "device-discovered".into(),
            device_removed: "device-removed".into(),
        }
    }
}

impl ChannelTable {
    /// Every channel, in subscription order.
    pub fn all(&self) -> [&str; 8] {
        [
            self.metrics.as_str(),
            self.system_health.as_str(),
            self.events.as_str(),
            self.alerts.as_str(),
            self.device_status.as_str(),
            self.traffic.as_str(),
            self.device_discovered.as_str(),
            self.device_removed.as_str(),
        ]
    }
}

/// Per-category polling cadence, plus the single sweep used while the
/// push channel is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingIntervals {
    pub network_stats: Duration,
    pub device_status: Duration,
    pub traffic: Duration,
    pub events: Duration,
    pub backup: Duration,
}

impl Default for PollingIntervals {
    fn default() -> Self {
        Self {
            network_stats: Duration::from_secs(10),
            device_status: Duration::from_secs(15),
            traffic: Duration::from_secs(5),
            events: Duration::from_secs(30),
            backup: Duration::from_secs(30),
        }
    }
}

impl PollingIntervals {
    pub fn for_category(&self, category: PollCategory) -> Duration {
        match category {
            PollCategory::NetworkStats => self.network_stats,
            PollCategory::DeviceStatus => self.device_status,
            PollCategory::Traffic => self.traffic,
            PollCategory::Events => self.events,
        }
    }
}

/// Bounds on retained local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub max_events: usize,
    pub max_alerts: usize,
    pub traffic_window: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_events: 100,
            max_alerts: 50,
            traffic_window: 20,
        }
    }
}

/// Everything the controller needs to sync with one backend.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// REST base URL, including any path prefix (e.g. `/api/v1`).
    pub base_url: Url,
    pub endpoints: EndpointTable,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub transport: TransportConfig,

    pub websocket_url: Url,
    /// When `false`, the controller runs on polling alone.
    pub websocket_enabled: bool,
    pub channels: ChannelTable,
    pub reconnect: ReconnectConfig,

    pub polling: PollingIntervals,
    pub limits: StoreLimits,
}

impl SyncConfig {
    pub fn new(base_url: Url, websocket_url: Url) -> Self {
        Self {
            base_url,
            endpoints: EndpointTable::default(),
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            transport: TransportConfig::default(),
            websocket_url,
            websocket_enabled: true,
            channels: ChannelTable::default(),
            reconnect: ReconnectConfig::default(),
            polling: PollingIntervals::default(),
            limits: StoreLimits::default(),
        }
    }

    pub fn rest_config(&self) -> RestConfig {
        RestConfig {
            base_url: self.base_url.clone(),
            timeout: self.request_timeout,
            retry: self.retry.clone(),
            endpoints: self.endpoints.clone(),
            transport: self.transport.clone(),
        }
    }
}
