// Metrics endpoints

use crate::error::Error;
use crate::models::{RawNetworkStats, RawSystemHealth};
use crate::rest::client::{RequestSpec, RestClient};

impl RestClient {
    /// Headline network figures (uptime, bandwidth, device and alert counts).
    ///
    /// `GET /metrics/network`
    pub async fn network_stats(&self) -> Result<RawNetworkStats, Error> {
        let spec = RequestSpec::get(self.endpoints().network_stats.as_str());
        self.request(&spec).await
    }

    /// Bandwidth usage over `range` (e.g. `"24h"`). Shape is backend-defined.
    ///
    /// `GET /metrics/bandwidth?range=..`
    pub async fn bandwidth_usage(&self, range: &str) -> Result<serde_json::Value, Error> {
        let spec = RequestSpec::get(self.endpoints().bandwidth_usage.as_str()).query("range", range);
        self.request(&spec).await
    }

    /// CPU, memory, and disk utilisation.
    ///
    /// `GET /metrics/system`
    pub async fn system_health(&self) -> Result<RawSystemHealth, Error> {
        let spec = RequestSpec::get(self.endpoints().system_health.as_str());
        self.request(&spec).await
    }

    /// Cheap reachability probe.
    ///
    /// `GET /health`
    pub async fn test_connection(&self) -> Result<(), Error> {
        let spec = RequestSpec::get(self.endpoints().health.as_str());
        self.send(&spec).await.map(|_| ())
    }
}
