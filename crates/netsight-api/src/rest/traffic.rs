// Traffic endpoints

use crate::error::Error;
use crate::models::RawTraffic;
use crate::rest::client::{RequestSpec, RestClient};

impl RestClient {
    /// Current upload/download rates.
    ///
    /// `GET /traffic/realtime`
    pub async fn traffic_realtime(&self) -> Result<RawTraffic, Error> {
        let spec = RequestSpec::get(self.endpoints().traffic_realtime.as_str());
        self.request(&spec).await
    }

    /// Rate history over `range`, bucketed by `interval` (e.g. `"24h"`, `"1h"`).
    ///
    /// `GET /traffic/historical?range=..&interval=..`
    pub async fn traffic_historical(&self, range: &str, interval: &str) -> Result<RawTraffic, Error> {
        let spec = RequestSpec::get(self.endpoints().traffic_historical.as_str())
            .query("range", range)
            .query("interval", interval);
        self.request(&spec).await
    }

    /// Traffic for one device over `range`.
    ///
    /// `GET /traffic/device/{id}?range=..`
    pub async fn device_traffic(&self, id: &str, range: &str) -> Result<RawTraffic, Error> {
        let spec = RequestSpec::get(self.endpoints().traffic_by_device.fill(&[("id", id)]))
            .query("range", range);
        self.request(&spec).await
    }
}
