// Device endpoints
//
// Inventory listing, single-device reads and updates, and the three
// diagnostic actions (scan, ping, trace).

use tracing::debug;

use crate::error::Error;
use crate::models::{Listing, PingResult, RawDevice};
use crate::rest::client::{RequestSpec, RestClient};

impl RestClient {
    /// List every known device.
    ///
    /// `GET /devices`
    pub async fn list_devices(&self) -> Result<Vec<RawDevice>, Error> {
        let spec = RequestSpec::get(self.endpoints().devices.as_str());
        let listing: Listing<RawDevice> = self.request(&spec).await?;
        Ok(listing.into_items())
    }

    /// `GET /devices/{id}`
    pub async fn get_device(&self, id: &str) -> Result<RawDevice, Error> {
        let spec = RequestSpec::get(self.endpoints().device.fill(&[("id", id)]));
        self.request(&spec).await
    }

    /// Update a device's editable fields. Returns the backend's copy, if
    /// it sent one back.
    ///
    /// `PUT /devices/{id}`
    pub async fn update_device(
        &self,
        id: &str,
        update: &RawDevice,
    ) -> Result<Option<RawDevice>, Error> {
        debug!(id, "updating device");
        let body = serde_json::to_value(update)?;
        let spec = RequestSpec::put(self.endpoints().device.fill(&[("id", id)])).json(body);
        self.request(&spec).await
    }

    /// Trigger a network scan. Returns the devices the scan found.
    ///
    /// `POST /devices/scan`
    pub async fn scan_devices(&self) -> Result<Vec<RawDevice>, Error> {
        debug!("starting device scan");
        let spec = RequestSpec::post(self.endpoints().device_scan.as_str());
        let listing: Option<Listing<RawDevice>> = self.request(&spec).await?;
        Ok(listing.map(Listing::into_items).unwrap_or_default())
    }

    /// Ping a device from the backend.
    ///
    /// `POST /devices/{id}/ping`
    pub async fn ping_device(&self, id: &str) -> Result<PingResult, Error> {
        debug!(id, "pinging device");
        let spec = RequestSpec::post(self.endpoints().device_ping.fill(&[("id", id)]));
        let result: Option<PingResult> = self.request(&spec).await?;
        Ok(result.unwrap_or_default())
    }

    /// Run a traceroute to a device. The hop format is backend-defined.
    ///
    /// `POST /devices/{id}/trace`
    pub async fn trace_device(&self, id: &str) -> Result<serde_json::Value, Error> {
        debug!(id, "tracing route to device");
        let spec = RequestSpec::post(self.endpoints().device_trace.fill(&[("id", id)]));
        self.request(&spec).await
    }
}
