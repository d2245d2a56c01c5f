// Security endpoints

use tracing::debug;

use crate::error::Error;
use crate::models::{Listing, RawAlert};
use crate::rest::client::{RequestSpec, RestClient};

impl RestClient {
    /// `GET /security/alerts[?severity=..]`
    pub async fn list_alerts(&self, severity: Option<&str>) -> Result<Vec<RawAlert>, Error> {
        let spec = RequestSpec::get(self.endpoints().security_alerts.as_str())
            .query_opt("severity", severity);
        let listing: Listing<RawAlert> = self.request(&spec).await?;
        Ok(listing.into_items())
    }

    /// Acknowledge an alert. Repeating the call has no further effect, so
    /// it is retried like a read.
    ///
    /// `POST /security/alerts/{id}/acknowledge`
    pub async fn acknowledge_alert(&self, id: &str) -> Result<(), Error> {
        debug!(id, "acknowledging alert");
        let spec =
            RequestSpec::post(self.endpoints().alert_acknowledge.fill(&[("id", id)])).idempotent();
        self.send(&spec).await.map(|_| ())
    }

    /// Raw security log lines. Shape is backend-defined.
    ///
    /// `GET /security/logs?limit=..`
    pub async fn security_logs(&self, limit: u32) -> Result<serde_json::Value, Error> {
        let spec = RequestSpec::get(self.endpoints().security_logs.as_str()).query("limit", limit);
        self.request(&spec).await
    }
}
