// Event log endpoints

use bytes::Bytes;
use tracing::debug;

use crate::error::Error;
use crate::models::{Listing, RawEvent};
use crate::rest::client::{RequestSpec, RestClient};

/// Filters for [`RestClient::list_events`]. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Only events newer than this (backend timestamp format).
    pub since: Option<String>,
    pub limit: Option<u32>,
    pub severity: Option<String>,
}

impl RestClient {
    /// `GET /events?since=..&limit=..&severity=..`
    pub async fn list_events(&self, query: &EventQuery) -> Result<Vec<RawEvent>, Error> {
        let spec = RequestSpec::get(self.endpoints().events.as_str())
            .query_opt("since", query.since.as_deref())
            .query_opt("limit", query.limit)
            .query_opt("severity", query.severity.as_deref());
        let listing: Listing<RawEvent> = self.request(&spec).await?;
        Ok(listing.into_items())
    }

    /// Record an event on the backend. Returns the stored copy.
    ///
    /// `POST /events`
    pub async fn create_event(&self, event: &RawEvent) -> Result<RawEvent, Error> {
        debug!(event_type = ?event.event_type, "creating event");
        let body = serde_json::to_value(event)?;
        let spec = RequestSpec::post(self.endpoints().events.as_str()).json(body);
        self.request(&spec).await
    }

    /// Export the event log in `format` (e.g. `"csv"`). Returns the raw file.
    ///
    /// `GET /events/export?format=..`
    pub async fn export_events(&self, format: &str) -> Result<Bytes, Error> {
        let spec = RequestSpec::get(self.endpoints().events_export.as_str()).query("format", format);
        self.send(&spec).await
    }
}
