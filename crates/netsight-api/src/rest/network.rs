// Topology and dashboard configuration endpoints
//
// These payloads are rendered by the frontend as-is, so they stay untyped.

use serde_json::Value;

use crate::error::Error;
use crate::rest::client::{RequestSpec, RestClient};

impl RestClient {
    /// `GET /network/topology`
    pub async fn topology(&self) -> Result<Value, Error> {
        let spec = RequestSpec::get(self.endpoints().topology.as_str());
        self.request(&spec).await
    }

    /// `GET /network/map`
    pub async fn network_map(&self) -> Result<Value, Error> {
        let spec = RequestSpec::get(self.endpoints().network_map.as_str());
        self.request(&spec).await
    }

    /// `GET /config/dashboard`
    pub async fn dashboard_config(&self) -> Result<Value, Error> {
        let spec = RequestSpec::get(self.endpoints().dashboard_config.as_str());
        self.request(&spec).await
    }

    /// `PUT /config/dashboard`
    pub async fn update_dashboard_config(&self, config: Value) -> Result<Value, Error> {
        let spec = RequestSpec::put(self.endpoints().dashboard_config.as_str()).json(config);
        self.request(&spec).await
    }

    /// `GET /config/user`
    pub async fn user_preferences(&self) -> Result<Value, Error> {
        let spec = RequestSpec::get(self.endpoints().user_preferences.as_str());
        self.request(&spec).await
    }

    /// `PUT /config/user`
    pub async fn update_user_preferences(&self, preferences: Value) -> Result<Value, Error> {
        let spec = RequestSpec::put(self.endpoints().user_preferences.as_str()).json(preferences);
        self.request(&spec).await
    }
}
