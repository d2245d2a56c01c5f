// ── REST-backed polling and bootstrap ──
//
// Fetches through the Request Client and applies results via the
// DataStore merge API. Used both for the initial load and by the
// PollingScheduler.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use netsight_api::rest::{EventQuery, RestClient};

use crate::convert;
use crate::error::CoreError;
use crate::model::{AlertDraft, CurrentTraffic, DeviceUpdate, EventDraft, NetworkStats, SystemHealth};
use crate::scheduler::{PollCategory, Poller};
use crate::store::DataStore;

/// Events requested by the initial load.
const BOOTSTRAP_EVENT_LIMIT: u32 = 50;
const HISTORY_RANGE: &str = "24h";
const HISTORY_INTERVAL: &str = "1h";

/// What the initial load managed to fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Whether the health check passed. When `false` nothing else was tried.
    pub reachable: bool,
    pub loaded: Vec<&'static str>,
    pub failed: Vec<(&'static str, String)>,
}

impl BootstrapReport {
    pub fn is_complete(&self) -> bool {
        self.reachable && self.failed.is_empty()
    }

    fn record(&mut self, part: &'static str, result: Result<(), CoreError>) {
        match result {
            Ok(()) => self.loaded.push(part),
            Err(e) => {
                warn!(part, error = %e, "initial load failed");
                self.failed.push((part, e.to_string()));
            }
        }
    }
}

/// [`Poller`] that fetches over REST and merges into a [`DataStore`].
pub struct RestPoller {
    client: RestClient,
    store: Arc<DataStore>,
    /// Time of the last successful event fetch; the next poll asks only for
    /// newer events.
    events_cursor: Mutex<Option<DateTime<Utc>>>,
}

impl RestPoller {
    pub fn new(client: RestClient, store: Arc<DataStore>) -> Self {
        Self {
            client,
            store,
            events_cursor: Mutex::new(None),
        }
    }

    pub fn client(&self) -> &RestClient {
        &self.client
    }

    // ── Initial load ─────────────────────────────────────────────────

    /// Check the backend is reachable, then load every data class
    /// concurrently. Each part fails on its own; the rest still load.
    pub async fn bootstrap(&self) -> BootstrapReport {
        let mut report = BootstrapReport::default();

        if let Err(e) = self.client.test_connection().await {
            warn!(error = %e, "backend unreachable, skipping initial load");
            return report;
        }
        report.reachable = true;

        let (stats, health, devices, events, alerts, history, realtime) = tokio::join!(
            self.load_network_stats(),
            self.load_system_health(),
            self.load_devices(),
            self.load_events(),
            self.load_alerts(),
            self.load_traffic_history(),
            self.load_traffic_realtime(),
        );

        report.record("network-stats", stats);
        report.record("system-health", health);
        report.record("devices", devices);
        report.record("events", events);
        report.record("alerts", alerts);
        report.record("traffic-history", history);
        report.record("traffic-realtime", realtime);

        info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            devices = self.store.device_count(),
            "initial load complete"
        );
        report
    }

    async fn load_network_stats(&self) -> Result<(), CoreError> {
        let raw = self.client.network_stats().await?;
        self.store.apply_network_stats(NetworkStats::from(&raw));
        Ok(())
    }

    async fn load_system_health(&self) -> Result<(), CoreError> {
        let raw = self.client.system_health().await?;
        self.store.apply_system_health(SystemHealth::from(&raw));
        Ok(())
    }

    async fn load_devices(&self) -> Result<(), CoreError> {
        let raw = self.client.list_devices().await?;
        debug!(count = raw.len(), "device listing fetched");
        self.store
            .apply_device_listing(raw.into_iter().map(DeviceUpdate::from).collect());
        Ok(())
    }

    async fn load_events(&self) -> Result<(), CoreError> {
        let started = Utc::now();
        let query = EventQuery {
            limit: Some(BOOTSTRAP_EVENT_LIMIT),
            ..EventQuery::default()
        };
        let raw = self.client.list_events(&query).await?;
        self.store
            .replace_events(raw.into_iter().map(EventDraft::from).collect());
        self.set_events_cursor(started);
        Ok(())
    }

    async fn load_alerts(&self) -> Result<(), CoreError> {
        let raw = self.client.list_alerts(None).await?;
        self.store
            .replace_alerts(raw.into_iter().map(AlertDraft::from).collect());
        Ok(())
    }

    async fn load_traffic_history(&self) -> Result<(), CoreError> {
        let raw = self
            .client
            .traffic_historical(HISTORY_RANGE, HISTORY_INTERVAL)
            .await?;
        if let Some(history) = raw.historical {
            self.store
                .replace_traffic_history(convert::traffic_history(&history, Utc::now()));
        }
        Ok(())
    }

    async fn load_traffic_realtime(&self) -> Result<(), CoreError> {
        let raw = self.client.traffic_realtime().await?;
        if let Some(point) = raw.realtime {
            self.store.apply_current_traffic(CurrentTraffic::from(&point));
        }
        Ok(())
    }

    // ── Incremental polls ────────────────────────────────────────────

    async fn poll_network_stats(&self) -> Result<(), CoreError> {
        let (stats, health) = tokio::join!(self.load_network_stats(), self.load_system_health());
        stats.and(health)
    }

    /// Take a realtime reading and append it to the traffic window.
    async fn poll_traffic(&self) -> Result<(), CoreError> {
        let raw = self.client.traffic_realtime().await?;
        if let Some(point) = raw.realtime {
            self.store
                .push_traffic_sample(convert::traffic_sample(&point, Utc::now()));
            self.store.apply_current_traffic(CurrentTraffic::from(&point));
        }
        Ok(())
    }

    /// Fetch events newer than the cursor and prepend any not already held.
    async fn poll_events(&self) -> Result<(), CoreError> {
        let started = Utc::now();
        let since = self.events_cursor().or_else(|| self.store.last_data_update());
        let query = EventQuery {
            since: since.map(|t| t.to_rfc3339()),
            ..EventQuery::default()
        };
        let raw = self.client.list_events(&query).await?;

        let known: HashSet<_> = self
            .store
            .events_snapshot()
            .iter()
            .map(|e| e.id.clone())
            .collect();
        let fresh: Vec<EventDraft> = raw
            .into_iter()
            .map(EventDraft::from)
            .filter(|d| d.id.as_ref().is_none_or(|id| !known.contains(id)))
            .collect();

        debug!(count = fresh.len(), "new events polled");
        self.store.append_events(fresh);
        self.set_events_cursor(started);
        Ok(())
    }

    fn events_cursor(&self) -> Option<DateTime<Utc>> {
        *self
            .events_cursor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_events_cursor(&self, at: DateTime<Utc>) {
        *self
            .events_cursor
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(at);
    }
}

impl Poller for RestPoller {
    async fn poll(&self, category: PollCategory) -> Result<(), CoreError> {
        debug!(%category, "polling");
        match category {
            PollCategory::NetworkStats => self.poll_network_stats().await,
            PollCategory::DeviceStatus => self.load_devices().await,
            PollCategory::Traffic => self.poll_traffic().await,
            PollCategory::Events => self.poll_events().await,
        }
    }
}
