// ── Controller abstraction ──
//
// Full lifecycle management for one dashboard backend: initial load,
// push bridge, polling fallback, and command routing. Consumers hold a
// Controller and read state from its DataStore.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use netsight_api::models::RawDevice;
use netsight_api::pubsub::SubscriptionToken;
use netsight_api::rest::{CredentialStore, RestClient};
use netsight_api::websocket::{ConnectionStatus, Connector, TungsteniteConnector, WebSocketClient};

use crate::command::{Command, CommandResult, PingOutcome};
use crate::config::SyncConfig;
use crate::error::CoreError;
use crate::model::{AlertId, DeviceId, DeviceStatus, DeviceUpdate};
use crate::poller::{BootstrapReport, RestPoller};
use crate::push;
use crate::scheduler::{PollingMode, PollingScheduler};
use crate::store::DataStore;

/// Pause between consecutive pings of a bulk ping.
const BULK_PING_GAP: Duration = Duration::from_millis(100);

// ── Controller ───────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Owns the Request Client,
/// the Transport Client (unless push is disabled), the polling scheduler,
/// and the single shared [`DataStore`].
pub struct Controller<C: Connector = TungsteniteConnector> {
    inner: Arc<ControllerInner<C>>,
}

impl<C: Connector> Clone for Controller<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<C: Connector> {
    config: SyncConfig,
    store: Arc<DataStore>,
    poller: Arc<RestPoller>,
    /// `None` when push is disabled in configuration.
    transport: Option<WebSocketClient<C>>,
    /// Reported as the connection status when there is no transport, so
    /// the scheduler stays in full polling.
    idle_status: watch::Sender<ConnectionStatus>,
    scheduler: Mutex<Option<PollingScheduler>>,
    push_tokens: Mutex<Vec<SubscriptionToken>>,
}

impl Controller<TungsteniteConnector> {
    /// Create a controller. Does NOT connect; call [`start()`](Self::start).
    pub fn new(
        config: SyncConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, CoreError> {
        Self::with_connector(config, credentials, TungsteniteConnector)
    }
}

impl<C: Connector> Controller<C> {
    pub fn with_connector(
        config: SyncConfig,
        credentials: Arc<dyn CredentialStore>,
        connector: C,
    ) -> Result<Self, CoreError> {
        let rest = RestClient::new(config.rest_config(), credentials)?;
        Ok(Self::with_clients(config, rest, connector))
    }

    /// Create a controller around an existing Request Client.
    pub fn with_clients(config: SyncConfig, rest: RestClient, connector: C) -> Self {
        let store = Arc::new(DataStore::new(config.limits));
        let poller = Arc::new(RestPoller::new(rest, Arc::clone(&store)));
        let transport = config.websocket_enabled.then(|| {
            WebSocketClient::with_connector(config.websocket_url.clone(), config.reconnect, connector)
        });
        let mut idle = ConnectionStatus::idle(&config.websocket_url);
        idle.reconnect_enabled = false;
        let (idle_status, _) = watch::channel(idle);

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store,
                poller,
                transport,
                idle_status,
                scheduler: Mutex::new(None),
                push_tokens: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Access the underlying DataStore.
    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    pub fn rest(&self) -> &RestClient {
        self.inner.poller.client()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Load initial state over REST without starting anything else.
    pub async fn bootstrap(&self) -> BootstrapReport {
        self.inner.poller.bootstrap().await
    }

    /// Load initial state, attach the push bridge, open the push channel,
    /// and start polling.
    ///
    /// An unreachable backend is not an error: the store starts empty and
    /// fills from push and polling once the backend comes back.
    pub async fn start(&self) -> Result<BootstrapReport, CoreError> {
        let mut scheduler = self.inner.scheduler.lock().await;
        if scheduler.is_some() {
            return Err(CoreError::Internal("controller already started".into()));
        }

        let report = self.bootstrap().await;

        if let Some(ws) = &self.inner.transport {
            let tokens = push::register(ws, &self.inner.store, &self.inner.config.channels);
            self.inner.push_tokens.lock().await.extend(tokens);
            for channel in self.inner.config.channels.all() {
                ws.subscribe_channel(channel);
            }
            ws.connect();
        } else {
            info!("push channel disabled, polling only");
        }

        *scheduler = Some(PollingScheduler::start(
            Arc::clone(&self.inner.poller),
            self.inner.config.polling,
            self.subscribe_connection(),
        ));

        info!(reachable = report.reachable, "controller started");
        Ok(report)
    }

    /// Stop polling, detach the push bridge, and close the push channel.
    /// Nothing writes to the store after this returns.
    pub async fn stop(&self) {
        if let Some(scheduler) = self.inner.scheduler.lock().await.take() {
            scheduler.shutdown().await;
        }

        if let Some(ws) = &self.inner.transport {
            for token in self.inner.push_tokens.lock().await.drain(..) {
                ws.off(token);
            }
            ws.disconnect().await;
        }
        debug!("controller stopped");
    }

    // ── State observation ────────────────────────────────────────────

    pub fn connection_status(&self) -> ConnectionStatus {
        match &self.inner.transport {
            Some(ws) => ws.status(),
            None => self.inner.idle_status.borrow().clone(),
        }
    }

    pub fn subscribe_connection(&self) -> watch::Receiver<ConnectionStatus> {
        match &self.inner.transport {
            Some(ws) => ws.watch_status(),
            None => self.inner.idle_status.subscribe(),
        }
    }

    pub async fn polling_mode(&self) -> PollingMode {
        self.inner
            .scheduler
            .lock()
            .await
            .as_ref()
            .map_or(PollingMode::Stopped, PollingScheduler::mode)
    }

    // ── Command execution ────────────────────────────────────────────

    /// Execute a user command against the backend and/or the store.
    pub async fn execute(&self, command: Command) -> Result<CommandResult, CoreError> {
        debug!(?command, "executing command");
        let store = &self.inner.store;

        match command {
            Command::PingDevice { id } => self.ping(&id).await.map(CommandResult::Ping),

            Command::BulkPing { ids } => {
                let mut results = Vec::with_capacity(ids.len());
                for (i, id) in ids.into_iter().enumerate() {
                    if i > 0 {
                        tokio::time::sleep(BULK_PING_GAP).await;
                    }
                    let outcome = self.ping(&id).await;
                    results.push((id, outcome));
                }
                Ok(CommandResult::BulkPing(results))
            }

            Command::TraceDevice { id } => {
                self.require_device(&id)?;
                let hops = self.rest().trace_device(id.as_str()).await?;
                Ok(CommandResult::Trace(hops))
            }

            Command::ScanDevices => {
                let found = self.rest().scan_devices().await?;
                let discovered = found.len();
                let inserted = found
                    .into_iter()
                    .map(|raw| store.upsert_device(DeviceUpdate::from(raw)))
                    .filter(|outcome| outcome.is_inserted())
                    .count();
                info!(discovered, inserted, "scan complete");
                Ok(CommandResult::Scan {
                    discovered,
                    inserted,
                })
            }

            Command::AddDevice { device } => {
                if device.address.as_deref().is_none_or(|a| a.trim().is_empty()) {
                    return Err(CoreError::ValidationFailed {
                        message: "device address is required".into(),
                    });
                }
                let defaults = DeviceUpdate {
                    status: Some(DeviceStatus::Online),
                    last_seen: Some(Utc::now()),
                    ..DeviceUpdate::default()
                };
                store
                    .upsert_device_or_insert_with(device, defaults)
                    .device()
                    .cloned()
                    .map(CommandResult::Device)
                    .ok_or_else(|| CoreError::Internal("device merge rejected".into()))
            }

            Command::RemoveDevice { id } => store
                .remove_device(&id)
                .map(|_| CommandResult::Ok)
                .ok_or_else(|| device_not_found(&id)),

            Command::UpdateDevice { id, mut update } => {
                self.require_device(&id)?;
                update.id = Some(id.clone());
                let returned = self
                    .rest()
                    .update_device(id.as_str(), &RawDevice::from(&update))
                    .await?;

                store.upsert_device(update);
                if let Some(raw) = returned {
                    // The backend's copy wins, but it cannot move the record.
                    let mut confirmed = DeviceUpdate::from(raw);
                    confirmed.id = Some(id.clone());
                    store.upsert_device(confirmed);
                }
                store
                    .device_by_id(&id)
                    .map(CommandResult::Device)
                    .ok_or_else(|| device_not_found(&id))
            }

            Command::SelectDevice { id } => {
                if store.select_device(&id) {
                    Ok(CommandResult::Ok)
                } else {
                    Err(device_not_found(&id))
                }
            }

            Command::DeselectDevice { id } => {
                store.deselect_device(&id);
                Ok(CommandResult::Ok)
            }

            Command::AcknowledgeAlert { id } => {
                if store.alert_by_id(&id).is_none() {
                    return Err(alert_not_found(&id));
                }
                self.rest().acknowledge_alert(id.as_str()).await?;
                if !store.acknowledge_alert(&id) {
                    warn!(%id, "alert left the log before acknowledgement landed");
                }
                Ok(CommandResult::Ok)
            }
        }
    }

    /// Ping one device and merge the measured latency.
    async fn ping(&self, id: &DeviceId) -> Result<PingOutcome, CoreError> {
        self.require_device(id)?;
        let result = self.rest().ping_device(id.as_str()).await?;

        let status_offline = result
            .status
            .as_deref()
            .and_then(|s| s.parse::<DeviceStatus>().ok())
            == Some(DeviceStatus::Offline);
        let reachable = result
            .reachable
            .unwrap_or(result.latency_ms.is_some() && !status_offline);

        let update = DeviceUpdate {
            id: Some(id.clone()),
            latency_ms: result.latency_ms,
            last_seen: reachable.then(Utc::now),
            status: (!reachable).then_some(DeviceStatus::Offline),
            ..DeviceUpdate::default()
        };
        let device = self
            .inner
            .store
            .upsert_device(update)
            .device()
            .cloned()
            .ok_or_else(|| device_not_found(id))?;

        Ok(PingOutcome {
            latency_ms: result.latency_ms,
            reachable,
            device,
        })
    }

    fn require_device(&self, id: &DeviceId) -> Result<(), CoreError> {
        self.inner
            .store
            .device_by_id(id)
            .map(|_| ())
            .ok_or_else(|| device_not_found(id))
    }
}

fn device_not_found(id: &DeviceId) -> CoreError {
    CoreError::DeviceNotFound {
        identifier: id.to_string(),
    }
}

fn alert_not_found(id: &AlertId) -> CoreError {
    CoreError::AlertNotFound {
        identifier: id.to_string(),
    }
}
