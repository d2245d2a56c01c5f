//! WebSocket push channel with auto-reconnect and channel subscriptions.
//!
//! A single background driver task owns the socket. It re-sends every
//! registered channel subscription on each successful (re)connection,
//! publishes inbound envelopes to the topic registry, and reconnects with
//! exponential backoff when the socket drops for any reason other than a
//! normal (1000) close.
//!
//! # Example
//!
//! ```rust,ignore
//! use netsight_api::websocket::{ReconnectConfig, WebSocketClient};
//! use url::Url;
//!
//! let client = WebSocketClient::new(Url::parse("ws://localhost:8080/ws")?, ReconnectConfig::default());
//! client.subscribe_channel("device-status");
//! client.on_message("device-status", |env| {
//!     println!("{}: {}", env.kind, env.payload);
//!     Ok(())
//! });
//! client.connect();
//! // ...
//! client.disconnect().await;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use futures_util::{Sink, SinkExt, Stream, StreamExt, future};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{
    self,
    protocol::{CloseFrame, frame::coding::CloseCode},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::Error;
use crate::pubsub::{ListenerError, PubSub, SubscriptionToken};

// ── Close codes ──────────────────────────────────────────────────────

/// Normal closure. The only close code that does not trigger a reconnect.
pub const NORMAL_CLOSURE: u16 = 1000;

const NO_STATUS_RECEIVED: u16 = 1005;
const ABNORMAL_CLOSURE: u16 = 1006;

/// Lifecycle topic names published by [`WebSocketClient`].
pub mod topics {
    pub const CONNECTED: &str = "connected";
    pub const DISCONNECTED: &str = "disconnected";
    pub const ERROR: &str = "error";
    pub const MAX_RECONNECTS_REACHED: &str = "max-reconnects-reached";
}

// ── Wire types ───────────────────────────────────────────────────────

/// Inbound push message.
///
/// Published under `"{channel}:{type}"` and then under `"{channel}"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub channel: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub payload: serde_json::Value,

    /// Backend timestamp, kept verbatim (ISO-8601 string or epoch millis).
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
}

impl Envelope {
    /// The fine-grained topic, `"{channel}:{type}"`.
    pub fn topic(&self) -> String {
        format!("{}:{}", self.channel, self.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Subscribe,
    Unsubscribe,
}

/// Outbound control message: `{ type, channel, timestamp }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlMessage {
    pub action: ControlAction,
    pub channel: String,
}

impl ControlMessage {
    pub fn subscribe(channel: impl Into<String>) -> Self {
        Self {
            action: ControlAction::Subscribe,
            channel: channel.into(),
        }
    }

    pub fn unsubscribe(channel: impl Into<String>) -> Self {
        Self {
            action: ControlAction::Unsubscribe,
            channel: channel.into(),
        }
    }

    pub fn to_json(&self) -> String {
        let kind = match self.action {
            ControlAction::Subscribe => "subscribe",
            ControlAction::Unsubscribe => "unsubscribe",
        };
        serde_json::json!({
            "type": kind,
            "channel": self.channel,
            "timestamp": Utc::now().to_rfc3339(),
        })
        .to_string()
    }
}

/// Everything the client publishes to listeners.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Connected,
    Disconnected { code: u16, reason: String },
    Error { message: String },
    MaxReconnectsReached { attempts: u32 },
    Message(Arc<Envelope>),
}

// ── Connection status ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionPhase {
    Idle,
    Connecting,
    Open,
    Closed,
}

impl std::fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}

/// Snapshot of the transport state. Only the driver writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub phase: ConnectionPhase,
    pub reconnect_attempts: u32,
    pub reconnect_enabled: bool,
    pub url: String,
}

impl ConnectionStatus {
    pub fn idle(url: &Url) -> Self {
        Self {
            phase: ConnectionPhase::Idle,
            reconnect_attempts: 0,
            reconnect_enabled: true,
            url: url.to_string(),
        }
    }

    pub fn connected(&self) -> bool {
        self.phase == ConnectionPhase::Open
    }
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for WebSocket reconnection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectConfig {
    /// Reconnect attempts allowed after the initial attempt. Default: 5.
    pub max_attempts: u32,

    /// Delay before the first reconnect. Default: 1s.
    pub base_delay: Duration,

    /// Growth factor per attempt. Default: 2.
    pub backoff_multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
        }
    }
}

/// `delay = base_delay * backoff_multiplier ^ attempt`, saturating at `Duration::MAX`.
pub fn reconnect_delay(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let secs = config.base_delay.as_secs_f64() * config.backoff_multiplier.powi(exponent);
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

// ── Connector seam ───────────────────────────────────────────────────

/// A single WebSocket frame as seen by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Close { code: u16, reason: String },
}

pub type FrameSink = Pin<Box<dyn Sink<Frame, Error = Error> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame, Error>> + Send>>;

/// Opens sockets for the driver. Production code uses
/// [`TungsteniteConnector`]; tests plug in an in-memory pair.
pub trait Connector: Send + Sync + 'static {
    fn connect(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<(FrameSink, FrameStream), Error>> + Send;
}

/// `tokio-tungstenite` backed connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &Url) -> Result<(FrameSink, FrameStream), Error> {
        info!(url = %url, "connecting to WebSocket");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        let (write, read) = ws_stream.split();

        let sink = write
            .sink_map_err(|e| Error::WebSocketConnect(e.to_string()))
            .with(|frame: Frame| future::ready(Ok::<_, Error>(into_message(frame))));

        let stream = read.filter_map(|msg| {
            future::ready(match msg {
                Ok(tungstenite::Message::Text(text)) => Some(Ok(Frame::Text(text.as_str().to_owned()))),
                Ok(tungstenite::Message::Close(frame)) => Some(Ok(from_close_frame(frame))),
                Ok(tungstenite::Message::Ping(_)) => {
                    // tungstenite queues the pong itself
                    trace!("WebSocket ping");
                    None
                }
                Ok(_) => None,
                Err(e) => Some(Err(Error::WebSocketConnect(e.to_string()))),
            })
        });

        Ok((Box::pin(sink), Box::pin(stream)))
    }
}

fn into_message(frame: Frame) -> tungstenite::Message {
    match frame {
        Frame::Text(text) => tungstenite::Message::Text(text.into()),
        Frame::Close { code, reason } => tungstenite::Message::Close(Some(CloseFrame {
            code: CloseCode::from(code),
            reason: reason.into(),
        })),
    }
}

fn from_close_frame(frame: Option<CloseFrame>) -> Frame {
    match frame {
        Some(cf) => Frame::Close {
            code: u16::from(cf.code),
            reason: cf.reason.as_str().to_owned(),
        },
        None => Frame::Close {
            code: NO_STATUS_RECEIVED,
            reason: String::new(),
        },
    }
}

// ── WebSocketClient ──────────────────────────────────────────────────

/// Handle to the push channel. Cheap to clone; all clones share one driver.
pub struct WebSocketClient<C: Connector = TungsteniteConnector> {
    inner: Arc<ClientInner<C>>,
}

impl<C: Connector> Clone for WebSocketClient<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ClientInner<C> {
    url: Url,
    reconnect: ReconnectConfig,
    connector: C,
    status: watch::Sender<ConnectionStatus>,
    listeners: PubSub<TransportEvent>,
    /// Registered channels in first-subscribed order.
    channels: Mutex<Vec<String>>,
    /// Present only while a session is open.
    outbound: Mutex<Option<mpsc::UnboundedSender<Frame>>>,
    driver: Mutex<Option<Driver>>,
    reconnect_enabled: AtomicBool,
}

struct Driver {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

enum SessionEnd {
    Cancelled,
    Closed { code: u16, reason: String },
    Failed(Error),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl WebSocketClient<TungsteniteConnector> {
    pub fn new(url: Url, reconnect: ReconnectConfig) -> Self {
        Self::with_connector(url, reconnect, TungsteniteConnector)
    }
}

impl<C: Connector> WebSocketClient<C> {
    pub fn with_connector(url: Url, reconnect: ReconnectConfig, connector: C) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::idle(&url));
        Self {
            inner: Arc::new(ClientInner {
                url,
                reconnect,
                connector,
                status,
                listeners: PubSub::new(),
                channels: Mutex::new(Vec::new()),
                outbound: Mutex::new(None),
                driver: Mutex::new(None),
                reconnect_enabled: AtomicBool::new(true),
            }),
        }
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the connection driver.
    ///
    /// No-op while a driver is already connecting, open, or waiting to
    /// reconnect. Must be called from within a tokio runtime.
    pub fn connect(&self) {
        let mut driver = lock(&self.inner.driver);
        if driver
            .as_ref()
            .is_some_and(|d| !d.cancel.is_cancelled() && !d.handle.is_finished())
        {
            debug!("connect ignored, driver already running");
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_driver(Arc::clone(&self.inner), cancel.clone()));
        *driver = Some(Driver { cancel, handle });
    }

    /// Close the socket with code 1000 and cancel any pending reconnect.
    ///
    /// Waits for the driver to exit, so no lifecycle event fires after
    /// this returns.
    pub async fn disconnect(&self) {
        let driver = lock(&self.inner.driver).take();
        if let Some(driver) = driver {
            driver.cancel.cancel();
            if let Err(e) = driver.handle.await {
                warn!(error = %e, "WebSocket driver task failed");
            }
        }
        self.inner.set_phase(ConnectionPhase::Closed, 0);
        info!("WebSocket disconnected");
    }

    /// Enable or disable automatic reconnection after an abnormal close.
    pub fn set_reconnect_enabled(&self, enabled: bool) {
        self.inner.reconnect_enabled.store(enabled, Ordering::SeqCst);
        self.inner
            .status
            .send_modify(|s| s.reconnect_enabled = enabled);
    }

    // ── Sending ──────────────────────────────────────────────────────

    /// Hand a text frame to the socket.
    ///
    /// Returns `false` and drops the message when the socket is not open.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        if !self.inner.status.borrow().connected() {
            warn!("WebSocket not open, dropping outbound message");
            return false;
        }
        self.inner.enqueue(Frame::Text(text.into()))
    }

    /// Serialize `message` as JSON and send it.
    pub fn send<T: Serialize>(&self, message: &T) -> bool {
        match serde_json::to_string(message) {
            Ok(text) => self.send_text(text),
            Err(e) => {
                warn!(error = %e, "failed to serialize outbound message");
                false
            }
        }
    }

    // ── Channel subscriptions ────────────────────────────────────────

    /// Register `channel`. Sent immediately when open, and again after
    /// every reconnect.
    pub fn subscribe_channel(&self, channel: impl Into<String>) {
        let channel = channel.into();
        let mut channels = lock(&self.inner.channels);
        if channels.contains(&channel) {
            return;
        }
        debug!(channel, "registering channel");
        self.inner
            .enqueue(Frame::Text(ControlMessage::subscribe(channel.as_str()).to_json()));
        channels.push(channel);
    }

    pub fn unsubscribe_channel(&self, channel: &str) {
        let mut channels = lock(&self.inner.channels);
        let before = channels.len();
        channels.retain(|c| c != channel);
        if channels.len() != before {
            self.inner
                .enqueue(Frame::Text(ControlMessage::unsubscribe(channel).to_json()));
        }
    }

    pub fn channels(&self) -> Vec<String> {
        lock(&self.inner.channels).clone()
    }

    // ── Listeners ────────────────────────────────────────────────────

    /// Listen on a lifecycle topic, a channel, or a `"channel:type"` topic.
    pub fn on<F>(&self, topic: impl Into<String>, handler: F) -> SubscriptionToken
    where
        F: Fn(&TransportEvent) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(topic, handler)
    }

    /// Listen for envelopes on `topic` (a channel or `"channel:type"`).
    pub fn on_message<F>(&self, topic: impl Into<String>, handler: F) -> SubscriptionToken
    where
        F: Fn(&Envelope) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.on(topic, move |event| match event {
            TransportEvent::Message(envelope) => handler(envelope),
            _ => Ok(()),
        })
    }

    pub fn off(&self, token: SubscriptionToken) -> bool {
        self.inner.listeners.unsubscribe(token)
    }

    // ── State observation ────────────────────────────────────────────

    pub fn status(&self) -> ConnectionStatus {
        self.inner.status.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status.subscribe()
    }
}

impl<C: Connector> ClientInner<C> {
    fn set_phase(&self, phase: ConnectionPhase, attempts: u32) {
        let enabled = self.reconnect_enabled.load(Ordering::SeqCst);
        self.status.send_modify(|s| {
            s.phase = phase;
            s.reconnect_attempts = attempts;
            s.reconnect_enabled = enabled;
        });
    }

    fn enqueue(&self, frame: Frame) -> bool {
        match lock(&self.outbound).as_ref() {
            Some(tx) => tx.send(frame).is_ok(),
            None => false,
        }
    }

    fn publish(&self, topic: &str, event: &TransportEvent) {
        self.listeners.publish(topic, event);
    }

    /// Parse a text frame and publish it under both of its topics.
    fn dispatch(&self, text: &str) {
        let envelope: Envelope = match serde_json::from_str(text) {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "failed to parse WebSocket envelope");
                return;
            }
        };

        let topic = envelope.topic();
        let channel = envelope.channel.clone();
        trace!(topic, "dispatching envelope");

        let event = TransportEvent::Message(Arc::new(envelope));
        self.publish(&topic, &event);
        self.publish(&channel, &event);
    }

    /// Attach a freshly opened socket: queue every subscription, mark the
    /// connection open, then pump frames until it ends.
    async fn run_session(
        &self,
        mut sink: FrameSink,
        mut stream: FrameStream,
        cancel: &CancellationToken,
    ) -> SessionEnd {
        let (tx, mut rx) = mpsc::unbounded_channel();
        {
            // Holding the channel lock keeps concurrent subscribe_channel
            // calls from being missed or sent twice.
            let channels = lock(&self.channels);
            for channel in channels.iter() {
                let _ = tx.send(Frame::Text(ControlMessage::subscribe(channel.as_str()).to_json()));
            }
            *lock(&self.outbound) = Some(tx);
            self.set_phase(ConnectionPhase::Open, 0);
        }

        info!(url = %self.url, "WebSocket connected");
        self.publish(topics::CONNECTED, &TransportEvent::Connected);

        let end = loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    let close = Frame::Close {
                        code: NORMAL_CLOSURE,
                        reason: "Manual disconnect".into(),
                    };
                    if let Err(e) = sink.send(close).await {
                        debug!(error = %e, "failed to send close frame");
                    }
                    break SessionEnd::Cancelled;
                }
                Some(frame) = rx.recv() => {
                    if let Err(e) = sink.send(frame).await {
                        break SessionEnd::Failed(e);
                    }
                }
                frame = stream.next() => match frame {
                    Some(Ok(Frame::Text(text))) => self.dispatch(&text),
                    Some(Ok(Frame::Close { code, reason })) => {
                        info!(code, reason = %reason, "WebSocket close frame received");
                        break SessionEnd::Closed { code, reason };
                    }
                    Some(Err(e)) => break SessionEnd::Failed(e),
                    None => {
                        info!("WebSocket stream ended");
                        break SessionEnd::Closed {
                            code: ABNORMAL_CLOSURE,
                            reason: "stream ended".into(),
                        };
                    }
                },
            }
        };

        *lock(&self.outbound) = None;
        self.set_phase(ConnectionPhase::Closed, 0);
        end
    }
}

// ── Background driver ────────────────────────────────────────────────

/// Main loop: connect, pump, and on failure back off and reconnect.
async fn run_driver<C: Connector>(inner: Arc<ClientInner<C>>, cancel: CancellationToken) {
    let mut attempt: u32 = 0;

    loop {
        inner.set_phase(ConnectionPhase::Connecting, attempt);

        let connected = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = inner.connector.connect(&inner.url) => result,
        };

        match connected {
            Ok((sink, stream)) => {
                attempt = 0;
                match inner.run_session(sink, stream, &cancel).await {
                    SessionEnd::Cancelled => break,
                    SessionEnd::Closed { code, reason } => {
                        let normal = code == NORMAL_CLOSURE;
                        if !normal {
                            let err = Error::WebSocketClosed {
                                code,
                                reason: reason.clone(),
                            };
                            warn!(error = %err, "WebSocket closed abnormally");
                            inner.publish(
                                topics::ERROR,
                                &TransportEvent::Error {
                                    message: err.to_string(),
                                },
                            );
                        }
                        inner.publish(
                            topics::DISCONNECTED,
                            &TransportEvent::Disconnected { code, reason },
                        );
                        if normal {
                            info!("WebSocket closed normally, not reconnecting");
                            break;
                        }
                    }
                    SessionEnd::Failed(e) => {
                        warn!(error = %e, "WebSocket session failed");
                        let message = e.to_string();
                        inner.publish(
                            topics::ERROR,
                            &TransportEvent::Error {
                                message: message.clone(),
                            },
                        );
                        inner.publish(
                            topics::DISCONNECTED,
                            &TransportEvent::Disconnected {
                                code: ABNORMAL_CLOSURE,
                                reason: message,
                            },
                        );
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, attempt, "WebSocket connect failed");
                inner.publish(
                    topics::ERROR,
                    &TransportEvent::Error {
                        message: e.to_string(),
                    },
                );
            }
        }

        if !inner.reconnect_enabled.load(Ordering::SeqCst) {
            info!("WebSocket reconnect disabled");
            break;
        }

        if attempt >= inner.reconnect.max_attempts {
            error!(
                max_attempts = inner.reconnect.max_attempts,
                "WebSocket reconnection limit reached, giving up"
            );
            // Retire this driver before announcing, so `connect()` from a
            // listener starts a new one.
            cancel.cancel();
            inner.set_phase(ConnectionPhase::Closed, attempt);
            inner.publish(
                topics::MAX_RECONNECTS_REACHED,
                &TransportEvent::MaxReconnectsReached { attempts: attempt },
            );
            return;
        }

        let delay = reconnect_delay(attempt, &inner.reconnect);
        attempt += 1;
        inner.set_phase(ConnectionPhase::Closed, attempt);
        info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    inner.set_phase(ConnectionPhase::Closed, attempt);
    debug!("WebSocket driver exiting");
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.base_delay, Duration::from_secs(1));
        assert!((config.backoff_multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn delay_grows_geometrically() {
        let config = ReconnectConfig {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            backoff_multiplier: 3.0,
        };

        assert_eq!(reconnect_delay(0, &config), Duration::from_millis(500));
        assert_eq!(reconnect_delay(1, &config), Duration::from_millis(1500));
        assert_eq!(reconnect_delay(2, &config), Duration::from_millis(4500));
    }

    #[test]
    fn delay_saturates_instead_of_overflowing() {
        let config = ReconnectConfig::default();
        assert_eq!(reconnect_delay(u32::MAX, &config), Duration::MAX);
    }

    #[test]
    fn envelope_topic_joins_channel_and_type() {
        let envelope: Envelope = serde_json::from_value(serde_json::json!({
            "channel": "device-status",
            "type": "update",
            "payload": { "device_id": "d1", "status": "offline" }
        }))
        .unwrap();

        assert_eq!(envelope.topic(), "device-status:update");
        assert_eq!(envelope.payload["status"], "offline");
        assert!(envelope.timestamp.is_none());
    }

    #[test]
    fn control_message_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&ControlMessage::subscribe("traffic-updates").to_json()).unwrap();

        assert_eq!(json["type"], "subscribe");
        assert_eq!(json["channel"], "traffic-updates");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn missing_close_payload_maps_to_no_status() {
        assert_eq!(
            from_close_frame(None),
            Frame::Close {
                code: NO_STATUS_RECEIVED,
                reason: String::new()
            }
        );
    }

    #[test]
    fn new_client_is_idle_and_drops_sends() {
        let client = WebSocketClient::new(
            Url::parse("ws://localhost:8080/ws").unwrap(),
            ReconnectConfig::default(),
        );

        let status = client.status();
        assert_eq!(status.phase, ConnectionPhase::Idle);
        assert!(!status.connected());
        assert!(!client.send_text("hello"));
    }

    #[test]
    fn subscribe_channel_deduplicates() {
        let client = WebSocketClient::new(
            Url::parse("ws://localhost:8080/ws").unwrap(),
            ReconnectConfig::default(),
        );

        client.subscribe_channel("network-metrics");
        client.subscribe_channel("device-status");
        client.subscribe_channel("network-metrics");
        assert_eq!(client.channels(), vec!["network-metrics", "device-status"]);

        client.unsubscribe_channel("network-metrics");
        assert_eq!(client.channels(), vec!["device-status"]);
    }
}
