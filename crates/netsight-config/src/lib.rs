//! Configuration for netsight.
//!
//! Layered TOML + environment loading, validation into
//! `netsight_core::SyncConfig`, and bearer token resolution
//! (env var, then system keyring, then plaintext).

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use netsight_api::rest::{CredentialStore, EndpointTable, RetryPolicy};
use netsight_api::transport::{TlsMode, TransportConfig};
use netsight_api::websocket::ReconnectConfig;
use netsight_core::{ChannelTable, PollingIntervals, StoreLimits, SyncConfig};

/// Environment variable consulted for the token unless `api.token_env`
/// names another.
pub const DEFAULT_TOKEN_ENV: &str = "NETSIGHT_TOKEN";

const ENV_PREFIX: &str = "NETSIGHT_";
const KEYRING_SERVICE: &str = "netsight";
const KEYRING_USER: &str = "api-token";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown config key '{key}'")]
    UnknownKey { key: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiSection,
    pub websocket: WebSocketSection,
    pub polling: PollingSection,
    pub dashboard: DashboardSection,
}

/// `[api]`: the REST backend.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiSection {
    /// Base URL including any path prefix (e.g. "http://nms.lan:8080/api/v1").
    pub base_url: String,

    pub timeout_secs: u64,

    /// Retries after the first attempt.
    pub retry_attempts: u32,

    pub retry_base_ms: u64,

    /// Also retry POST requests not known to be idempotent.
    pub retry_post: bool,

    /// Accept invalid TLS certificates.
    pub insecure: bool,

    /// Environment variable holding the bearer token.
    pub token_env: String,

    /// Bearer token in plaintext. Prefer the keyring or `token_env`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Route overrides; unset routes keep their defaults.
    pub endpoints: EndpointTable,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/v1".into(),
            timeout_secs: 30,
            retry_attempts: 3,
            retry_base_ms: 1000,
            retry_post: false,
            insecure: false,
            token_env: DEFAULT_TOKEN_ENV.into(),
            token: None,
            endpoints: EndpointTable::default(),
        }
    }
}

/// `[websocket]`: the push channel.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WebSocketSection {
    pub url: String,
    pub enabled: bool,
    pub channels: ChannelsSection,
    pub reconnect: ReconnectSection,
}

impl Default for WebSocketSection {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080/ws".into(),
            enabled: true,
            channels: ChannelsSection::default(),
            reconnect: ReconnectSection::default(),
        }
    }
}

/// `[websocket.channels]`: channel name per data class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChannelsSection {
    pub metrics: String,
    pub system_health: String,
    pub events: String,
    pub alerts: String,
    pub device_status: String,
    pub traffic: String,
    pub device_discovered: String,
    pub device_removed: String,
}

impl Default for ChannelsSection {
    fn default() -> Self {
        let table = ChannelTable::default();
        Self {
            metrics: table.metrics,
            system_health: table.system_health,
            events: table.events,
            alerts: table.alerts,
            device_status: table.device_status,
            traffic: table.traffic,
            device_discovered: table.device_discovered,
            device_removed: table.device_removed,
        }
    }
}

impl From<&ChannelsSection> for ChannelTable {
    fn from(section: &ChannelsSection) -> Self {
        Self {
            metrics: section.metrics.clone(),
            system_health: section.system_health.clone(),
            events: section.events.clone(),
            alerts: section.alerts.clone(),
            device_status: section.device_status.clone(),
            traffic: section.traffic.clone(),
            device_discovered: section.device_discovered.clone(),
            device_removed: section.device_removed.clone(),
        }
    }
}

/// `[websocket.reconnect]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconnectSection {
    /// Attempts after the initial connection.
    pub max_attempts: u32,
    pub base_ms: u64,
    pub multiplier: f64,
}

impl Default for ReconnectSection {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_ms: 1000,
            multiplier: 2.0,
        }
    }
}

/// `[polling]`: intervals in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingSection {
    pub network_stats_ms: u64,
    pub device_status_ms: u64,
    pub traffic_ms: u64,
    pub events_ms: u64,
    /// Sweep interval while the push channel is live.
    pub backup_ms: u64,
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            network_stats_ms: 10_000,
            device_status_ms: 15_000,
            traffic_ms: 5_000,
            events_ms: 30_000,
            backup_ms: 30_000,
        }
    }
}

/// `[dashboard]`: retention limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardSection {
    pub max_events: usize,
    pub max_alerts: usize,
    pub traffic_window: usize,
}

impl Default for DashboardSection {
    fn default() -> Self {
        let limits = StoreLimits::default();
        Self {
            max_events: limits.max_events,
            max_alerts: limits.max_alerts,
            traffic_window: limits.traffic_window,
        }
    }
}

// ── Validation & translation ────────────────────────────────────────

impl Config {
    /// Validate and translate into the runtime sync configuration.
    pub fn to_sync_config(&self) -> Result<SyncConfig, ConfigError> {
        let base_url = parse_url("api.base_url", &self.api.base_url, &["http", "https"])?;
        let websocket_url = parse_url("websocket.url", &self.websocket.url, &["ws", "wss"])?;

        if self.api.timeout_secs == 0 {
            return Err(invalid("api.timeout_secs", "must be greater than zero"));
        }
        self.api
            .endpoints
            .validate()
            .map_err(|e| invalid("api.endpoints", e.to_string()))?;

        let reconnect = &self.websocket.reconnect;
        if !reconnect.multiplier.is_finite() || reconnect.multiplier < 1.0 {
            return Err(invalid(
                "websocket.reconnect.multiplier",
                format!("must be at least 1, got {}", reconnect.multiplier),
            ));
        }

        let polling = &self.polling;
        let intervals = PollingIntervals {
            network_stats: non_zero_ms("polling.network_stats_ms", polling.network_stats_ms)?,
            device_status: non_zero_ms("polling.device_status_ms", polling.device_status_ms)?,
            traffic: non_zero_ms("polling.traffic_ms", polling.traffic_ms)?,
            events: non_zero_ms("polling.events_ms", polling.events_ms)?,
            backup: non_zero_ms("polling.backup_ms", polling.backup_ms)?,
        };

        let dashboard = &self.dashboard;
        for (field, value) in [
            ("dashboard.max_events", dashboard.max_events),
            ("dashboard.max_alerts", dashboard.max_alerts),
            ("dashboard.traffic_window", dashboard.traffic_window),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be greater than zero"));
            }
        }

        let mut sync = SyncConfig::new(base_url, websocket_url);
        sync.endpoints = self.api.endpoints.clone();
        sync.request_timeout = Duration::from_secs(self.api.timeout_secs);
        sync.retry = RetryPolicy {
            max_retries: self.api.retry_attempts,
            base_delay: Duration::from_millis(self.api.retry_base_ms),
            retry_post: self.api.retry_post,
            ..RetryPolicy::default()
        };
        sync.transport = TransportConfig {
            tls: if self.api.insecure {
                TlsMode::DangerAcceptInvalid
            } else {
                TlsMode::System
            },
            ..TransportConfig::default()
        };
        sync.websocket_enabled = self.websocket.enabled;
        sync.channels = ChannelTable::from(&self.websocket.channels);
        sync.reconnect = ReconnectConfig {
            max_attempts: reconnect.max_attempts,
            base_delay: Duration::from_millis(reconnect.base_ms),
            backoff_multiplier: reconnect.multiplier,
        };
        sync.polling = intervals;
        sync.limits = StoreLimits {
            max_events: dashboard.max_events,
            max_alerts: dashboard.max_alerts,
            traffic_window: dashboard.traffic_window,
        };
        Ok(sync)
    }

    /// Set one value by dotted key, e.g. `polling.traffic_ms`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "api.base_url" => self.api.base_url = value.into(),
            "api.timeout_secs" => self.api.timeout_secs = parse_value(key, value)?,
            "api.retry_attempts" => self.api.retry_attempts = parse_value(key, value)?,
            "api.retry_base_ms" => self.api.retry_base_ms = parse_value(key, value)?,
            "api.retry_post" => self.api.retry_post = parse_value(key, value)?,
            "api.insecure" => self.api.insecure = parse_value(key, value)?,
            "api.token_env" => self.api.token_env = value.into(),
            "api.token" => self.api.token = Some(value.into()),

            "websocket.url" => self.websocket.url = value.into(),
            "websocket.enabled" => self.websocket.enabled = parse_value(key, value)?,
            "websocket.reconnect.max_attempts" => {
                self.websocket.reconnect.max_attempts = parse_value(key, value)?;
            }
            "websocket.reconnect.base_ms" => {
                self.websocket.reconnect.base_ms = parse_value(key, value)?;
            }
            "websocket.reconnect.multiplier" => {
                self.websocket.reconnect.multiplier = parse_value(key, value)?;
            }

            "polling.network_stats_ms" => self.polling.network_stats_ms = parse_value(key, value)?,
            "polling.device_status_ms" => self.polling.device_status_ms = parse_value(key, value)?,
            "polling.traffic_ms" => self.polling.traffic_ms = parse_value(key, value)?,
            "polling.events_ms" => self.polling.events_ms = parse_value(key, value)?,
            "polling.backup_ms" => self.polling.backup_ms = parse_value(key, value)?,

            "dashboard.max_events" => self.dashboard.max_events = parse_value(key, value)?,
            "dashboard.max_alerts" => self.dashboard.max_alerts = parse_value(key, value)?,
            "dashboard.traffic_window" => self.dashboard.traffic_window = parse_value(key, value)?,

            other => {
                return Err(ConfigError::UnknownKey { key: other.into() });
            }
        }
        Ok(())
    }

    /// TOML rendering with the plaintext token masked.
    pub fn to_redacted_toml(&self) -> Result<String, ConfigError> {
        let mut masked = self.clone();
        if masked.api.token.is_some() {
            masked.api.token = Some("****".into());
        }
        Ok(toml::to_string_pretty(&masked)?)
    }
}

fn parse_url(field: &str, raw: &str, schemes: &[&str]) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| invalid(field, format!("'{raw}': {e}")))?;
    if !schemes.contains(&url.scheme()) {
        return Err(invalid(
            field,
            format!("scheme must be one of {}, got '{}'", schemes.join("/"), url.scheme()),
        ));
    }
    Ok(url)
}

fn non_zero_ms(field: &str, ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(invalid(field, "must be greater than zero"));
    }
    Ok(Duration::from_millis(ms))
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| invalid(key, format!("'{value}': {e}")))
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "netsight", "netsight").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("netsight");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path` (if present), then
/// `NETSIGHT_`-prefixed environment variables with `__` between
/// sections, e.g. `NETSIGHT_POLLING__TRAFFIC_MS=2000`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    Ok(figment.extract()?)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Env,
    Keyring,
    Plaintext,
}

impl TokenSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Env => "environment",
            Self::Keyring => "keyring",
            Self::Plaintext => "config file",
        }
    }
}

/// [`CredentialStore`] that walks env var -> keyring -> plaintext on
/// every call, so a token stored or exported mid-session is picked up.
#[derive(Debug, Clone)]
pub struct TokenStore {
    env_var: String,
    plaintext: Option<SecretString>,
    use_keyring: bool,
}

impl TokenStore {
    pub fn from_config(api: &ApiSection) -> Self {
        Self {
            env_var: api.token_env.clone(),
            plaintext: api.token.clone().map(SecretString::from),
            use_keyring: true,
        }
    }

    /// Skip the system keyring (headless CI, tests).
    pub fn without_keyring(mut self) -> Self {
        self.use_keyring = false;
        self
    }

    pub fn resolve(&self) -> Option<(SecretString, TokenSource)> {
        // 1. Environment variable
        if let Some(token) = std::env::var(&self.env_var).ok().filter(|t| !t.is_empty()) {
            return Some((SecretString::from(token), TokenSource::Env));
        }

        // 2. System keyring
        if self.use_keyring {
            if let Some(token) = keyring_entry().ok().and_then(|e| e.get_password().ok()) {
                return Some((SecretString::from(token), TokenSource::Keyring));
            }
        }

        // 3. Plaintext in config
        self.plaintext
            .clone()
            .map(|token| (token, TokenSource::Plaintext))
    }
}

impl CredentialStore for TokenStore {
    fn bearer_token(&self) -> Option<SecretString> {
        self.resolve().map(|(token, _)| token)
    }
}

fn keyring_entry() -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)?)
}

/// Store the bearer token in the system keyring.
pub fn store_token(token: &str) -> Result<(), ConfigError> {
    if token.trim().is_empty() {
        return Err(invalid("token", "cannot be empty"));
    }
    keyring_entry()?.set_password(token)?;
    Ok(())
}

/// Remove the keyring token. Returns `false` if none was stored.
pub fn clear_token() -> Result<bool, ConfigError> {
    match keyring_entry()?.delete_credential() {
        Ok(()) => Ok(true),
        Err(keyring::Error::NoEntry) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
