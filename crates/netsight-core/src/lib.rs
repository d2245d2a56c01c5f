// netsight-core: reconciliation layer between netsight-api and consumers (CLI).

pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod model;
pub mod poller;
pub mod scheduler;
pub mod store;
pub mod stream;

mod push;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult, PingOutcome};
pub use config::{ChannelTable, PollingIntervals, StoreLimits, SyncConfig};
pub use controller::Controller;
pub use error::CoreError;
pub use poller::{BootstrapReport, RestPoller};
pub use scheduler::{PollCategory, Poller, PollingMode, PollingScheduler};
pub use store::{DataStore, MergeOutcome};
pub use stream::EntityStream;

pub use model::{
    AlertDraft, AlertId, CurrentTraffic, Device, DeviceId, DeviceKind, DeviceMetadata,
    DeviceStatus, DeviceUpdate, Event, EventDraft, EventId, EventStatus, MacAddress,
    NetworkStats, SecurityAlert, Severity, SystemHealth, TrafficSample, TrafficWindow,
};

// Transport state is owned by the api crate; re-exported for consumers.
pub use netsight_api::websocket::{ConnectionPhase, ConnectionStatus};
