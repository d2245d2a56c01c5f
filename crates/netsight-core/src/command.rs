// ── Command API ──
//
// Every user-initiated operation flows through a single `Command` enum.
// `Controller::execute` routes each variant to the Request Client and/or
// the DataStore.

use std::sync::Arc;

use crate::error::CoreError;
use crate::model::{AlertId, Device, DeviceId, DeviceUpdate};

/// All user-initiated operations.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Device diagnostics ───────────────────────────────────────────
    PingDevice { id: DeviceId },
    TraceDevice { id: DeviceId },
    /// Ping each device in turn, pausing briefly between them.
    BulkPing { ids: Vec<DeviceId> },
    ScanDevices,

    // ── Device inventory ─────────────────────────────────────────────
    /// Insert a device locally. Rejected without an address.
    AddDevice { device: DeviceUpdate },
    /// Forget a device locally.
    RemoveDevice { id: DeviceId },
    /// Send the change to the backend, then merge what it returns.
    UpdateDevice { id: DeviceId, update: DeviceUpdate },

    // ── Selection ────────────────────────────────────────────────────
    SelectDevice { id: DeviceId },
    DeselectDevice { id: DeviceId },

    // ── Security ─────────────────────────────────────────────────────
    AcknowledgeAlert { id: AlertId },
}

/// Result of a ping, after it has been merged into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PingOutcome {
    pub latency_ms: Option<f64>,
    pub reachable: bool,
    pub device: Arc<Device>,
}

/// Result of executing a [`Command`].
#[derive(Debug)]
pub enum CommandResult {
    Ok,
    Ping(PingOutcome),
    Trace(serde_json::Value),
    Scan { discovered: usize, inserted: usize },
    Device(Arc<Device>),
    BulkPing(Vec<(DeviceId, Result<PingOutcome, CoreError>)>),
}
