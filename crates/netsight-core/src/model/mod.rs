// ── Domain model ──
//
// Canonical representations of everything the dashboard shows. Wire
// payloads from netsight-api are converted into these types in `convert`.

pub mod device;
pub mod event;
pub mod ids;
pub mod metrics;

pub use device::{Device, DeviceKind, DeviceMetadata, DeviceStatus, DeviceUpdate};
pub use event::{AlertDraft, Event, EventDraft, EventStatus, SecurityAlert, Severity};
pub use ids::{AlertId, DeviceId, EventId, MacAddress};
pub use metrics::{CurrentTraffic, NetworkStats, SystemHealth, TrafficSample, TrafficWindow};
