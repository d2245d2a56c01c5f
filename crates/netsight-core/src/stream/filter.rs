// ── Filter predicates for entity streams ──
//
// Used by the CLI to filter snapshots without re-querying the API.

use crate::model::{Device, DeviceKind, DeviceStatus, Event, Severity};

/// Filter predicate for device collections.
pub enum DeviceFilter {
    All,
    ByKind(DeviceKind),
    ByStatus(DeviceStatus),
    ByGroup(String),
    Custom(Box<dyn Fn(&Device) -> bool + Send + Sync>),
}

impl DeviceFilter {
    pub fn matches(&self, device: &Device) -> bool {
        match self {
            Self::All => true,
            Self::ByKind(kind) => device.kind == *kind,
            Self::ByStatus(status) => device.status == *status,
            Self::ByGroup(group) => device.metadata.group.as_deref() == Some(group.as_str()),
            Self::Custom(f) => f(device),
        }
    }
}

/// Filter predicate for the event log.
pub enum EventFilter {
    All,
    /// Events at or above the given severity.
    MinSeverity(Severity),
    ByDevice(String),
    Custom(Box<dyn Fn(&Event) -> bool + Send + Sync>),
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Self::All => true,
            Self::MinSeverity(min) => event.severity >= *min,
            Self::ByDevice(address) => event.device.as_deref() == Some(address.as_str()),
            Self::Custom(f) => f(event),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{DeviceUpdate, EventDraft, EventId};

    #[test]
    fn device_filters() {
        let device = DeviceUpdate {
            address: Some("10.0.0.2".into()),
            kind: Some(DeviceKind::Printer),
            status: Some(DeviceStatus::Warning),
            group: Some("office".into()),
            ..DeviceUpdate::default()
        }
        .into_device()
        .unwrap();

        assert!(DeviceFilter::ByKind(DeviceKind::Printer).matches(&device));
        assert!(!DeviceFilter::ByStatus(DeviceStatus::Online).matches(&device));
        assert!(DeviceFilter::ByGroup("office".into()).matches(&device));
        assert!(DeviceFilter::Custom(Box::new(|d| d.address.starts_with("10."))).matches(&device));
    }

    #[test]
    fn severity_floor() {
        let event = EventDraft::new("Connection", "link flap", Severity::Warning)
            .finish(EventId::from("e1"));
        assert!(EventFilter::MinSeverity(Severity::Info).matches(&event));
        assert!(EventFilter::MinSeverity(Severity::Warning).matches(&event));
        assert!(!EventFilter::MinSeverity(Severity::Critical).matches(&event));
    }
}
