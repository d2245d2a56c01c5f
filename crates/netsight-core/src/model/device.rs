// ── Device domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::ids::{DeviceId, MacAddress};

/// Reachability as reported by the backend. Wire values outside this set
/// are dropped during conversion rather than stored.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeviceStatus {
    Online,
    Warning,
    #[default]
    Offline,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DeviceKind {
    Router,
    Server,
    Printer,
    #[strum(to_string = "workstation", serialize = "desktop", serialize = "laptop")]
    Workstation,
    Iot,
    #[default]
    Unknown,
}

impl DeviceKind {
    /// Parse a wire type string. Anything unrecognised is `Unknown`.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.trim().parse().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMetadata {
    pub manufacturer: Option<String>,
    pub location: Option<String>,
    pub group: Option<String>,
}

/// A device on the monitored network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Absent only for discovery records the backend has not numbered yet.
    pub id: Option<DeviceId>,
    pub address: String,
    pub mac: Option<MacAddress>,
    pub name: Option<String>,
    pub kind: DeviceKind,
    pub status: DeviceStatus,
    pub latency_ms: Option<f64>,
    pub last_seen: Option<DateTime<Utc>>,
    pub uptime: Option<String>,
    pub metadata: DeviceMetadata,
}

impl Device {
    /// Name if known, otherwise the address.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }
}

/// A partial device record. Every field is optional; present fields
/// overwrite, absent fields leave the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceUpdate {
    pub id: Option<DeviceId>,
    pub address: Option<String>,
    pub mac: Option<MacAddress>,
    pub name: Option<String>,
    pub kind: Option<DeviceKind>,
    pub status: Option<DeviceStatus>,
    pub latency_ms: Option<f64>,
    pub last_seen: Option<DateTime<Utc>>,
    pub uptime: Option<String>,
    pub manufacturer: Option<String>,
    pub location: Option<String>,
    pub group: Option<String>,
}

impl DeviceUpdate {
    /// Overwrite every field of `device` that this update carries.
    pub fn apply_to(self, device: &mut Device) {
        fn set<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set(&mut device.id, self.id);
        if let Some(address) = self.address {
            device.address = address;
        }
        set(&mut device.mac, self.mac);
        set(&mut device.name, self.name);
        if let Some(kind) = self.kind {
            device.kind = kind;
        }
        if let Some(status) = self.status {
            device.status = status;
        }
        set(&mut device.latency_ms, self.latency_ms);
        set(&mut device.last_seen, self.last_seen);
        set(&mut device.uptime, self.uptime);
        set(&mut device.metadata.manufacturer, self.manufacturer);
        set(&mut device.metadata.location, self.location);
        set(&mut device.metadata.group, self.group);
    }

    /// Take every field this update leaves absent from `defaults`.
    pub fn fill_missing(&mut self, defaults: DeviceUpdate) {
        fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
            if slot.is_none() {
                *slot = value;
            }
        }

        fill(&mut self.id, defaults.id);
        fill(&mut self.address, defaults.address);
        fill(&mut self.mac, defaults.mac);
        fill(&mut self.name, defaults.name);
        fill(&mut self.kind, defaults.kind);
        fill(&mut self.status, defaults.status);
        fill(&mut self.latency_ms, defaults.latency_ms);
        fill(&mut self.last_seen, defaults.last_seen);
        fill(&mut self.uptime, defaults.uptime);
        fill(&mut self.manufacturer, defaults.manufacturer);
        fill(&mut self.location, defaults.location);
        fill(&mut self.group, defaults.group);
    }

    /// Build a fresh record. Returns `None` without an address, since a
    /// record with neither id nor address could never be matched again.
    pub fn into_device(self) -> Option<Device> {
        let address = self.address.clone()?;
        let mut device = Device {
            id: None,
            address,
            mac: None,
            name: None,
            kind: DeviceKind::default(),
            status: DeviceStatus::default(),
            latency_ms: None,
            last_seen: None,
            uptime: None,
            metadata: DeviceMetadata::default(),
        };
        self.apply_to(&mut device);
        Some(device)
    }
}

impl From<&Device> for DeviceUpdate {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id.clone(),
            address: Some(device.address.clone()),
            mac: device.mac.clone(),
            name: device.name.clone(),
            kind: Some(device.kind),
            status: Some(device.status),
            latency_ms: device.latency_ms,
            last_seen: device.last_seen,
            uptime: device.uptime.clone(),
            manufacturer: device.metadata.manufacturer.clone(),
            location: device.metadata.location.clone(),
            group: device.metadata.group.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_is_case_insensitive_and_closed() {
        assert_eq!("ONLINE".parse::<DeviceStatus>().unwrap(), DeviceStatus::Online);
        assert_eq!("warning".parse::<DeviceStatus>().unwrap(), DeviceStatus::Warning);
        assert!("unknown".parse::<DeviceStatus>().is_err());
        assert_eq!(DeviceStatus::Offline.to_string(), "offline");
    }

    #[test]
    fn kind_aliases() {
        assert_eq!(DeviceKind::parse_lenient("desktop"), DeviceKind::Workstation);
        assert_eq!(DeviceKind::parse_lenient("IoT"), DeviceKind::Iot);
        assert_eq!(DeviceKind::parse_lenient("toaster"), DeviceKind::Unknown);
        assert_eq!(DeviceKind::Workstation.to_string(), "workstation");
    }

    #[test]
    fn absent_fields_are_retained() {
        let mut device = DeviceUpdate {
            address: Some("10.0.0.5".into()),
            name: Some("nas".into()),
            latency_ms: Some(3.0),
            status: Some(DeviceStatus::Online),
            ..DeviceUpdate::default()
        }
        .into_device()
        .unwrap();

        DeviceUpdate {
            status: Some(DeviceStatus::Warning),
            ..DeviceUpdate::default()
        }
        .apply_to(&mut device);

        assert_eq!(device.status, DeviceStatus::Warning);
        assert_eq!(device.name.as_deref(), Some("nas"));
        assert_eq!(device.latency_ms, Some(3.0));
    }

    #[test]
    fn update_without_address_cannot_create() {
        let update = DeviceUpdate {
            id: Some(DeviceId::from("d1")),
            ..DeviceUpdate::default()
        };
        assert!(update.into_device().is_none());
    }
}
