//! Live watch: start the controller and print store changes as they land.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use netsight_core::stream::EventFilter;
use netsight_core::{
    AlertId, ConnectionPhase, Controller, Device, DeviceStatus, Event, EventId, NetworkStats,
    SecurityAlert,
};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

// ── Watch lines ─────────────────────────────────────────────────────

/// One reported change. Structured output emits these as JSON lines.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
enum WatchLine {
    Connection {
        phase: ConnectionPhase,
        attempts: u32,
    },
    DeviceAdded {
        device: Arc<Device>,
    },
    DeviceStatus {
        device: Arc<Device>,
        previous: DeviceStatus,
    },
    DeviceRemoved {
        key: String,
    },
    Event {
        event: Arc<Event>,
    },
    Alert {
        alert: Arc<SecurityAlert>,
    },
    Stats {
        stats: NetworkStats,
    },
}

impl WatchLine {
    fn render(&self, color: bool) -> String {
        match self {
            Self::Connection { phase, attempts } if *attempts > 0 => {
                format!("push channel {phase} (attempt {attempts})")
            }
            Self::Connection { phase, .. } => format!("push channel {phase}"),
            Self::DeviceAdded { device } => format!(
                "+ {} ({}) {}",
                device.display_name(),
                device.address,
                output::paint_status(device.status, color)
            ),
            Self::DeviceStatus { device, previous } => format!(
                "~ {} ({}) {} -> {}",
                device.display_name(),
                device.address,
                output::paint_status(*previous, color),
                output::paint_status(device.status, color)
            ),
            Self::DeviceRemoved { key } => format!("- {key} removed"),
            Self::Event { event } => format!(
                "[{}] {} {}: {}",
                output::paint_severity(event.severity, color),
                event.timestamp.format("%H:%M:%S"),
                event.category,
                event.description
            ),
            Self::Alert { alert } => format!(
                "! {} alert from {}: {}",
                output::paint_severity(alert.severity, color),
                alert.source.as_deref().unwrap_or("unknown source"),
                alert.description
            ),
            Self::Stats { stats } => format!(
                "stats: uptime {:.1}% | bandwidth {} | devices {} | alerts {}",
                stats.uptime_pct,
                output::mbps(stats.bandwidth_mbps),
                stats.devices_total,
                stats.alerts_active
            ),
        }
    }
}

// ── Change tracking ─────────────────────────────────────────────────

fn device_key(d: &Device) -> String {
    d.id.as_ref()
        .map_or_else(|| d.address.clone(), ToString::to_string)
}

/// Remembers what has already been printed so each snapshot only yields
/// what is new.
#[derive(Default)]
struct Tracker {
    statuses: HashMap<String, DeviceStatus>,
    events: HashSet<EventId>,
    alerts: HashSet<AlertId>,
}

impl Tracker {
    fn seed(
        &mut self,
        devices: &[Arc<Device>],
        events: &[Arc<Event>],
        alerts: &[Arc<SecurityAlert>],
    ) {
        self.statuses = devices.iter().map(|d| (device_key(d), d.status)).collect();
        self.events = events.iter().map(|e| e.id.clone()).collect();
        self.alerts = alerts.iter().map(|a| a.id.clone()).collect();
    }

    fn devices(&mut self, snapshot: &[Arc<Device>]) -> Vec<WatchLine> {
        let mut lines = Vec::new();
        let mut current = HashMap::with_capacity(snapshot.len());

        for device in snapshot {
            let key = device_key(device);
            match self.statuses.get(&key) {
                None => lines.push(WatchLine::DeviceAdded {
                    device: Arc::clone(device),
                }),
                Some(&previous) if previous != device.status => {
                    lines.push(WatchLine::DeviceStatus {
                        device: Arc::clone(device),
                        previous,
                    });
                }
                Some(_) => {}
            }
            current.insert(key, device.status);
        }

        let mut removed: Vec<String> = self
            .statuses
            .keys()
            .filter(|k| !current.contains_key(*k))
            .cloned()
            .collect();
        removed.sort();
        lines.extend(removed.into_iter().map(|key| WatchLine::DeviceRemoved { key }));

        self.statuses = current;
        lines
    }

    /// New events, oldest first.
    fn events(&mut self, snapshot: &[Arc<Event>], filter: &EventFilter) -> Vec<WatchLine> {
        let fresh: Vec<WatchLine> = snapshot
            .iter()
            .filter(|e| !self.events.contains(&e.id))
            .filter(|e| filter.matches(e))
            .rev()
            .map(|e| WatchLine::Event {
                event: Arc::clone(e),
            })
            .collect();
        self.events = snapshot.iter().map(|e| e.id.clone()).collect();
        fresh
    }

    fn alerts(&mut self, snapshot: &[Arc<SecurityAlert>]) -> Vec<WatchLine> {
        let fresh = snapshot
            .iter()
            .filter(|a| !self.alerts.contains(&a.id))
            .rev()
            .map(|a| WatchLine::Alert {
                alert: Arc::clone(a),
            })
            .collect();
        self.alerts = snapshot.iter().map(|a| a.id.clone()).collect();
        fresh
    }
}

// ── Handler ─────────────────────────────────────────────────────────

fn emit(lines: &[WatchLine], global: &GlobalOpts, color: bool) -> Result<(), CliError> {
    for line in lines {
        let rendered = match global.output {
            OutputFormat::Table | OutputFormat::Plain => line.render(color),
            OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
                output::render_json(line, true)?
            }
        };
        output::print_output(&rendered, global.quiet);
    }
    Ok(())
}

pub async fn handle(
    controller: &Controller,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    let filter = args
        .min_severity
        .map_or(EventFilter::All, |s| EventFilter::MinSeverity(super::util::severity(s)));

    let report = controller.start().await?;
    if !report.reachable && !global.quiet {
        eprintln!(
            "Backend at {} is unreachable; waiting for it to come back",
            controller.config().base_url
        );
    }

    let store = controller.store();
    let mut devices = store.subscribe_devices();
    let mut events = store.subscribe_events();
    let mut alerts = store.subscribe_alerts();
    let mut stats = store.subscribe_network_stats();
    let mut connection = controller.subscribe_connection();

    let mut tracker = Tracker::default();
    tracker.seed(devices.current(), events.current(), alerts.current());
    if !global.quiet {
        eprintln!(
            "Watching {} ({} devices). Press Ctrl-C to stop.",
            controller.config().base_url,
            devices.current().len()
        );
    }

    let deadline = async {
        match args.duration {
            Some(d) => tokio::time::sleep(d.into()).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let outcome = loop {
        let lines = tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break Ok(()),
            () = &mut deadline => break Ok(()),
            Ok(()) = connection.changed() => {
                let status = connection.borrow_and_update().clone();
                vec![WatchLine::Connection {
                    phase: status.phase,
                    attempts: status.reconnect_attempts,
                }]
            }
            Some(snapshot) = devices.changed() => tracker.devices(&snapshot),
            Some(snapshot) = events.changed() => tracker.events(&snapshot, &filter),
            Some(snapshot) = alerts.changed() => tracker.alerts(&snapshot),
            Ok(()) = stats.changed() => {
                let latest = *stats.borrow_and_update();
                latest.map(|stats| WatchLine::Stats { stats }).into_iter().collect()
            }
        };
        if let Err(e) = emit(&lines, global, color) {
            break Err(e);
        }
    };

    debug!("stopping watch");
    controller.stop().await;
    outcome
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use netsight_core::{DataStore, DeviceUpdate, EventDraft, Severity};

    fn device(id: &str, status: DeviceStatus) -> DeviceUpdate {
        DeviceUpdate {
            id: Some(id.into()),
            address: Some(format!("10.0.0.{}", id.len())),
            status: Some(status),
            ..DeviceUpdate::default()
        }
    }

    #[test]
    fn device_changes_are_reported_once() {
        let store = DataStore::default();
        store.upsert_device(device("a", DeviceStatus::Online));

        let mut tracker = Tracker::default();
        tracker.seed(&store.devices_snapshot(), &[], &[]);

        store.upsert_device(device("a", DeviceStatus::Offline));
        store.upsert_device(device("bb", DeviceStatus::Online));
        let lines = tracker.devices(&store.devices_snapshot());
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().any(|l| matches!(
            l,
            WatchLine::DeviceStatus {
                previous: DeviceStatus::Online,
                ..
            }
        )));
        assert!(lines.iter().any(|l| matches!(l, WatchLine::DeviceAdded { .. })));

        assert!(tracker.devices(&store.devices_snapshot()).is_empty());

        store.remove_device(&"bb".into());
        let lines = tracker.devices(&store.devices_snapshot());
        assert!(matches!(&lines[..], [WatchLine::DeviceRemoved { key }] if key == "bb"));
    }

    #[test]
    fn only_new_events_pass_the_filter() {
        let store = DataStore::default();
        store.append_event(EventDraft::new("Connection", "old", Severity::Critical));

        let mut tracker = Tracker::default();
        tracker.seed(&[], &store.events_snapshot(), &[]);

        store.append_event(EventDraft::new("Connection", "quiet", Severity::Info));
        store.append_event(EventDraft::new("Security", "loud", Severity::Critical));

        let filter = EventFilter::MinSeverity(Severity::Warning);
        let lines = tracker.events(&store.events_snapshot(), &filter);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].render(false).contains("loud"));
        assert!(tracker.events(&store.events_snapshot(), &filter).is_empty());
    }
}
