//! Status overview handler.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use netsight_core::{Controller, DeviceStatus, NetworkStats, SystemHealth};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Default, Serialize)]
struct DeviceCounts {
    total: usize,
    online: usize,
    warning: usize,
    offline: usize,
}

#[derive(Debug, Serialize)]
struct StatusSummary {
    backend: String,
    loaded: Vec<&'static str>,
    failed: Vec<String>,
    devices: DeviceCounts,
    open_alerts: usize,
    network: Option<NetworkStats>,
    system: Option<SystemHealth>,
    last_update: Option<DateTime<Utc>>,
}

fn detail(s: &StatusSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Backend:      {}", s.backend);
    let _ = writeln!(
        out,
        "Devices:      {} ({} online, {} warning, {} offline)",
        s.devices.total, s.devices.online, s.devices.warning, s.devices.offline
    );
    let _ = writeln!(out, "Open alerts:  {}", s.open_alerts);
    if let Some(n) = &s.network {
        let _ = writeln!(out, "Uptime:       {:.1}% ({:+.1})", n.uptime_pct, n.uptime_change);
        let _ = writeln!(
            out,
            "Bandwidth:    {} ({:+.1})",
            output::mbps(n.bandwidth_mbps),
            n.bandwidth_change
        );
    }
    if let Some(h) = &s.system {
        let _ = writeln!(
            out,
            "CPU/Mem/Disk: {:.0}% / {:.0}% / {:.0}%",
            h.cpu_usage, h.memory_usage, h.disk_usage
        );
    }
    if let Some(at) = s.last_update {
        let _ = writeln!(out, "Updated:      {}", output::ago(at));
    }
    if !s.failed.is_empty() {
        let _ = writeln!(out, "Unavailable:  {}", s.failed.join(", "));
    }
    out.trim_end().to_owned()
}

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let report = util::load(controller).await?;
    let store = controller.store();

    let mut devices = DeviceCounts::default();
    for d in store.devices_snapshot().iter() {
        devices.total += 1;
        match d.status {
            DeviceStatus::Online => devices.online += 1,
            DeviceStatus::Warning => devices.warning += 1,
            DeviceStatus::Offline => devices.offline += 1,
        }
    }

    let summary = StatusSummary {
        backend: controller.config().base_url.to_string(),
        loaded: report.loaded,
        failed: report.failed.into_iter().map(|(part, _)| part.to_owned()).collect(),
        devices,
        open_alerts: store
            .alerts_snapshot()
            .iter()
            .filter(|a| !a.acknowledged)
            .count(),
        network: store.network_stats(),
        system: store.system_health(),
        last_update: store.last_data_update(),
    };

    let out = output::render_single(global.output, &summary, detail, |s| {
        format!("{} {}", s.backend, s.devices.total)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
