//! Device command handlers.

use std::sync::Arc;

use tabled::Tabled;

use netsight_core::stream::DeviceFilter;
use netsight_core::{
    Command as CoreCommand, CommandResult, Controller, Device, DeviceKind, DeviceStatus,
    DeviceUpdate,
};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts, StatusArg};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
    #[tabled(rename = "Group")]
    group: String,
}

fn row(d: &Arc<Device>, color: bool) -> DeviceRow {
    DeviceRow {
        id: output::opt_str(d.id.as_ref().map(|id| id.as_str())),
        name: output::opt_str(d.name.as_deref()),
        address: d.address.clone(),
        kind: d.kind.to_string(),
        status: output::paint_status(d.status, color),
        latency: output::latency(d.latency_ms),
        last_seen: d.last_seen.map_or_else(|| "-".into(), output::ago),
        group: output::opt_str(d.metadata.group.as_deref()),
    }
}

fn detail(d: &Arc<Device>) -> String {
    let mut lines = vec![
        format!("ID:           {}", output::opt_str(d.id.as_ref().map(|id| id.as_str()))),
        format!("Name:         {}", d.display_name()),
        format!("Address:      {}", d.address),
        format!(
            "MAC:          {}",
            d.mac.as_ref().map_or_else(|| "-".into(), ToString::to_string)
        ),
        format!("Kind:         {}", d.kind),
        format!("Status:       {}", d.status),
        format!("Latency:      {}", output::latency(d.latency_ms)),
    ];
    if let Some(seen) = d.last_seen {
        lines.push(format!("Last Seen:    {} ({})", seen.to_rfc3339(), output::ago(seen)));
    }
    if let Some(uptime) = &d.uptime {
        lines.push(format!("Uptime:       {uptime}"));
    }
    if let Some(m) = &d.metadata.manufacturer {
        lines.push(format!("Manufacturer: {m}"));
    }
    if let Some(l) = &d.metadata.location {
        lines.push(format!("Location:     {l}"));
    }
    if let Some(g) = &d.metadata.group {
        lines.push(format!("Group:        {g}"));
    }
    lines.join("\n")
}

fn plain_id(d: &Arc<Device>) -> String {
    d.id.as_ref()
        .map_or_else(|| d.address.clone(), ToString::to_string)
}

fn status_filter(status: StatusArg) -> DeviceStatus {
    match status {
        StatusArg::Online => DeviceStatus::Online,
        StatusArg::Warning => DeviceStatus::Warning,
        StatusArg::Offline => DeviceStatus::Offline,
    }
}

fn build_filters(
    status: Option<StatusArg>,
    kind: Option<&str>,
    group: Option<String>,
) -> Result<Vec<DeviceFilter>, CliError> {
    let mut filters = Vec::new();
    if let Some(status) = status {
        filters.push(DeviceFilter::ByStatus(status_filter(status)));
    }
    if let Some(kind) = kind {
        let parsed: DeviceKind = kind.parse().map_err(|_| CliError::Validation {
            field: "kind".into(),
            reason: format!(
                "unknown device kind '{kind}' (expected router, server, printer, workstation, iot)"
            ),
        })?;
        filters.push(DeviceFilter::ByKind(parsed));
    }
    if let Some(group) = group {
        filters.push(DeviceFilter::ByGroup(group));
    }
    Ok(filters)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::load(controller).await?;
    let store = controller.store();
    let color = output::should_color(global.color);

    match args.command {
        DevicesCommand::List {
            status,
            kind,
            group,
        } => {
            let filters = build_filters(status, kind.as_deref(), group)?;
            let devices: Vec<Arc<Device>> = store
                .devices_snapshot()
                .iter()
                .filter(|d| filters.iter().all(|f| f.matches(d)))
                .cloned()
                .collect();
            let out = output::render_list(global.output, &devices, |d| row(d, color), plain_id)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { device } => {
            let id = util::resolve_device_id(controller, &device)?;
            let found = store
                .device_by_id(&id)
                .ok_or_else(|| CliError::device_not_found(&device))?;
            let out = output::render_single(global.output, &found, detail, plain_id)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Update {
            device,
            name,
            location,
            group,
        } => {
            if name.is_none() && location.is_none() && group.is_none() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "nothing to change; pass --name, --location, or --group".into(),
                });
            }
            let id = util::resolve_device_id(controller, &device)?;
            let update = DeviceUpdate {
                name,
                location,
                group,
                ..DeviceUpdate::default()
            };
            let result = controller
                .execute(CoreCommand::UpdateDevice { id, update })
                .await?;
            if let CommandResult::Device(updated) = result {
                let out = output::render_single(global.output, &updated, detail, plain_id)?;
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }

        DevicesCommand::Trace { device } => {
            let id = util::resolve_device_id(controller, &device)?;
            let result = controller.execute(CoreCommand::TraceDevice { id }).await?;
            if let CommandResult::Trace(hops) = result {
                let out = output::render_json(&hops, false)?;
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(matches!(
            build_filters(None, Some("toaster"), None),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn filters_stack() {
        let filters =
            build_filters(Some(StatusArg::Online), Some("laptop"), Some("lab".into())).unwrap();
        assert_eq!(filters.len(), 3);
        assert!(matches!(filters[1], DeviceFilter::ByKind(DeviceKind::Workstation)));
    }
}
