//! Shared helpers for command handlers.

use tracing::warn;

use netsight_core::{BootstrapReport, Controller, DeviceId, Severity};

use crate::cli::SeverityArg;
use crate::error::CliError;

/// Run the initial REST load. An unreachable backend is an error for
/// one-shot commands; a partial load is not.
pub async fn load(controller: &Controller) -> Result<BootstrapReport, CliError> {
    let report = controller.bootstrap().await;
    if !report.reachable {
        return Err(CliError::Unreachable {
            url: controller.config().base_url.to_string(),
        });
    }
    for (part, reason) in &report.failed {
        warn!(part = *part, reason = %reason, "partial data");
    }
    Ok(report)
}

/// Resolve a device id or address to a device id via the loaded store.
pub fn resolve_device_id(controller: &Controller, identifier: &str) -> Result<DeviceId, CliError> {
    let store = controller.store();
    let id = DeviceId::from(identifier);
    if store.device_by_id(&id).is_some() {
        return Ok(id);
    }

    let device = store
        .device_by_address(identifier)
        .ok_or_else(|| CliError::device_not_found(identifier))?;
    device.id.clone().ok_or_else(|| CliError::Validation {
        field: "device".into(),
        reason: format!("device at {identifier} has not been assigned an id yet"),
    })
}

pub fn severity(arg: SeverityArg) -> Severity {
    match arg {
        SeverityArg::Info => Severity::Info,
        SeverityArg::Warning => Severity::Warning,
        SeverityArg::Critical => Severity::Critical,
    }
}
