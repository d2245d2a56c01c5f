//! Ping and scan handlers.

use serde::Serialize;
use tabled::Tabled;

use netsight_core::{Command as CoreCommand, CommandResult, Controller, DeviceId, PingOutcome};

use crate::cli::{GlobalOpts, PingArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct PingLine {
    device: String,
    address: Option<String>,
    reachable: bool,
    latency_ms: Option<f64>,
    error: Option<String>,
}

impl PingLine {
    fn from_outcome(id: &DeviceId, outcome: Result<PingOutcome, String>) -> Self {
        match outcome {
            Ok(p) => Self {
                device: id.to_string(),
                address: Some(p.device.address.clone()),
                reachable: p.reachable,
                latency_ms: p.latency_ms,
                error: None,
            },
            Err(error) => Self {
                device: id.to_string(),
                address: None,
                reachable: false,
                latency_ms: None,
                error: Some(error),
            },
        }
    }
}

#[derive(Tabled)]
struct PingRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Reachable")]
    reachable: String,
    #[tabled(rename = "Latency")]
    latency: String,
}

impl From<&PingLine> for PingRow {
    fn from(p: &PingLine) -> Self {
        Self {
            device: p.device.clone(),
            address: output::opt_str(p.address.as_deref()),
            reachable: match (&p.error, p.reachable) {
                (Some(e), _) => format!("error: {e}"),
                (None, true) => "yes".into(),
                (None, false) => "no".into(),
            },
            latency: output::latency(p.latency_ms),
        }
    }
}

pub async fn ping(
    controller: &Controller,
    args: PingArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::load(controller).await?;

    let ids = args
        .devices
        .iter()
        .map(|d| util::resolve_device_id(controller, d))
        .collect::<Result<Vec<_>, _>>()?;

    let lines: Vec<PingLine> = if let [id] = ids.as_slice() {
        let result = controller
            .execute(CoreCommand::PingDevice { id: id.clone() })
            .await?;
        match result {
            CommandResult::Ping(outcome) => vec![PingLine::from_outcome(id, Ok(outcome))],
            _ => Vec::new(),
        }
    } else {
        match controller.execute(CoreCommand::BulkPing { ids }).await? {
            CommandResult::BulkPing(results) => results
                .into_iter()
                .map(|(id, r)| PingLine::from_outcome(&id, r.map_err(|e| e.to_string())))
                .collect(),
            _ => Vec::new(),
        }
    };

    let out = output::render_list(global.output, &lines, |p| PingRow::from(p), |p| {
        format!("{} {}", p.device, p.reachable)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn scan(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    util::load(controller).await?;

    if let CommandResult::Scan {
        discovered,
        inserted,
    } = controller.execute(CoreCommand::ScanDevices).await?
    {
        if !global.quiet {
            eprintln!("✓ Scan found {discovered} device(s), {inserted} new");
        }
    }
    Ok(())
}
