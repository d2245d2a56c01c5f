//! Event log handler.

use std::sync::Arc;

use tabled::Tabled;

use netsight_core::stream::EventFilter;
use netsight_core::{Controller, Event};

use crate::cli::{EventsArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Description")]
    description: String,
}

fn row(e: &Arc<Event>, color: bool) -> EventRow {
    EventRow {
        time: e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        category: e.category.clone(),
        device: output::opt_str(e.device.as_deref()),
        severity: output::paint_severity(e.severity, color),
        status: e.status.to_string(),
        description: e.description.clone(),
    }
}

pub async fn handle(
    controller: &Controller,
    args: EventsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::load(controller).await?;
    let color = output::should_color(global.color);

    let mut filters = Vec::new();
    if let Some(min) = args.min_severity {
        filters.push(EventFilter::MinSeverity(util::severity(min)));
    }
    if let Some(device) = args.device {
        filters.push(EventFilter::ByDevice(device));
    }

    let events: Vec<Arc<Event>> = controller
        .store()
        .events_snapshot()
        .iter()
        .filter(|e| filters.iter().all(|f| f.matches(e)))
        .take(args.limit)
        .cloned()
        .collect();

    let out = output::render_list(
        global.output,
        &events,
        |e| row(e, color),
        |e| e.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
