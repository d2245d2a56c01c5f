//! Security alert handlers.

use std::sync::Arc;

use tabled::Tabled;

use netsight_core::{AlertId, Command as CoreCommand, Controller, SecurityAlert};

use crate::cli::{AlertsArgs, AlertsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct AlertRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Ack")]
    acknowledged: String,
    #[tabled(rename = "Description")]
    description: String,
}

fn row(a: &Arc<SecurityAlert>, color: bool) -> AlertRow {
    AlertRow {
        id: a.id.to_string(),
        time: a.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        severity: output::paint_severity(a.severity, color),
        source: output::opt_str(a.source.as_deref()),
        acknowledged: if a.acknowledged { "yes" } else { "no" }.into(),
        description: a.description.clone(),
    }
}

pub async fn handle(
    controller: &Controller,
    args: AlertsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::load(controller).await?;

    match args.command {
        AlertsCommand::List { open } => {
            let color = output::should_color(global.color);
            let alerts: Vec<Arc<SecurityAlert>> = controller
                .store()
                .alerts_snapshot()
                .iter()
                .filter(|a| !(open && a.acknowledged))
                .cloned()
                .collect();
            let out = output::render_list(
                global.output,
                &alerts,
                |a| row(a, color),
                |a| a.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AlertsCommand::Ack { id } => {
            controller
                .execute(CoreCommand::AcknowledgeAlert {
                    id: AlertId::from(id.as_str()),
                })
                .await?;
            if !global.quiet {
                eprintln!("✓ Alert {id} acknowledged");
            }
            Ok(())
        }
    }
}
