//! Traffic handler.

use tabled::Tabled;

use netsight_core::{Controller, TrafficSample};

use crate::cli::{GlobalOpts, TrafficArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Upload")]
    upload: String,
    #[tabled(rename = "Download")]
    download: String,
}

impl From<&TrafficSample> for SampleRow {
    fn from(s: &TrafficSample) -> Self {
        Self {
            time: s.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            upload: output::mbps(s.upload),
            download: output::mbps(s.download),
        }
    }
}

pub async fn handle(
    controller: &Controller,
    args: TrafficArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::load(controller).await?;
    let store = controller.store();

    if args.history {
        let samples: Vec<TrafficSample> = store.traffic().samples().copied().collect();
        let out = output::render_list(global.output, &samples, |s| SampleRow::from(s), |s| {
            format!("{} {} {}", s.timestamp.to_rfc3339(), s.upload, s.download)
        })?;
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    let Some(current) = store.current_traffic() else {
        if !global.quiet {
            eprintln!("No current traffic reading from the backend");
        }
        return Ok(());
    };
    let out = output::render_single(
        global.output,
        &current,
        |c| {
            format!(
                "Upload:   {}\nDownload: {}",
                output::mbps(c.upload),
                output::mbps(c.download)
            )
        },
        |c| format!("{} {}", c.upload, c.download),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
