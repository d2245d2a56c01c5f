//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use netsight_core::{DeviceStatus, Severity};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

pub fn paint_status(status: DeviceStatus, color: bool) -> String {
    if !color {
        return status.to_string();
    }
    match status {
        DeviceStatus::Online => status.green().to_string(),
        DeviceStatus::Warning => status.yellow().to_string(),
        DeviceStatus::Offline => status.red().to_string(),
    }
}

pub fn paint_severity(severity: Severity, color: bool) -> String {
    if !color {
        return severity.to_string();
    }
    match severity {
        Severity::Info => severity.cyan().to_string(),
        Severity::Warning => severity.yellow().to_string(),
        Severity::Critical => severity.red().bold().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single item. Table rendering uses `detail_fn`, since detail
/// views are key/value lines rather than rows.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub(crate) fn render_json<T: serde::Serialize + ?Sized>(
    data: &T,
    compact: bool,
) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Output(e.to_string()))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Output(e.to_string()))
}

// ── Value formatting ─────────────────────────────────────────────────

pub fn opt_str(value: Option<&str>) -> String {
    value.unwrap_or("-").to_owned()
}

pub fn latency(ms: Option<f64>) -> String {
    ms.map_or_else(|| "-".into(), |ms| format!("{ms:.0}ms"))
}

pub fn mbps(value: f64) -> String {
    format!("{value:.1} Mbps")
}

/// "3s ago" style age, rounded to whole seconds.
pub fn ago(at: chrono::DateTime<chrono::Utc>) -> String {
    let age = (chrono::Utc::now() - at).to_std().unwrap_or_default();
    let secs = std::time::Duration::from_secs(age.as_secs());
    format!("{} ago", humantime::format_duration(secs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Item {
        id: &'static str,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "ID")]
        id: String,
    }

    #[test]
    fn plain_lists_one_id_per_line() {
        let items = [Item { id: "a" }, Item { id: "b" }];
        let out = render_list(
            OutputFormat::Plain,
            &items,
            |i| Row { id: i.id.into() },
            |i| i.id.into(),
        )
        .unwrap();
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn table_has_header() {
        let items = [Item { id: "a" }];
        let out = render_list(
            OutputFormat::Table,
            &items,
            |i| Row { id: i.id.into() },
            |i| i.id.into(),
        )
        .unwrap();
        assert!(out.contains("ID"));
    }

    #[test]
    fn uncolored_status_is_plain_text() {
        assert_eq!(paint_status(DeviceStatus::Offline, false), "offline");
        assert_eq!(paint_severity(Severity::Critical, false), "critical");
    }

    #[test]
    fn missing_latency_renders_dash() {
        assert_eq!(latency(None), "-");
        assert_eq!(latency(Some(12.4)), "12ms");
    }
}
