//! Clap derive structures for the `netsight` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netsight -- watch and query a network monitoring backend
#[derive(Debug, Parser)]
#[command(
    name = "netsight",
    version,
    about = "Watch and query a network monitoring backend from the command line",
    long_about = "Keeps a live view of devices, events, alerts, and traffic from a\n\
        network monitoring backend, using its push channel when available\n\
        and REST polling otherwise.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config dir)
    #[arg(long, env = "NETSIGHT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// REST base URL (overrides config)
    #[arg(long, short = 'u', env = "NETSIGHT_API_URL", global = true)]
    pub api_url: Option<String>,

    /// WebSocket URL (overrides config)
    #[arg(long, env = "NETSIGHT_WS_URL", global = true)]
    pub ws_url: Option<String>,

    /// Poll only; never open the push channel
    #[arg(long, global = true)]
    pub no_websocket: bool,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NETSIGHT_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Backend reachability, headline metrics, and system health
    #[command(alias = "st")]
    Status,

    /// Stream live updates until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// List and manage devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Show the network event log
    #[command(alias = "ev")]
    Events(EventsArgs),

    /// List and acknowledge security alerts
    Alerts(AlertsArgs),

    /// Show current and recent traffic
    Traffic(TrafficArgs),

    /// Ping one or more devices through the backend
    Ping(PingArgs),

    /// Ask the backend to scan for new devices
    Scan,

    /// Manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this long (e.g. "30s", "5m"); runs until Ctrl-C otherwise
    #[arg(long = "for", value_name = "DURATION")]
    pub duration: Option<humantime::Duration>,

    /// Only report events at or above this severity
    #[arg(long, value_enum)]
    pub min_severity: Option<SeverityArg>,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices
    #[command(alias = "ls")]
    List {
        /// Only devices with this status
        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        /// Only devices of this kind (router, server, printer, workstation, iot)
        #[arg(long)]
        kind: Option<String>,

        /// Only devices in this group
        #[arg(long)]
        group: Option<String>,
    },

    /// Show one device by id or address
    Get { device: String },

    /// Edit a device's name, location, or group
    Update {
        device: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        group: Option<String>,
    },

    /// Trace the route to a device
    Trace { device: String },
}

// ── Events ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EventsArgs {
    /// Number of entries to show
    #[arg(long, short = 'n', default_value = "20")]
    pub limit: usize,

    /// Only events at or above this severity
    #[arg(long, value_enum)]
    pub min_severity: Option<SeverityArg>,

    /// Only events for this device address
    #[arg(long)]
    pub device: Option<String>,
}

// ── Alerts ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AlertsArgs {
    #[command(subcommand)]
    pub command: AlertsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AlertsCommand {
    /// List alerts
    #[command(alias = "ls")]
    List {
        /// Hide acknowledged alerts
        #[arg(long)]
        open: bool,
    },

    /// Acknowledge an alert
    Ack { id: String },
}

// ── Traffic ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TrafficArgs {
    /// Show the retained history instead of the current rate
    #[arg(long)]
    pub history: bool,
}

// ── Ping ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PingArgs {
    /// Device ids or addresses
    #[arg(required = true)]
    pub devices: Vec<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the effective configuration (token masked)
    Show,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Set a value by dotted key (e.g. polling.traffic_ms 2000)
    Set { key: String, value: String },

    /// Check that the effective configuration is usable
    Validate,

    /// Store the API token in the system keyring
    SetToken,

    /// Remove the API token from the system keyring
    ClearToken,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

// ── Shared value enums ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SeverityArg {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Online,
    Warning,
    Offline,
}
