//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use netsight_config::ConfigError;
use netsight_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the backend at {url}")]
    #[diagnostic(
        code(netsight::unreachable),
        help(
            "Check that the backend is running and that api.base_url is right.\n\
             Try: netsight config show"
        )
    )]
    Unreachable { url: String },

    #[error("Could not connect to {url}: {reason}")]
    #[diagnostic(code(netsight::connection_failed))]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {timeout_ms}ms")]
    #[diagnostic(
        code(netsight::timeout),
        help("Increase the timeout with --timeout or api.timeout_secs.")
    )]
    Timeout { timeout_ms: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("The backend rejected the request ({status})")]
    #[diagnostic(
        code(netsight::auth_failed),
        help(
            "Store a token with: netsight config set-token\n\
             Or export NETSIGHT_TOKEN."
        )
    )]
    AuthFailed { status: u16 },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(netsight::not_found),
        help("Run: netsight {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(netsight::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netsight::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(netsight::config),
        help("Inspect the effective configuration with: netsight config show")
    )]
    Config(#[from] ConfigError),

    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(netsight::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Output serialization failed: {0}")]
    #[diagnostic(code(netsight::output))]
    Output(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unreachable { .. } | Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::Config(_) | Self::ConfigExists { .. } => {
                exit_code::USAGE
            }
            Self::ApiError { .. } | Self::Io(_) | Self::Output(_) => exit_code::GENERAL,
        }
    }

    pub fn device_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: "device".into(),
            identifier: identifier.into(),
            list_command: "devices list".into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }

            CoreError::Timeout { timeout_ms } => CliError::Timeout { timeout_ms },

            CoreError::DeviceNotFound { identifier } => CliError::device_not_found(identifier),

            CoreError::AlertNotFound { identifier } => CliError::NotFound {
                resource_type: "alert".into(),
                identifier,
                list_command: "alerts list".into(),
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Api {
                status: Some(status @ (401 | 403)),
                ..
            } => CliError::AuthFailed { status },

            CoreError::Api { message, .. } | CoreError::Internal(message) => {
                CliError::ApiError { message }
            }

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}
