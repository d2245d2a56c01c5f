//! CLI configuration: a thin wrapper around `netsight_config` that applies
//! `GlobalOpts` flag overrides (--api-url, --ws-url, etc.).

use std::path::PathBuf;
use std::sync::Arc;

use netsight_core::Controller;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use netsight_config::{Config, TokenStore, config_path, load_config_from, save_config_to};

/// The config file in effect: `--config` or the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the file + environment layers, then apply CLI flags on top.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config_from(&config_file(global))?;
    apply_overrides(&mut cfg, global);
    Ok(cfg)
}

fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(url) = &global.api_url {
        cfg.api.base_url.clone_from(url);
    }
    if let Some(url) = &global.ws_url {
        cfg.websocket.url.clone_from(url);
    }
    if global.no_websocket {
        cfg.websocket.enabled = false;
    }
    if global.insecure {
        cfg.api.insecure = true;
    }
    if let Some(timeout) = global.timeout {
        cfg.api.timeout_secs = timeout;
    }
}

/// Build a controller from the effective configuration. Does not connect.
pub fn build_controller(global: &GlobalOpts) -> Result<Controller, CliError> {
    let cfg = load(global)?;
    let sync = cfg.to_sync_config()?;
    let tokens = TokenStore::from_config(&cfg.api);
    Ok(Controller::new(sync, Arc::new(tokens))?)
}
