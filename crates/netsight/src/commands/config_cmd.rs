//! Config subcommand handlers. None of these contact the backend.

use netsight_config::{TokenStore, clear_token, store_token};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_file(global);

    match args.command {
        ConfigCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            output::print_output(cfg.to_redacted_toml()?.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            config::save_config_to(&Config::default(), &path)?;
            if !global.quiet {
                eprintln!("✓ Wrote default configuration to {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            // Only the file layer is edited; env and flags are not persisted.
            let mut cfg = if path.exists() {
                config::load_config_from(&path)?
            } else {
                Config::default()
            };
            cfg.set(&key, &value)?;
            cfg.to_sync_config()?;
            config::save_config_to(&cfg, &path)?;
            if !global.quiet {
                eprintln!("✓ Set {key}");
            }
            Ok(())
        }

        ConfigCommand::Validate => {
            let cfg = config::load(global)?;
            let sync = cfg.to_sync_config()?;
            let token = TokenStore::from_config(&cfg.api)
                .resolve()
                .map_or("none", |(_, source)| source.as_str());
            if !global.quiet {
                eprintln!("✓ Configuration is valid");
                eprintln!("   REST:      {}", sync.base_url);
                eprintln!(
                    "   WebSocket: {}{}",
                    sync.websocket_url,
                    if sync.websocket_enabled { "" } else { " (disabled)" }
                );
                eprintln!("   Token:     {token}");
            }
            Ok(())
        }

        ConfigCommand::SetToken => {
            let token = rpassword::prompt_password("API token: ").map_err(prompt_err)?;
            store_token(token.trim())?;
            if !global.quiet {
                eprintln!("✓ Token stored in system keyring");
            }
            Ok(())
        }

        ConfigCommand::ClearToken => {
            let removed = clear_token()?;
            if !global.quiet {
                if removed {
                    eprintln!("✓ Token removed from system keyring");
                } else {
                    eprintln!("No token was stored in the system keyring");
                }
            }
            Ok(())
        }
    }
}
