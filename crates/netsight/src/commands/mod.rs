//! Command dispatch: routes each CLI subcommand to its handler.

pub mod alerts;
pub mod config_cmd;
pub mod devices;
pub mod diagnostics;
pub mod events;
pub mod status;
pub mod traffic;
pub mod util;
pub mod watch;

use netsight_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-facing command. `Config` and `Completions` are
/// handled before a controller exists.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(controller, global).await,
        Command::Watch(args) => watch::handle(controller, args, global).await,
        Command::Devices(args) => devices::handle(controller, args, global).await,
        Command::Events(args) => events::handle(controller, args, global).await,
        Command::Alerts(args) => alerts::handle(controller, args, global).await,
        Command::Traffic(args) => traffic::handle(controller, args, global).await,
        Command::Ping(args) => diagnostics::ping(controller, args, global).await,
        Command::Scan => diagnostics::scan(controller, global).await,
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
