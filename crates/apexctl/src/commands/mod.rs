//! Command dispatch: bridges CLI args -> controller operations -> output formatting.

pub mod device_config;
pub mod dose;
pub mod firmware;
pub mod outputs;
pub mod profile;
pub mod program;
pub mod status;
pub mod util;

use apex_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a controller-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &mut Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle_status(controller, global),
        Command::Inputs => status::handle_inputs(controller, global),
        Command::Outputs(args) => outputs::handle(controller, args, global).await,
        Command::Config(args) => device_config::handle(controller, args, global),
        Command::Variable(args) => program::handle_variable(controller, args, global).await,
        Command::Temperature(args) => program::handle_temperature(controller, args, global).await,
        Command::Dose(args) => dose::handle(controller, args, global).await,
        Command::Firmware(args) => firmware::handle(controller, args, global).await,
        // Profile and Completions never reach a controller
        Command::Profile(_) | Command::Completions(_) => Ok(()),
    }
}
