//! Variable and heater program handlers.

use apex_core::Controller;

use crate::cli::{
    GlobalOpts, TemperatureArgs, TemperatureCommand, VariableArgs, VariableCommand,
};
use crate::error::CliError;

pub async fn handle_variable(
    controller: &mut Controller,
    args: VariableArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let VariableCommand::Set { did, code } = args.command;
    // A literal `\n` separates program lines.
    let code = code.replace("\\n", "\n");
    controller.set_variable(&did, &code).await?;
    if !global.quiet {
        eprintln!("Program of {did} updated");
    }
    Ok(())
}

pub async fn handle_temperature(
    controller: &mut Controller,
    args: TemperatureArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let TemperatureCommand::Set { did, target } = args.command;
    if !target.is_finite() {
        return Err(CliError::Validation {
            field: "target".into(),
            reason: format!("'{target}' is not a temperature"),
        });
    }
    controller.set_temperature(&did, target).await?;
    if !global.quiet {
        eprintln!("Heater {did} set to {target}");
    }
    Ok(())
}
