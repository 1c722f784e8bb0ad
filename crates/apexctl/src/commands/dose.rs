//! Dosing pump handlers.

use apex_core::Controller;

use crate::cli::{DoseArgs, DoseCommand, GlobalOpts};
use crate::error::CliError;

pub async fn handle(
    controller: &mut Controller,
    args: DoseArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DoseCommand::Set { did, slot, rate } => {
            controller.set_dosing_rate(&did, slot, rate).await?;
            if !global.quiet {
                if rate > 0.0 {
                    eprintln!("Pump {did} dosing {rate} mL/min (profile slot {slot})");
                } else {
                    eprintln!("Pump {did} stopped");
                }
            }
            Ok(())
        }

        DoseCommand::Refill { did } => {
            controller.refill_reservoir(&did).await?;
            if !global.quiet {
                eprintln!("Reservoir of pump {did} marked full");
            }
            Ok(())
        }
    }
}
