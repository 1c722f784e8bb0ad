//! Output command handlers.

use tabled::Tabled;

use apex_core::{Controller, Output};

use crate::cli::{GlobalOpts, OutputsArgs, OutputsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct OutputRow {
    #[tabled(rename = "DID")]
    did: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "ID")]
    id: u32,
}

fn to_row(o: &Output, color: bool) -> OutputRow {
    OutputRow {
        did: o.did.clone(),
        name: o.name.clone(),
        kind: o.kind.clone(),
        state: output::paint_state(o.state().unwrap_or_default(), color),
        id: o.id,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &mut Controller,
    args: OutputsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    match args.command {
        OutputsCommand::List => {
            let status = util::status(controller)?;
            let out = output::render_list(
                &global.output,
                &status.outputs,
                |o| to_row(o, color),
                |o| format!("{}\t{}", o.did, o.state().unwrap_or_default()),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        OutputsCommand::Set { did, state } => {
            match controller.set_output_state(&did, state).await? {
                Some(updated) => {
                    let out = output::render_list(
                        &global.output,
                        std::slice::from_ref(&updated),
                        |o| to_row(o, color),
                        |o| format!("{}\t{}", o.did, o.state().unwrap_or_default()),
                    )?;
                    output::print_output(&out, global.quiet);
                }
                None if !global.quiet => eprintln!("Output {did} set to {state}"),
                None => {}
            }
            Ok(())
        }
    }
}
