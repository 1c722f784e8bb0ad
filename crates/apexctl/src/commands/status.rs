//! Status and input command handlers.

use serde::Serialize;
use tabled::Tabled;

use apex_core::{Controller, Input, Status};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Status ──────────────────────────────────────────────────────────

/// Status snapshot tagged with the detected API generation.
#[derive(Serialize)]
struct StatusView<'a> {
    generation: String,
    #[serde(flatten)]
    status: &'a Status,
}

fn detail(view: &StatusView<'_>) -> String {
    let sys = &view.status.system;
    let energized = view.status.outputs.iter().filter(|o| o.is_on()).count();
    let feed = match view.status.feed.name {
        0 => "-".to_owned(),
        cycle => format!("cycle {cycle}"),
    };
    output::render_detail(&[
        ("Hostname", sys.hostname.clone().unwrap_or_else(|| "-".into())),
        ("Model", sys.model.clone().unwrap_or_else(|| "-".into())),
        ("Serial", sys.serial.clone().unwrap_or_else(|| "-".into())),
        ("Firmware", sys.software.clone()),
        ("Hardware", sys.hardware.clone()),
        ("API", view.generation.clone()),
        ("Inputs", view.status.inputs.len().to_string()),
        (
            "Outputs",
            format!("{} ({energized} on)", view.status.outputs.len()),
        ),
        ("Feed", feed),
    ])
}

pub fn handle_status(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let status = util::status(controller)?;
    let view = StatusView {
        generation: controller
            .generation()
            .map_or_else(|| "unknown".into(), |g| g.to_string()),
        status,
    };
    let out = output::render_single(&global.output, &view, detail, |v| {
        v.status.system.software.clone()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Inputs ──────────────────────────────────────────────────────────

#[derive(Tabled)]
struct InputRow {
    #[tabled(rename = "DID")]
    did: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl From<&Input> for InputRow {
    fn from(i: &Input) -> Self {
        Self {
            did: i.did.clone(),
            name: i.name.clone(),
            kind: i.kind.clone(),
            value: util::reading(i.value),
        }
    }
}

pub fn handle_inputs(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let status = util::status(controller)?;
    let out = output::render_list(&global.output, &status.inputs, |i| InputRow::from(i), |i| {
        format!("{}\t{}", i.name, util::reading(i.value))
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
