//! `config show`: the controller's editable configuration records.

use tabled::Tabled;

use apex_core::{Config, Controller, Generation, ModuleConfig, OutputConfig, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, ConfigSection, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct OutputConfigRow {
    #[tabled(rename = "DID")]
    did: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Control")]
    ctype: String,
    #[tabled(rename = "Program")]
    prog: String,
}

impl From<&OutputConfig> for OutputConfigRow {
    fn from(o: &OutputConfig) -> Self {
        Self {
            did: o.did.clone(),
            name: o.name.clone(),
            ctype: o.ctype.clone(),
            prog: o.prog.replace('\n', "; "),
        }
    }
}

#[derive(Tabled)]
struct ModuleRow {
    #[tabled(rename = "Address")]
    abaddr: u32,
    #[tabled(rename = "Hardware")]
    hwtype: String,
    #[tabled(rename = "Name")]
    name: String,
}

impl From<&ModuleConfig> for ModuleRow {
    fn from(m: &ModuleConfig) -> Self {
        Self {
            abaddr: m.abaddr,
            hwtype: m.hwtype.clone(),
            name: m.name.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
}

impl From<&Profile> for ProfileRow {
    fn from(p: &Profile) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            kind: p.kind.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(controller: &Controller, args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let ConfigCommand::Show { section } = args.command;

    if controller.generation() == Some(Generation::Legacy) {
        return Err(CliError::Unsupported {
            operation: "config show".into(),
            required: "REST firmware".into(),
        });
    }
    let config = controller.device_config().ok_or_else(|| CliError::NotFound {
        resource_type: "configuration".into(),
        identifier: controller.config().url.to_string(),
    })?;

    let out = match section {
        Some(section) => render_section(global, config, section)?,
        None => match global.output {
            crate::cli::OutputFormat::Table => [
                ConfigSection::Oconf,
                ConfigSection::Mconf,
                ConfigSection::Pconf,
            ]
            .into_iter()
            .map(|s| render_section(global, config, s))
            .collect::<Result<Vec<_>, _>>()?
            .join("\n\n"),
            _ => output::render_single(&global.output, config, |_| String::new(), |c| {
                c.oconf.iter().map(|o| o.did.clone()).collect::<Vec<_>>().join("\n")
            })?,
        },
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn render_section(
    global: &GlobalOpts,
    config: &Config,
    section: ConfigSection,
) -> Result<String, CliError> {
    let format = &global.output;
    match section {
        ConfigSection::Oconf => {
            output::render_list(format, &config.oconf, |o| OutputConfigRow::from(o), |o| o.did.clone())
        }
        ConfigSection::Mconf => {
            output::render_list(format, &config.mconf, |m| ModuleRow::from(m), |m| {
                format!("{}\t{}", m.abaddr, m.hwtype)
            })
        }
        ConfigSection::Pconf => {
            output::render_list(format, &config.pconf, |p| ProfileRow::from(p), |p| {
                format!("{}\t{}", p.id, p.name)
            })
        }
        ConfigSection::Iconf => output::render_single(
            format,
            &config.iconf,
            |inputs| {
                inputs
                    .iter()
                    .map(|i| format!("{}  {} ({})", i.did, i.name, i.kind))
                    .collect::<Vec<_>>()
                    .join("\n")
            },
            |inputs| inputs.iter().map(|i| i.did.clone()).collect::<Vec<_>>().join("\n"),
        ),
        ConfigSection::Nconf => output::render_single(
            format,
            &config.nconf,
            |nconf| {
                let latest = nconf
                    .as_ref()
                    .and_then(|n| n.latest_firmware.clone())
                    .unwrap_or_else(|| "-".into());
                output::render_detail(&[("Latest firmware", latest)])
            },
            |nconf| {
                nconf
                    .as_ref()
                    .and_then(|n| n.latest_firmware.clone())
                    .unwrap_or_default()
            },
        ),
    }
}
