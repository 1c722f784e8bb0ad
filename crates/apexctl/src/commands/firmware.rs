//! Firmware command handlers.

use apex_core::{Controller, FirmwareInfo, Generation};

use crate::cli::{FirmwareArgs, FirmwareCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(info: &FirmwareInfo) -> String {
    output::render_detail(&[
        ("Installed", info.installed.clone()),
        ("Latest", info.latest.clone().unwrap_or_else(|| "-".into())),
        (
            "Update",
            if info.update_available() { "available" } else { "none" }.into(),
        ),
    ])
}

pub async fn handle(
    controller: &mut Controller,
    args: FirmwareArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let info = controller.firmware_info()?;
    match args.command {
        FirmwareCommand::Show => {
            let out = output::render_single(&global.output, &info, detail, |i| {
                i.installed.clone()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        FirmwareCommand::Update => {
            if controller.generation() == Some(Generation::Legacy) {
                return Err(CliError::Unsupported {
                    operation: "firmware update".into(),
                    required: "REST firmware".into(),
                });
            }
            if !info.update_available() {
                if !global.quiet {
                    eprintln!("Firmware {} is up to date", info.installed);
                }
                return Ok(());
            }
            let latest = info.latest.as_deref().unwrap_or_default();
            let prompt = format!(
                "Install firmware {latest} (currently {})? The controller will reboot.",
                info.installed
            );
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }
            controller.update_firmware().await?;
            if !global.quiet {
                eprintln!("Firmware update to {latest} requested");
            }
            Ok(())
        }
    }
}
