//! Shared helpers for command handlers.

use apex_core::{Controller, Status};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.trim_end_matches('?').into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// The status snapshot loaded by `connect()`.
pub fn status(controller: &Controller) -> Result<&Status, CliError> {
    controller.status().ok_or_else(|| CliError::NotFound {
        resource_type: "status snapshot".into(),
        identifier: controller.config().url.to_string(),
    })
}

/// Format an optional reading, `-` when absent.
pub fn reading(value: Option<f64>) -> String {
    value.map_or_else(|| "-".into(), |v| format!("{v}"))
}
