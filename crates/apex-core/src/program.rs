// ── Program writer ──
//
// Find an output's control-program record, change its program on a copy,
// and write the copy back. Variables, heaters, and dosing pumps are all
// driven through this one primitive.

use tracing::{debug, error, info};

use apex_api::OutputConfig;

use crate::controller::Controller;
use crate::error::CoreError;

/// Control type of free-form program outputs (virtual outlets, DOS heads).
pub const CTYPE_ADVANCED: &str = "Advanced";
/// Control type of heater outputs.
pub const CTYPE_HEATER: &str = "Heater";

/// Heater program holding the tank at `target`. Whole-number targets keep
/// their `.0`.
pub fn heater_program(target: f64) -> String {
    format!("Fallback OFF\nIf Tmp < {target:?} Then ON\nIf Tmp > {target:?} Then OFF\n")
}

impl Controller {
    /// Look up an output's program record in the cached configuration.
    ///
    /// With `expected_ctype`, the record must already have that control
    /// type; a mismatch is logged with both values and fails.
    pub fn get_output(
        &self,
        did: &str,
        expected_ctype: Option<&str>,
    ) -> Result<&OutputConfig, CoreError> {
        let Some(output) = self
            .device_config()
            .and_then(|config| config.oconf.iter().find(|o| o.did == did))
        else {
            error!(did, "output not found in configuration");
            return Err(CoreError::not_found("output", did));
        };

        match expected_ctype {
            Some(expected) if output.ctype != expected => {
                error!(
                    did,
                    expected,
                    actual = %output.ctype,
                    "output has an unexpected control type; check the device id or update the output on the controller"
                );
                Err(CoreError::ControlTypeMismatch {
                    did: did.to_owned(),
                    expected: expected.to_owned(),
                    actual: output.ctype.clone(),
                })
            }
            _ => Ok(output),
        }
    }

    /// Replace an output's program.
    ///
    /// With `force_type` the record must already be of `ctype`, and both
    /// `ctype` and `prog` are written. Without it only `prog` changes and
    /// the control type is left as the device reported it. The cache is
    /// updated once the device accepts the write.
    pub async fn set_program(
        &mut self,
        did: &str,
        ctype: &str,
        code: &str,
        force_type: bool,
    ) -> Result<(), CoreError> {
        self.editable_config("set program").await?;

        let mut record = self
            .get_output(did, force_type.then_some(ctype))?
            .clone();
        if force_type {
            record.ctype = ctype.to_owned();
        }
        record.prog = code.to_owned();

        debug!(did, code, "writing output program");
        self.client_mut().put_output_config(&record).await?;
        info!(did, "output program updated");

        if let Some(cached) = self
            .config_cache_mut()
            .and_then(|config| config.oconf.iter_mut().find(|o| o.did == did))
        {
            *cached = record;
        }
        Ok(())
    }

    /// Replace the program of an `Advanced` output.
    pub async fn set_variable(&mut self, did: &str, code: &str) -> Result<(), CoreError> {
        self.set_program(did, CTYPE_ADVANCED, code, false).await
    }

    /// Program a heater output to hold `target` degrees.
    pub async fn set_temperature(&mut self, did: &str, target: f64) -> Result<(), CoreError> {
        self.set_program(did, CTYPE_HEATER, &heater_program(target), true)
            .await
    }
}
