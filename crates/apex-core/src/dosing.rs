// ── Dosing-rate controller ──
//
// Turns a continuous flow-rate request (mL/min) into one of the pump's
// discrete speed profiles, then reprograms the pump head: off, write the
// profile, point the head at it.
//
// Pump heads are addressed as `{module}_{pump}`, the AquaBus address of
// the DOS/DQD module and the head number (1 or 2).

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Number};
use tracing::{debug, error, info};

use apex_api::{Config, ModuleConfig, ProfileData};

use crate::controller::Controller;
use crate::error::CoreError;

/// Pump speeds in mL/min, fastest first. The position is the speed index
/// packed into a profile's `mode`.
pub const PUMP_SPEEDS: [u32; 6] = [250, 125, 60, 25, 12, 7];

/// Rates below this are dosed as 1 mL every few minutes instead.
pub const SLOW_RATE_THRESHOLD: f64 = 0.5;

/// `mode` bit 4: forward direction.
const FORWARD: u32 = 1 << 4;
/// Slowest speed, forward.
const SLOW_MODE: u32 = 5 | FORWARD;
/// Fast profiles dose their amount once per minute.
const PERIOD_SECS: u32 = 60;
/// Dose count written to every profile.
const DOSE_COUNT: u32 = 255;

// ── Hardware ─────────────────────────────────────────────────────

/// Dosing module hardware types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum DosingHardware {
    /// DOS: not rated for continuous duty.
    Dos,
    /// DOS Quiet Drive: continuous duty.
    Dqd,
}

impl DosingHardware {
    /// Ratio between the head's top speed and the flow it may be asked to
    /// sustain.
    pub fn safety_margin(self) -> f64 {
        match self {
            Self::Dos => 2.0,
            Self::Dqd => 1.0,
        }
    }

    /// Highest fast-mode rate this hardware accepts, in mL/min.
    pub fn max_rate(self) -> f64 {
        f64::from(PUMP_SPEEDS[0]) / self.safety_margin()
    }
}

// ── Pump address ─────────────────────────────────────────────────

/// A dosing pump head, parsed from a `{module}_{pump}` device id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpAddress {
    /// AquaBus address of the module.
    pub module: u32,
    /// Head number, 1 or 2.
    pub pump: u8,
}

impl PumpAddress {
    /// Zero-based head index into per-pump module arrays.
    pub fn index(self) -> usize {
        usize::from(self.pump - 1)
    }
}

impl FromStr for PumpAddress {
    type Err = CoreError;

    fn from_str(did: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CoreError::InvalidDeviceId {
            did: did.to_owned(),
            reason: reason.to_owned(),
        };

        let (module, pump) = did
            .split_once('_')
            .ok_or_else(|| invalid("expected {module}_{pump}"))?;
        let module = module
            .parse()
            .map_err(|_| invalid("module is not a bus address"))?;
        let pump = match pump.parse::<u8>() {
            Ok(pump @ 1..=2) => pump,
            _ => return Err(invalid("pump number must be 1 or 2")),
        };
        Ok(Self { module, pump })
    }
}

impl fmt::Display for PumpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.module, self.pump)
    }
}

// ── Planner ──────────────────────────────────────────────────────

/// What to do with a pump head for a requested rate.
#[derive(Debug, Clone, PartialEq)]
pub enum DosePlan {
    /// Leave the head off.
    Stop,
    /// Run the head with this profile.
    Run(ProfileData),
}

/// Map a rate in mL/min onto a pump profile.
///
/// - `rate <= 0`: stop.
/// - `rate >= 0.5`: quantize to the nearest 0.1 mL/min and pick the slowest
///   speed that still covers it with the hardware's safety margin; the head
///   doses that amount every minute.
/// - `0 < rate < 0.5`: dose 1 mL at the slowest speed every
///   `round(60 / rate)` seconds.
pub fn plan_dose(rate: f64, hardware: DosingHardware) -> Result<DosePlan, CoreError> {
    if rate.is_nan() {
        return Err(CoreError::RateOutOfRange {
            requested: rate,
            limit: hardware.max_rate(),
        });
    }
    if rate <= 0.0 {
        return Ok(DosePlan::Stop);
    }

    if rate < SLOW_RATE_THRESHOLD {
        debug!(rate, "dosing in slow mode (1 mL per interval)");
        return Ok(DosePlan::Run(ProfileData {
            mode: SLOW_MODE,
            amount: 1.0,
            time: slow_interval_secs(rate),
            count: DOSE_COUNT,
            extra: Map::new(),
        }));
    }

    let quantized = (rate * 10.0).round() / 10.0;
    let limit = hardware.max_rate();
    if quantized > limit {
        error!(
            requested = quantized,
            limit, "requested rate exceeds the supported range"
        );
        return Err(CoreError::RateOutOfRange {
            requested: quantized,
            limit,
        });
    }

    let target_speed = quantized * hardware.safety_margin();
    let out_of_range = CoreError::RateOutOfRange {
        requested: quantized,
        limit,
    };
    let Some((index, speed)) = PUMP_SPEEDS
        .iter()
        .enumerate()
        .rev()
        .find(|&(_, &speed)| f64::from(speed) >= target_speed)
    else {
        return Err(out_of_range);
    };
    let index = u32::try_from(index).map_err(|_| out_of_range)?;

    debug!(rate = quantized, speed, "dosing in fast mode");
    Ok(DosePlan::Run(ProfileData {
        mode: index | FORWARD,
        amount: quantized,
        time: PERIOD_SECS,
        count: DOSE_COUNT,
        extra: Map::new(),
    }))
}

/// Seconds between 1 mL doses for a sub-threshold rate. Saturates for
/// vanishingly small rates.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
fn slow_interval_secs(rate: f64) -> u32 {
    (f64::from(PERIOD_SECS) / rate).round() as u32
}

/// Locate a module by bus address and confirm it is a dosing pump.
fn dosing_module(config: &Config, abaddr: u32) -> Result<(&ModuleConfig, DosingHardware), CoreError> {
    let Some(module) = config.mconf.iter().find(|m| m.abaddr == abaddr) else {
        error!(abaddr, "module not found");
        return Err(CoreError::not_found("module", abaddr.to_string()));
    };

    match module.hwtype.parse::<DosingHardware>() {
        Ok(hardware) => {
            debug!(abaddr, %hardware, "found dosing module");
            Ok((module, hardware))
        }
        Err(_) => {
            error!(
                abaddr,
                actual = %module.hwtype,
                expected = "DOS, DQD",
                "module is not a dosing pump"
            );
            Err(CoreError::HardwareMismatch {
                abaddr,
                expected: "DOS, DQD".into(),
                actual: module.hwtype.clone(),
            })
        }
    }
}

impl Controller {
    /// Run a pump head at `rate` mL/min using profile slot `profile_index`.
    ///
    /// The slot's profile is overwritten (named `Dose_{did}`, type `dose`).
    /// The head is switched off first so the new profile starts
    /// immediately; any failure after that leaves it off.
    pub async fn set_dosing_rate(
        &mut self,
        did: &str,
        profile_index: u32,
        rate: f64,
    ) -> Result<(), CoreError> {
        let address: PumpAddress = did.parse().inspect_err(|e| error!(did, error = %e, "bad pump id"))?;
        let config = self.editable_config("set dosing rate").await?;

        let (_, hardware) = dosing_module(config, address.module)?;

        let Some(profile) = profile_index
            .checked_sub(1)
            .and_then(|i| config.pconf.get(usize::try_from(i).ok()?))
        else {
            error!(profile_index, "profile slot not found");
            return Err(CoreError::not_found("profile", profile_index.to_string()));
        };
        if profile.id != profile_index {
            error!(
                expected = profile_index,
                actual = profile.id,
                "profile index mismatch"
            );
            return Err(CoreError::ProfileMismatch {
                index: profile_index,
                actual: profile.id,
            });
        }
        let mut profile = profile.clone();

        self.set_variable(did, "Set OFF").await?;

        let data = match plan_dose(rate, hardware)? {
            DosePlan::Stop => {
                info!(did, "dosing stopped");
                return Ok(());
            }
            DosePlan::Run(data) => data,
        };

        profile.name = format!("Dose_{did}");
        profile.kind = "dose".into();
        profile.data = data;

        self.client_mut().put_profile(profile_index, &profile).await?;
        let program = format!("Set {}", profile.name);
        if let Some(cached) = self
            .config_cache_mut()
            .and_then(|config| config.pconf.iter_mut().find(|p| p.id == profile_index))
        {
            *cached = profile;
        }

        self.set_variable(did, &program).await?;
        info!(did, profile_index, rate, "dosing rate set");
        Ok(())
    }

    /// Mark a pump head's reservoir as full again: its remaining volume is
    /// reset to the configured container volume.
    pub async fn refill_reservoir(&mut self, did: &str) -> Result<(), CoreError> {
        let address: PumpAddress = did.parse().inspect_err(|e| error!(did, error = %e, "bad pump id"))?;
        let config = self.editable_config("refill reservoir").await?;

        let (module, _) = dosing_module(config, address.module)?;
        let mut module = module.clone();
        let head = address.index();

        let Some(volume) = module
            .extra
            .volume
            .as_ref()
            .and_then(|volumes| volumes.get(head))
            .cloned()
        else {
            error!(did, "module reports no reservoir volume for this head");
            return Err(CoreError::not_found("reservoir volume", did));
        };

        let left = module.extra.volume_left.get_or_insert_with(Vec::new);
        if left.len() <= head {
            left.resize(head + 1, Number::from(0));
        }
        if let Some(slot) = left.get_mut(head) {
            *slot = volume;
        }

        self.client_mut().put_module_config(&module).await?;
        if let Some(cached) = self
            .config_cache_mut()
            .and_then(|config| config.mconf.iter_mut().find(|m| m.abaddr == address.module))
        {
            *cached = module;
        }
        info!(did, "reservoir refilled");
        Ok(())
    }
}
