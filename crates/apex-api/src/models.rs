// Canonical status and configuration records
//
// The modern REST firmware returns these shapes directly from `/rest/status`
// and `/rest/config`; legacy payloads are translated into them by
// `apex-core`. Every record keeps unknown keys in a flattened `extra` map so
// read-modify-write cycles hand the device back exactly what it sent.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

// ── Status ───────────────────────────────────────────────────────────

/// Snapshot of the controller's live state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub system: SystemInfo,
    #[serde(default)]
    pub inputs: Vec<Input>,
    #[serde(default)]
    pub outputs: Vec<Output>,
    #[serde(default)]
    pub feed: FeedState,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Status {
    /// Find an output by its device id.
    pub fn output(&self, did: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.did == did)
    }

    /// Find an input by its device id.
    pub fn input(&self, did: &str) -> Option<&Input> {
        self.inputs.iter().find(|i| i.did == did)
    }
}

/// Controller identity block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub software: String,
    #[serde(default)]
    pub hardware: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One probe reading (temperature, pH, ORP, power, variable, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub did: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One controllable point (outlet, variable, dosing pump, 24V port, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub did: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    /// `[state, intensity, health, extra]`, e.g. `["AON", "", "OK", ""]`.
    #[serde(default)]
    pub status: Vec<String>,
    #[serde(default, rename = "ID", deserialize_with = "lenient_u32")]
    pub id: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Output {
    /// First element of the status tuple (`AON`, `AOF`, `ON`, `OFF`, `TBL`, ...).
    pub fn state(&self) -> Option<&str> {
        self.status.first().map(String::as_str)
    }

    /// Whether the output is currently energized.
    pub fn is_on(&self) -> bool {
        self.state().is_some_and(|s| s != "OFF" && s != "AOF")
    }
}

/// Feed-cycle state. `name` is the active feed cycle (0 when none).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedState {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub name: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub active: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Config ───────────────────────────────────────────────────────────

/// Editable device configuration (`/rest/config`).
///
/// Legacy firmware has no config API; for those devices this is always the
/// empty default, which callers should read as "not supported".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub oconf: Vec<OutputConfig>,
    #[serde(default)]
    pub mconf: Vec<ModuleConfig>,
    #[serde(default)]
    pub pconf: Vec<Profile>,
    #[serde(default)]
    pub iconf: Vec<InputConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nconf: Option<NetworkConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Config {
    /// True when nothing was loaded (legacy firmware or never fetched).
    pub fn is_empty(&self) -> bool {
        self.oconf.is_empty()
            && self.mconf.is_empty()
            && self.pconf.is_empty()
            && self.iconf.is_empty()
            && self.nconf.is_none()
            && self.extra.is_empty()
    }
}

/// Control program of one output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub did: String,
    #[serde(default)]
    pub name: String,
    /// Control type: `Advanced`, `Heater`, `Pump`, `Dos`, ...
    #[serde(default)]
    pub ctype: String,
    /// Program text (for `Advanced`) or serialized settings.
    #[serde(default)]
    pub prog: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Expansion module on the AquaBus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// AquaBus address.
    #[serde(deserialize_with = "lenient_u32")]
    pub abaddr: u32,
    /// Hardware type: `DOS`, `DQD`, `EB832`, `FMM`, ...
    #[serde(default)]
    pub hwtype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub extra: ModuleExtra,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Hardware-specific module settings. Dosing pumps carry per-pump
/// reservoir sizes here, one entry per pump head.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<Vec<Number>>,
    #[serde(default, rename = "volumeLeft", skip_serializing_if = "Option::is_none")]
    pub volume_left: Option<Vec<Number>>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Stored dosing profile, addressed by its 1-based slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "ID", deserialize_with = "lenient_u32")]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: ProfileData,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pump control payload of a dosing profile.
///
/// Dose `amount` mL every `time` seconds, `count` times, with `mode`
/// packing the speed index (bits 0-3) and direction (bit 4).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileData {
    #[serde(default)]
    pub mode: u32,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub time: u32,
    #[serde(default)]
    pub count: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Probe measurement metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    pub did: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Network / firmware record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default, rename = "latestFirmware", skip_serializing_if = "Option::is_none")]
    pub latest_firmware: Option<String>,
    #[serde(default, rename = "updateFirmware", skip_serializing_if = "Option::is_none")]
    pub update_firmware: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Accept `3`, `"3"`, or `3.0` for integer fields; firmware revisions
/// disagree on whether ids are strings.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
pub(crate) fn lenient_u32<'de, D: Deserializer<'de>>(de: D) -> Result<u32, D::Error> {
    use serde::de::Error;

    match Value::deserialize(de)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| D::Error::custom(format!("expected unsigned integer, got {n}"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("expected integer string, got {s:?}"))),
        Value::Null => Ok(0),
        other => Err(D::Error::custom(format!("expected integer, got {other}"))),
    }
}
