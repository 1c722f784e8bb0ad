//! Controller facade between `apex-api` and callers (CLI, automations).
//!
//! - **[`Controller`]**: owns the API client, detects the firmware
//!   generation, and caches the last status and configuration snapshots.
//! - **[`Backend`]**: per-generation routing of status, config, and output
//!   control calls.
//! - **[`convert`]**: legacy `status.json` / `status.xml` to canonical
//!   [`Status`](apex_api::Status).
//! - Commands implemented on `Controller`: output state, program writer
//!   ([`program`]), dosing rate and reservoir refill ([`dosing`]),
//!   firmware ([`firmware`]).

pub mod backend;
pub mod config;
pub mod controller;
pub mod convert;
pub mod dosing;
pub mod error;
pub mod firmware;
pub mod program;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::Backend;
pub use config::ControllerConfig;
pub use controller::{Controller, DeviceState};
pub use dosing::{DosePlan, DosingHardware, PumpAddress, plan_dose};
pub use error::CoreError;
pub use firmware::FirmwareInfo;

pub use apex_api::{
    Config, Generation, Input, LegacyFormat, ModuleConfig, Output, OutputConfig, OutputState,
    Profile, RetryPolicy, Status,
};
