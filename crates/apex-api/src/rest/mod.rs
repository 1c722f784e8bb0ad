// Modern REST endpoints
//
// Everything under `/rest/`: status and config reads plus the config
// sub-record writes used by commands. All calls go through the executor in
// `client.rs`, so they inherit session handling and retries.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::auth::paths;
use crate::client::ApexClient;
use crate::error::Error;
use crate::models::{Config, ModuleConfig, NetworkConfig, Output, OutputConfig, Profile, Status};

/// Requested run state of an output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputState {
    /// Follow the output's program.
    Auto,
    /// Force on.
    On,
    /// Force off.
    Off,
}

/// Body of `PUT /rest/status/outputs/{did}`.
#[derive(Debug, Serialize)]
struct OutputStateUpdate<'a> {
    did: &'a str,
    status: [&'a str; 4],
    #[serde(rename = "type")]
    kind: &'static str,
}

impl ApexClient {
    /// Fetch live status.
    ///
    /// `GET /rest/status`
    pub async fn fetch_status(&mut self) -> Result<Status, Error> {
        debug!("fetching status");
        self.get_json(paths::STATUS).await
    }

    /// Fetch the full editable configuration.
    ///
    /// `GET /rest/config`
    pub async fn fetch_config(&mut self) -> Result<Config, Error> {
        debug!("fetching config");
        self.get_json(paths::CONFIG).await
    }

    /// Set an output's run state. The device echoes the updated output.
    ///
    /// `PUT /rest/status/outputs/{did}` with
    /// `{"did": did, "status": [state, "", "OK", ""], "type": "outlet"}`.
    /// The `outlet` type is accepted for every output kind.
    pub async fn set_output_state(&mut self, did: &str, state: OutputState) -> Result<Output, Error> {
        let state = state.to_string();
        let body = OutputStateUpdate {
            did,
            status: [state.as_str(), "", "OK", ""],
            kind: "outlet",
        };
        debug!(did, %state, "setting output state");
        self.put_json(&format!("{}/outputs/{did}", paths::STATUS), &body)
            .await
    }

    /// Write back one output's control program.
    ///
    /// `PUT /rest/config/oconf/{did}`
    pub async fn put_output_config(&mut self, record: &OutputConfig) -> Result<Value, Error> {
        debug!(did = %record.did, ctype = %record.ctype, "writing output config");
        self.put_json(&format!("{}/oconf/{}", paths::CONFIG, record.did), record)
            .await
    }

    /// Write back a dosing profile into its 1-based slot.
    ///
    /// `PUT /rest/config/pconf/{index}`
    pub async fn put_profile(&mut self, index: u32, profile: &Profile) -> Result<Value, Error> {
        debug!(index, name = %profile.name, "writing profile");
        self.put_json(&format!("{}/pconf/{index}", paths::CONFIG), profile)
            .await
    }

    /// Write back a module record.
    ///
    /// `PUT /rest/config/mconf/{abaddr}`
    pub async fn put_module_config(&mut self, module: &ModuleConfig) -> Result<Value, Error> {
        debug!(abaddr = module.abaddr, hwtype = %module.hwtype, "writing module config");
        self.put_json(&format!("{}/mconf/{}", paths::CONFIG, module.abaddr), module)
            .await
    }

    /// Write back the network/firmware record.
    ///
    /// `PUT /rest/config/nconf`
    pub async fn put_network_config(&mut self, nconf: &NetworkConfig) -> Result<Value, Error> {
        debug!(update = ?nconf.update_firmware, "writing network config");
        self.put_json(&format!("{}/nconf", paths::CONFIG), nconf).await
    }
}
