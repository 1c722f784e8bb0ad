// ── Controller abstraction ──
//
// Owns the API client, the generation backend, and the cached device
// state. All operations take `&mut self`: one caller drives a controller
// at a time, so no internal locking is needed.

use tracing::{debug, info, warn};

use apex_api::{ApexClient, Config, Generation, Output, OutputState, Status};

use crate::backend::Backend;
use crate::config::ControllerConfig;
use crate::error::CoreError;

// ── DeviceState ──────────────────────────────────────────────────

/// Last successfully fetched snapshots. Each is replaced only when a
/// fetch (or a write that changes it) succeeds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    pub status: Option<Status>,
    pub config: Option<Config>,
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
pub struct Controller {
    config: ControllerConfig,
    client: ApexClient,
    backend: Option<Backend>,
    state: DeviceState,
}

impl Controller {
    /// Create a controller. Does NOT connect: call
    /// [`connect()`](Self::connect), or let the first operation
    /// authenticate lazily.
    pub fn new(config: ControllerConfig) -> Result<Self, CoreError> {
        let client = ApexClient::new(config.url.clone(), config.credentials(), &config.transport())?;
        Ok(Self {
            config,
            client,
            backend: None,
            state: DeviceState::default(),
        })
    }

    /// Access the controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Firmware generation, once detected.
    pub fn generation(&self) -> Option<Generation> {
        self.backend.as_ref().map(Backend::generation)
    }

    /// Cached snapshots.
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Last fetched status, if any.
    pub fn status(&self) -> Option<&Status> {
        self.state.status.as_ref()
    }

    /// Last fetched configuration, if any. Always empty on legacy firmware.
    pub fn device_config(&self) -> Option<&Config> {
        self.state.config.as_ref()
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Authenticate, detect the firmware generation, and load status and
    /// configuration.
    pub async fn connect(&mut self) -> Result<Generation, CoreError> {
        let generation = self.split().await?.0.generation();
        info!(%generation, url = %self.config.url, "connected to controller");
        self.refresh().await?;
        Ok(generation)
    }

    /// Fetch status, then configuration.
    ///
    /// A failed fetch keeps the previous snapshot and is only an error
    /// when there is no snapshot to fall back to.
    pub async fn refresh(&mut self) -> Result<(), CoreError> {
        if let Err(e) = self.refresh_status().await {
            if self.state.status.is_none() {
                return Err(e);
            }
            warn!(error = %e, "status refresh failed, keeping previous snapshot");
        }
        if let Err(e) = self.refresh_config().await {
            if self.state.config.is_none() {
                return Err(e);
            }
            warn!(error = %e, "config refresh failed, keeping previous snapshot");
        }
        Ok(())
    }

    /// Fetch live status and replace the cached snapshot.
    pub async fn refresh_status(&mut self) -> Result<&Status, CoreError> {
        let (backend, client) = self.split().await?;
        let status = backend.fetch_status(client).await?;
        debug!(
            inputs = status.inputs.len(),
            outputs = status.outputs.len(),
            "status refreshed"
        );
        Ok(self.state.status.insert(status))
    }

    /// Fetch the configuration and replace the cached snapshot.
    pub async fn refresh_config(&mut self) -> Result<&Config, CoreError> {
        let (backend, client) = self.split().await?;
        let config = backend.fetch_config(client).await?;
        debug!(
            oconf = config.oconf.len(),
            mconf = config.mconf.len(),
            pconf = config.pconf.len(),
            "config refreshed"
        );
        Ok(self.state.config.insert(config))
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Switch an output to `AUTO`, `ON`, or `OFF`.
    ///
    /// Returns the updated record when the device echoes one (REST
    /// firmware); the cached status entry is replaced with it.
    pub async fn set_output_state(
        &mut self,
        did: &str,
        state: OutputState,
    ) -> Result<Option<Output>, CoreError> {
        let (backend, client) = self.split().await?;
        let echoed = backend.set_output(client, did, state).await?;
        info!(did, %state, "output state set");

        if let (Some(output), Some(status)) = (&echoed, self.state.status.as_mut()) {
            if let Some(cached) = status.outputs.iter_mut().find(|o| o.did == output.did) {
                cached.clone_from(output);
            }
        }
        Ok(echoed)
    }

    // ── Internals shared by command modules ──────────────────────

    /// The backend (authenticating on first use) alongside the client.
    async fn split(&mut self) -> Result<(&mut Backend, &mut ApexClient), CoreError> {
        let backend = match self.backend.take() {
            Some(backend) => backend,
            None => {
                let generation = self.client.authenticate().await?;
                debug!(%generation, "firmware generation detected");
                Backend::new(generation, self.config.legacy_format)
            }
        };
        Ok((self.backend.insert(backend), &mut self.client))
    }

    /// Cached configuration for a config-editing command, fetched on
    /// first use. Fails on firmware without a config API.
    pub(crate) async fn editable_config(&mut self, operation: &str) -> Result<&Config, CoreError> {
        if self.split().await?.0.generation() == Generation::Legacy {
            warn!(operation, "operation needs the REST config API");
            return Err(CoreError::legacy_unsupported(operation));
        }
        if self.state.config.is_none() {
            self.refresh_config().await?;
        }
        self.state
            .config
            .as_ref()
            .ok_or_else(|| CoreError::not_found("configuration", operation))
    }

    /// Mutable access to the cached configuration, for write-back after a
    /// successful remote write.
    pub(crate) fn config_cache_mut(&mut self) -> Option<&mut Config> {
        self.state.config.as_mut()
    }

    /// The API client, for writes that bypass backend routing (config
    /// writes only exist on REST firmware).
    pub(crate) fn client_mut(&mut self) -> &mut ApexClient {
        &mut self.client
    }
}
