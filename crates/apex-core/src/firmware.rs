// ── Firmware commands ──

use serde::Serialize;
use tracing::{error, info};

use crate::controller::Controller;
use crate::error::CoreError;

/// Installed and available firmware versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirmwareInfo {
    /// Version reported in the status block, without the trailing `L`
    /// marker some builds append.
    pub installed: String,
    /// Latest version the controller knows about; `None` on legacy
    /// firmware or when not yet reported.
    pub latest: Option<String>,
}

impl FirmwareInfo {
    pub fn update_available(&self) -> bool {
        self.latest
            .as_deref()
            .is_some_and(|latest| !latest.is_empty() && latest != self.installed)
    }
}

/// Strip the build marker from a software version string.
pub fn installed_version(software: &str) -> &str {
    software.trim().trim_end_matches('L')
}

impl Controller {
    /// Firmware versions from the cached snapshots. Requires a status
    /// snapshot; refresh first.
    pub fn firmware_info(&self) -> Result<FirmwareInfo, CoreError> {
        let status = self
            .status()
            .ok_or_else(|| CoreError::not_found("status snapshot", "firmware"))?;
        Ok(FirmwareInfo {
            installed: installed_version(&status.system.software).to_owned(),
            latest: self
                .device_config()
                .and_then(|c| c.nconf.as_ref())
                .and_then(|n| n.latest_firmware.clone()),
        })
    }

    /// Ask the controller to install its latest known firmware.
    pub async fn update_firmware(&mut self) -> Result<(), CoreError> {
        let config = self.editable_config("update firmware").await?;
        let Some(nconf) = config.nconf.as_ref() else {
            error!("configuration has no network record");
            return Err(CoreError::not_found("network configuration", "nconf"));
        };

        let mut nconf = nconf.clone();
        nconf.update_firmware = Some(true);
        self.client_mut().put_network_config(&nconf).await?;

        if let Some(config) = self.config_cache_mut() {
            config.nconf = Some(nconf);
        }
        info!("firmware update requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_marker_is_stripped() {
        assert_eq!(installed_version("5.08_7A18L"), "5.08_7A18");
        assert_eq!(installed_version("5.08_7A18"), "5.08_7A18");
    }

    #[test]
    fn update_available_compares_versions() {
        let mut info = FirmwareInfo {
            installed: "5.08_7A18".into(),
            latest: Some("5.10_8B21".into()),
        };
        assert!(info.update_available());
        info.latest = Some("5.08_7A18".into());
        assert!(!info.update_available());
        info.latest = None;
        assert!(!info.update_available());
    }
}
