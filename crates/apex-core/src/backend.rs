// ── Generation backends ──
//
// The two firmware generations expose different endpoints and payloads
// for the same three operations. `Backend` is chosen once, from the
// generation the session manager detected, and routes each call.

use std::collections::HashMap;

use tracing::{debug, error, info};

use apex_api::{ApexClient, Config, Generation, LegacyFormat, Output, OutputState, Status};

use crate::convert::{outlet_names, status_from_istat, status_from_xml};
use crate::error::CoreError;

/// Per-generation request routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// `/rest/*` JSON endpoints; payloads are already canonical.
    Modern,
    /// `/cgi-bin/*` endpoints.
    Legacy {
        /// Status document in use. `Auto` is resolved on the first fetch.
        format: LegacyFormat,
        /// did → outlet name, refreshed with every status fetch. Legacy
        /// control addresses outlets by name.
        names: HashMap<String, String>,
    },
}

impl Backend {
    pub fn new(generation: Generation, format: LegacyFormat) -> Self {
        match generation {
            Generation::Modern => Self::Modern,
            Generation::Legacy => Self::Legacy {
                format,
                names: HashMap::new(),
            },
        }
    }

    pub fn generation(&self) -> Generation {
        match self {
            Self::Modern => Generation::Modern,
            Self::Legacy { .. } => Generation::Legacy,
        }
    }

    /// Fetch live status in canonical form.
    pub async fn fetch_status(&mut self, client: &mut ApexClient) -> Result<Status, CoreError> {
        match self {
            Self::Modern => Ok(client.fetch_status().await?),
            Self::Legacy { format, names } => {
                let status = fetch_legacy_status(client, format).await?;
                *names = outlet_names(&status);
                Ok(status)
            }
        }
    }

    /// Fetch the editable configuration. Legacy firmware has none and
    /// yields the empty default.
    pub async fn fetch_config(&self, client: &mut ApexClient) -> Result<Config, CoreError> {
        match self {
            Self::Modern => Ok(client.fetch_config().await?),
            Self::Legacy { .. } => {
                debug!("legacy firmware has no config API");
                Ok(Config::default())
            }
        }
    }

    /// Switch an output. Returns the record the device echoed back, which
    /// only the modern API does.
    pub async fn set_output(
        &self,
        client: &mut ApexClient,
        did: &str,
        state: OutputState,
    ) -> Result<Option<Output>, CoreError> {
        match self {
            Self::Modern => Ok(Some(client.set_output_state(did, state).await?)),
            Self::Legacy { names, .. } => {
                let Some(name) = names.get(did) else {
                    error!(did, "output not present in the legacy outlet table");
                    return Err(CoreError::not_found("output", did));
                };
                client.set_legacy_outlet(name, state).await?;
                Ok(None)
            }
        }
    }
}

async fn fetch_legacy_status(
    client: &mut ApexClient,
    format: &mut LegacyFormat,
) -> Result<Status, CoreError> {
    match *format {
        LegacyFormat::Json => Ok(status_from_istat(client.fetch_legacy_json_status().await?)),
        LegacyFormat::Xml => Ok(status_from_xml(client.fetch_legacy_xml_status().await?)),
        LegacyFormat::Auto => match client.fetch_legacy_json_status().await {
            Ok(istat) => {
                info!("legacy device serves status.json");
                *format = LegacyFormat::Json;
                Ok(status_from_istat(istat))
            }
            Err(e) if e.is_not_found() => {
                info!("status.json missing, using status.xml");
                let doc = client.fetch_legacy_xml_status().await?;
                *format = LegacyFormat::Xml;
                Ok(status_from_xml(doc))
            }
            Err(e) => Err(e.into()),
        },
    }
}
