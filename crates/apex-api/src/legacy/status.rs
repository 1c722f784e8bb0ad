// Legacy status and control endpoints
//
// `GET /cgi-bin/status.json`, `GET /cgi-bin/status.xml`, and
// `POST /cgi-bin/status.cgi` for outlet control.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::paths;
use crate::client::{ApexClient, decode_json};
use crate::error::Error;
use crate::legacy::models::{Istat, JsonStatus, XmlStatus, parse_xml_status};
use crate::rest::OutputState;

/// Which status document a legacy device serves.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum LegacyFormat {
    /// Try `status.json`, fall back to `status.xml` when it is missing.
    #[default]
    Auto,
    Json,
    Xml,
}

impl OutputState {
    /// Form value understood by `status.cgi`.
    pub fn legacy_code(self) -> u8 {
        match self {
            Self::Auto => 0,
            Self::Off => 1,
            Self::On => 2,
        }
    }
}

impl ApexClient {
    /// Fetch the JSON status document.
    ///
    /// `GET /cgi-bin/status.json`
    pub async fn fetch_legacy_json_status(&mut self) -> Result<Istat, Error> {
        debug!("fetching legacy JSON status");
        let body = self.get_text(paths::LEGACY_STATUS_JSON).await?;
        let doc: JsonStatus = decode_json(&body)?;
        Ok(doc.istat)
    }

    /// Fetch the XML status document.
    ///
    /// `GET /cgi-bin/status.xml`
    pub async fn fetch_legacy_xml_status(&mut self) -> Result<XmlStatus, Error> {
        debug!("fetching legacy XML status");
        let body = self.get_text(paths::LEGACY_STATUS_XML).await?;
        parse_xml_status(&body)
    }

    /// Switch an outlet, addressed by its display name.
    ///
    /// `POST /cgi-bin/status.cgi` with `{name}_state={0|1|2}&noResponse=1`.
    pub async fn set_legacy_outlet(&mut self, name: &str, state: OutputState) -> Result<(), Error> {
        debug!(name, %state, "setting legacy outlet state");
        let pairs = vec![
            (format!("{name}_state"), state.legacy_code().to_string()),
            ("noResponse".to_owned(), "1".to_owned()),
        ];
        self.post_form(paths::LEGACY_CONTROL, pairs).await?;
        Ok(())
    }
}
