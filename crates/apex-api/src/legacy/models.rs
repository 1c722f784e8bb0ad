// Legacy status document types
//
// Classic firmware serves its status either as XML (`status.xml`) or as an
// `istat` JSON document (`status.json`), depending on the firmware
// revision. Both are loosely structured: fields come and go, and list
// elements with a single entry may arrive unwrapped. Every field is
// defaulted and lists accept a bare object.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ── XML variant ──────────────────────────────────────────────────────

/// Root of `/cgi-bin/status.xml`:
///
/// ```xml
/// <status software="4.53_1A17" hardware="1.0">
///   <hostname>apex</hostname>
///   <serial>AC4:12345</serial>
///   <probes><probe><name>Temp</name><value>77.1</value><type>Temp</type></probe></probes>
///   <outlets><outlet><name>Heater</name><outputID>0</outputID><state>AOF</state><deviceID>base_Var1</deviceID></outlet></outlets>
/// </status>
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct XmlStatus {
    #[serde(rename = "@software", default)]
    pub software: String,
    #[serde(rename = "@hardware", default)]
    pub hardware: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub probes: XmlProbes,
    #[serde(default)]
    pub outlets: XmlOutlets,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct XmlProbes {
    #[serde(default)]
    pub probe: Vec<XmlProbe>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct XmlProbe {
    #[serde(default)]
    pub name: String,
    /// Text content; numeric for most probes, may be blank for offline ones.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct XmlOutlets {
    #[serde(default)]
    pub outlet: Vec<XmlOutlet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct XmlOutlet {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "outputID", default)]
    pub output_id: Option<String>,
    /// `AON`, `AOF`, `ON`, `OFF`, `TBL`, ...
    #[serde(default)]
    pub state: Option<String>,
    #[serde(rename = "deviceID", default)]
    pub device_id: String,
}

// ── JSON variant ─────────────────────────────────────────────────────

/// Root of `/cgi-bin/status.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonStatus {
    #[serde(default)]
    pub istat: Istat,
}

/// The `istat` block of `status.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Istat {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub software: String,
    #[serde(default)]
    pub hardware: String,
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(rename = "type", default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub inputs: Vec<IstatInput>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub outputs: Vec<IstatOutput>,
    #[serde(default)]
    pub feed: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IstatInput {
    #[serde(default)]
    pub did: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Number on most firmware, occasionally a numeric string.
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IstatOutput {
    #[serde(default)]
    pub did: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Vec<String>,
    #[serde(rename = "ID", default)]
    pub id: Option<Value>,
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Accept either a JSON array or a single bare element.
fn one_or_many<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(de)? {
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
        None => Vec::new(),
    })
}

/// Parse a `status.xml` body.
pub fn parse_xml_status(body: &str) -> Result<XmlStatus, crate::Error> {
    quick_xml::de::from_str(body).map_err(|e| crate::Error::Xml {
        message: e.to_string(),
    })
}
