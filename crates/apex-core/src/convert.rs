// ── Legacy-to-canonical conversions ──
//
// Classic firmware reports status as an `istat` JSON document or a
// `status.xml` tree. Both are mapped here into the canonical `Status`
// record the REST firmware returns natively, so callers see one schema
// regardless of generation.

use std::collections::HashMap;

use serde_json::{Map, Value};

use apex_api::legacy::models::{Istat, IstatInput, IstatOutput, XmlOutlet, XmlProbe, XmlStatus};
use apex_api::{FeedState, Input, Output, Status, SystemInfo};

/// Probe type assumed when the device omits one.
const DEFAULT_INPUT_KIND: &str = "variable";
/// Output type reported for every legacy outlet.
const LEGACY_OUTPUT_KIND: &str = "outlet";

// ── Helpers ────────────────────────────────────────────────────────

/// Numeric reading from a JSON number or a numeric string.
fn parse_reading(raw: Option<&Value>) -> Option<f64> {
    match raw? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Output index from a number or a numeric string; 0 when absent.
fn parse_index(raw: Option<&Value>) -> u32 {
    match raw {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn input_kind(raw: Option<String>) -> String {
    raw.filter(|k| !k.is_empty())
        .unwrap_or_else(|| DEFAULT_INPUT_KIND.to_owned())
}

/// `[state, intensity, health, extra]` in the REST layout.
fn status_tuple(state: String) -> Vec<String> {
    vec![state, String::new(), "OK".into(), String::new()]
}

// ── istat (status.json) ────────────────────────────────────────────

fn input_from_istat(raw: IstatInput) -> Input {
    Input {
        did: raw.did.filter(|d| !d.is_empty()).unwrap_or_else(|| raw.name.clone()),
        value: parse_reading(raw.value.as_ref()),
        kind: input_kind(raw.kind),
        name: raw.name,
        extra: Map::new(),
    }
}

fn output_from_istat(raw: IstatOutput) -> Output {
    let status = if raw.status.is_empty() {
        status_tuple(String::new())
    } else {
        raw.status
    };
    Output {
        did: if raw.did.is_empty() { raw.name.clone() } else { raw.did },
        name: raw.name,
        kind: raw
            .kind
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| LEGACY_OUTPUT_KIND.to_owned()),
        status,
        id: parse_index(raw.id.as_ref()),
        extra: Map::new(),
    }
}

/// Translate an `istat` document into canonical status.
pub fn status_from_istat(istat: Istat) -> Status {
    let feed = istat
        .feed
        .and_then(|v| serde_json::from_value::<FeedState>(v).ok())
        .unwrap_or_default();

    Status {
        system: SystemInfo {
            software: istat.software,
            hardware: istat.hardware,
            hostname: istat.hostname,
            serial: istat.serial,
            model: istat.model,
            timezone: None,
            extra: Map::new(),
        },
        inputs: istat.inputs.into_iter().map(input_from_istat).collect(),
        outputs: istat.outputs.into_iter().map(output_from_istat).collect(),
        feed,
        extra: Map::new(),
    }
}

// ── status.xml ─────────────────────────────────────────────────────

fn input_from_xml(raw: XmlProbe) -> Input {
    Input {
        did: raw.name.clone(),
        value: raw.value.as_deref().and_then(|v| v.trim().parse().ok()),
        kind: input_kind(raw.kind),
        name: raw.name,
        extra: Map::new(),
    }
}

fn output_from_xml(raw: XmlOutlet) -> Output {
    Output {
        did: if raw.device_id.is_empty() {
            raw.name.clone()
        } else {
            raw.device_id
        },
        name: raw.name,
        kind: LEGACY_OUTPUT_KIND.to_owned(),
        status: status_tuple(raw.state.unwrap_or_default()),
        id: raw
            .output_id
            .as_deref()
            .and_then(|id| id.trim().parse().ok())
            .unwrap_or(0),
        extra: Map::new(),
    }
}

/// Translate a `status.xml` document into canonical status.
pub fn status_from_xml(doc: XmlStatus) -> Status {
    Status {
        system: SystemInfo {
            software: doc.software,
            hardware: doc.hardware,
            hostname: doc.hostname,
            serial: doc.serial,
            model: None,
            timezone: doc.timezone,
            extra: Map::new(),
        },
        inputs: doc.probes.probe.into_iter().map(input_from_xml).collect(),
        outputs: doc.outlets.outlet.into_iter().map(output_from_xml).collect(),
        feed: FeedState::default(),
        extra: Map::new(),
    }
}

/// Device id to display name, for addressing legacy outlets by name.
pub fn outlet_names(status: &Status) -> HashMap<String, String> {
    status
        .outputs
        .iter()
        .map(|o| (o.did.clone(), o.name.clone()))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use apex_api::legacy::models::{JsonStatus, parse_xml_status};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn xml_status_maps_to_canonical_shape() {
        let doc = parse_xml_status(
            r#"<status software="4.53_1A17" hardware="1.0">
                 <hostname>reef</hostname><serial>AC4:1</serial>
                 <probes><probe><name>Temp</name><value> 77.1 </value><type>Temp</type></probe></probes>
                 <outlets><outlet><name>Heater</name><outputID>4</outputID><state>AOF</state><deviceID>3_2</deviceID></outlet></outlets>
               </status>"#,
        )
        .unwrap();

        let status = status_from_xml(doc);

        assert_eq!(status.system.software, "4.53_1A17");
        assert_eq!(status.system.hostname.as_deref(), Some("reef"));
        assert_eq!(status.inputs.len(), 1);
        assert_eq!(status.inputs[0].did, "Temp");
        assert_eq!(status.inputs[0].value, Some(77.1));
        assert_eq!(status.inputs[0].kind, "Temp");

        let heater = &status.outputs[0];
        assert_eq!(heater.did, "3_2");
        assert_eq!(heater.id, 4);
        assert_eq!(heater.kind, "outlet");
        assert_eq!(heater.status, vec!["AOF", "", "OK", ""]);
    }

    #[test]
    fn untyped_probe_defaults_to_variable() {
        let doc = parse_xml_status(
            r#"<status software="4.20" hardware="1.0"><probes><probe><name>Cond</name><value>35.0</value></probe></probes></status>"#,
        )
        .unwrap();

        let status = status_from_xml(doc);

        assert_eq!(status.inputs.len(), 1);
        assert_eq!(status.inputs[0].kind, "variable");
        assert!(status.outputs.is_empty());
    }

    #[test]
    fn istat_singletons_and_string_values() {
        let doc: JsonStatus = serde_json::from_value(json!({
            "istat": {
                "hostname": "classic",
                "software": "4.53_1A17",
                "hardware": "1.0",
                "serial": "AC4:2",
                "type": "AC4",
                "feed": { "name": 1, "active": 1 },
                "inputs": { "name": "pH", "value": "8.10" },
                "outputs": { "did": "2_1", "name": "Return", "status": ["AON", "", "OK", ""], "ID": "7" }
            }
        }))
        .unwrap();

        let status = status_from_istat(doc.istat);

        assert_eq!(status.system.model.as_deref(), Some("AC4"));
        assert_eq!(status.feed.name, 1);
        assert_eq!(status.inputs.len(), 1);
        assert_eq!(status.inputs[0].did, "pH");
        assert_eq!(status.inputs[0].kind, "variable");
        assert_eq!(status.inputs[0].value, Some(8.1));
        assert_eq!(status.outputs.len(), 1);
        assert_eq!(status.outputs[0].id, 7);
        assert_eq!(status.outputs[0].kind, "outlet");
    }

    #[test]
    fn outlet_name_table() {
        let doc: JsonStatus = serde_json::from_value(json!({
            "istat": { "outputs": [
                { "did": "2_1", "name": "Return" },
                { "did": "2_2", "name": "Skimmer" }
            ] }
        }))
        .unwrap();

        let names = outlet_names(&status_from_istat(doc.istat));

        assert_eq!(names.get("2_2").map(String::as_str), Some("Skimmer"));
        assert_eq!(names.len(), 2);
    }
}
