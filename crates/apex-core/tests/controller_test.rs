#![allow(clippy::unwrap_used)]
// Integration tests for `Controller` against a mocked controller.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_json, body_string_contains, method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use apex_core::{Controller, ControllerConfig, CoreError, Generation, OutputState};

// ── Helpers ─────────────────────────────────────────────────────────

fn config_for(server: &MockServer) -> ControllerConfig {
    ControllerConfig::new(Url::parse(&server.uri()).unwrap(), "admin", "pw".to_string())
}

fn status_body() -> Value {
    json!({
        "system": { "hostname": "reef", "software": "5.08_7A18L", "hardware": "1.0", "serial": "AC5:1", "type": "AC5" },
        "inputs": [{ "did": "base_Temp", "type": "Temp", "name": "Tmp", "value": 25.4 }],
        "outputs": [
            { "status": ["AON", "", "OK", ""], "name": "Return", "type": "outlet", "ID": 1, "did": "2_1" },
            { "status": ["AOF", "", "OK", ""], "name": "Heater", "type": "outlet", "ID": 3, "did": "2_3" }
        ],
        "feed": { "name": 0, "active": 0 }
    })
}

fn config_body() -> Value {
    json!({
        "oconf": [
            { "did": "1_1", "name": "DOS_1", "ctype": "Advanced", "prog": "Fallback OFF", "gid": "0" },
            { "did": "1_2", "name": "DOS_2", "ctype": "Advanced", "prog": "Fallback OFF" },
            { "did": "2_3", "name": "Heater", "ctype": "Heater", "prog": "Fallback OFF", "log": true },
            { "did": "base_Var1", "name": "Var1", "ctype": "Advanced", "prog": "Set OFF" }
        ],
        "mconf": [
            { "abaddr": 1, "hwtype": "DOS", "name": "DOS_1", "extra": { "volume": [500, 1000], "volumeLeft": [120, 990], "cal": [1, 1] } },
            { "abaddr": 2, "hwtype": "EB832", "extra": {} }
        ],
        "pconf": [
            { "ID": 1, "name": "Profile1", "type": "ramp", "data": { "mode": 0, "amount": 0, "time": 0, "count": 0 } },
            { "ID": 2, "name": "Profile2", "type": "ramp", "data": { "mode": 0, "amount": 0, "time": 0, "count": 0 } },
            { "ID": 3, "name": "Profile3", "type": "ramp", "data": { "mode": 0, "amount": 0, "time": 0, "count": 0 } },
            { "ID": 5, "name": "Profile5", "type": "ramp", "data": { "mode": 0, "amount": 0, "time": 0, "count": 0 } }
        ],
        "iconf": [],
        "nconf": { "latestFirmware": "5.10_8B21", "updateFirmware": false, "hostname": "reef" }
    })
}

async fn mount_modern(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/rest/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "connect.sid": "abc" })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(config_body()))
        .mount(server)
        .await;
}

/// Connected controller against a modern device, plus the mock server.
async fn setup_modern() -> (MockServer, Controller) {
    let server = MockServer::start().await;
    mount_modern(&server).await;
    let mut controller = Controller::new(config_for(&server)).unwrap();
    assert_eq!(controller.connect().await.unwrap(), Generation::Modern);
    (server, controller)
}

/// Accept any PUT under `/rest/config/` and echo an empty object.
async fn accept_config_writes(server: &MockServer) {
    Mock::given(method("PUT"))
        .and(path_regex(r"^/rest/config/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .with_priority(10)
        .mount(server)
        .await;
}

async fn puts(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method == wiremock::http::Method::PUT)
        .collect()
}

fn body(request: &Request) -> Value {
    serde_json::from_slice(&request.body).unwrap()
}

// ── Connection ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_loads_status_and_config() {
    let (_server, controller) = setup_modern().await;

    let status = controller.status().unwrap();
    assert_eq!(status.outputs.len(), 2);
    assert_eq!(status.input("base_Temp").unwrap().value, Some(25.4));

    let config = controller.device_config().unwrap();
    assert_eq!(config.pconf.len(), 4);

    let firmware = controller.firmware_info().unwrap();
    assert_eq!(firmware.installed, "5.08_7A18");
    assert_eq!(firmware.latest.as_deref(), Some("5.10_8B21"));
    assert!(firmware.update_available());
}

#[tokio::test]
async fn test_connect_fails_when_login_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/login"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
        .expect(0)
        .mount(&server)
        .await;

    let mut controller = Controller::new(config_for(&server)).unwrap();
    let result = controller.connect().await;

    assert!(
        matches!(result, Err(CoreError::AuthenticationFailed { .. })),
        "got: {result:?}"
    );
    assert!(controller.status().is_none());
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "connect.sid": "abc" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(config_body()))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/config"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(2)
        .mount(&server)
        .await;

    let mut controller = Controller::new(config_for(&server)).unwrap();
    controller.connect().await.unwrap();
    let before = controller.device_config().cloned();

    assert!(controller.refresh_config().await.is_err());
    controller.refresh().await.unwrap();

    assert_eq!(controller.device_config().cloned(), before);
}

// ── Output state ────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_output_state_updates_cached_status() {
    let (server, mut controller) = setup_modern().await;

    Mock::given(method("PUT"))
        .and(path("/rest/status/outputs/2_1"))
        .and(body_json(json!({ "did": "2_1", "status": ["OFF", "", "OK", ""], "type": "outlet" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "did": "2_1", "name": "Return", "type": "outlet", "ID": 1, "status": ["OFF", "", "OK", ""]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let echoed = controller
        .set_output_state("2_1", OutputState::Off)
        .await
        .unwrap();

    assert_eq!(echoed.unwrap().state(), Some("OFF"));
    assert_eq!(controller.status().unwrap().output("2_1").unwrap().state(), Some("OFF"));
}

// ── Program writer ──────────────────────────────────────────────────

#[tokio::test]
async fn test_set_temperature_writes_heater_program() {
    let (server, mut controller) = setup_modern().await;

    Mock::given(method("PUT"))
        .and(path("/rest/config/oconf/2_3"))
        .and(body_json(json!({
            "did": "2_3",
            "name": "Heater",
            "ctype": "Heater",
            "prog": "Fallback OFF\nIf Tmp < 25.5 Then ON\nIf Tmp > 25.5 Then OFF\n",
            "log": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    controller.set_temperature("2_3", 25.5).await.unwrap();

    let cached = controller.get_output("2_3", Some("Heater")).unwrap();
    assert!(cached.prog.contains("If Tmp < 25.5 Then ON"));
}

#[tokio::test]
async fn test_set_temperature_rejects_non_heater() {
    let (server, mut controller) = setup_modern().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = controller.set_temperature("base_Var1", 25.0).await;

    match result {
        Err(CoreError::ControlTypeMismatch { expected, actual, .. }) => {
            assert_eq!(expected, "Heater");
            assert_eq!(actual, "Advanced");
        }
        other => panic!("expected ControlTypeMismatch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_set_variable_changes_only_the_program() {
    let (server, mut controller) = setup_modern().await;
    accept_config_writes(&server).await;

    controller.set_variable("2_3", "Set ON").await.unwrap();

    let writes = puts(&server).await;
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].url.path(), "/rest/config/oconf/2_3");
    assert_eq!(
        body(&writes[0]),
        json!({ "did": "2_3", "name": "Heater", "ctype": "Heater", "prog": "Set ON", "log": true })
    );
}

#[tokio::test]
async fn test_set_variable_unknown_output() {
    let (_server, mut controller) = setup_modern().await;

    let result = controller.set_variable("9_9", "Set ON").await;

    assert!(matches!(result, Err(CoreError::NotFound { .. })), "got: {result:?}");
}

// ── Dosing ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_dosing_rate_fast_mode_sequence() {
    let (server, mut controller) = setup_modern().await;
    accept_config_writes(&server).await;

    controller.set_dosing_rate("1_1", 3, 2.0).await.unwrap();

    let writes = puts(&server).await;
    let paths: Vec<&str> = writes.iter().map(|r| r.url.path()).collect();
    assert_eq!(
        paths,
        vec!["/rest/config/oconf/1_1", "/rest/config/pconf/3", "/rest/config/oconf/1_1"]
    );
    assert_eq!(
        body(&writes[0]),
        json!({ "did": "1_1", "name": "DOS_1", "ctype": "Advanced", "prog": "Set OFF", "gid": "0" })
    );
    assert_eq!(
        body(&writes[1]),
        json!({
            "ID": 3,
            "name": "Dose_1_1",
            "type": "dose",
            "data": { "mode": 21, "amount": 2.0, "time": 60, "count": 255 }
        })
    );
    assert_eq!(body(&writes[2])["prog"], "Set Dose_1_1");

    let cached = &controller.device_config().unwrap().pconf[2];
    assert_eq!(cached.name, "Dose_1_1");
    assert_eq!(cached.data.mode, 21);
}

#[tokio::test]
async fn test_set_dosing_rate_slow_mode() {
    let (server, mut controller) = setup_modern().await;
    accept_config_writes(&server).await;

    controller.set_dosing_rate("1_2", 1, 0.1).await.unwrap();

    let writes = puts(&server).await;
    assert_eq!(writes[1].url.path(), "/rest/config/pconf/1");
    assert_eq!(
        body(&writes[1])["data"],
        json!({ "mode": 21, "amount": 1.0, "time": 600, "count": 255 })
    );
}

#[tokio::test]
async fn test_zero_rate_only_switches_pump_off() {
    let (server, mut controller) = setup_modern().await;
    accept_config_writes(&server).await;

    controller.set_dosing_rate("1_1", 3, 0.0).await.unwrap();

    let writes = puts(&server).await;
    assert_eq!(writes.len(), 1);
    assert_eq!(body(&writes[0])["prog"], "Set OFF");
}

#[tokio::test]
async fn test_rate_above_limit_writes_no_profile() {
    let (server, mut controller) = setup_modern().await;
    accept_config_writes(&server).await;

    let result = controller.set_dosing_rate("1_1", 3, 130.0).await;

    match result {
        Err(CoreError::RateOutOfRange { limit, .. }) => assert_eq!(limit, 125.0),
        other => panic!("expected RateOutOfRange, got {other:?}"),
    }
    let writes = puts(&server).await;
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].url.path(), "/rest/config/oconf/1_1");
}

#[tokio::test]
async fn test_dosing_rejects_non_dosing_module() {
    let (server, mut controller) = setup_modern().await;
    accept_config_writes(&server).await;

    let result = controller.set_dosing_rate("2_1", 1, 1.0).await;

    assert!(matches!(result, Err(CoreError::HardwareMismatch { abaddr: 2, .. })), "got: {result:?}");
    assert!(puts(&server).await.is_empty());
}

#[tokio::test]
async fn test_dosing_rejects_profile_mismatch() {
    let (server, mut controller) = setup_modern().await;
    accept_config_writes(&server).await;

    let result = controller.set_dosing_rate("1_1", 4, 1.0).await;

    assert!(
        matches!(result, Err(CoreError::ProfileMismatch { index: 4, actual: 5 })),
        "got: {result:?}"
    );
    assert!(puts(&server).await.is_empty());
}

#[tokio::test]
async fn test_dosing_rejects_bad_pump_number() {
    let (server, mut controller) = setup_modern().await;
    accept_config_writes(&server).await;

    let result = controller.set_dosing_rate("1_3", 1, 1.0).await;

    assert!(matches!(result, Err(CoreError::InvalidDeviceId { .. })), "got: {result:?}");
    assert!(puts(&server).await.is_empty());
}

#[tokio::test]
async fn test_failed_profile_write_leaves_pump_off() {
    let (server, mut controller) = setup_modern().await;
    Mock::given(method("PUT"))
        .and(path("/rest/config/pconf/3"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    accept_config_writes(&server).await;

    let result = controller.set_dosing_rate("1_1", 3, 2.0).await;

    assert!(matches!(result, Err(CoreError::Api { status: Some(500), .. })), "got: {result:?}");
    let writes = puts(&server).await;
    assert_eq!(writes.len(), 2);
    assert_eq!(body(&writes[0])["prog"], "Set OFF");
    assert_eq!(controller.device_config().unwrap().pconf[2].name, "Profile3");
}

#[tokio::test]
async fn test_refill_reservoir() {
    let (server, mut controller) = setup_modern().await;
    Mock::given(method("PUT"))
        .and(path("/rest/config/mconf/1"))
        .and(body_json(json!({
            "abaddr": 1,
            "hwtype": "DOS",
            "name": "DOS_1",
            "extra": { "volume": [500, 1000], "volumeLeft": [120, 1000], "cal": [1, 1] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    controller.refill_reservoir("1_2").await.unwrap();
}

// ── Firmware ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_update_firmware() {
    let (server, mut controller) = setup_modern().await;
    Mock::given(method("PUT"))
        .and(path("/rest/config/nconf"))
        .and(body_json(json!({ "latestFirmware": "5.10_8B21", "updateFirmware": true, "hostname": "reef" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    controller.update_firmware().await.unwrap();

    let nconf = controller.device_config().unwrap().nconf.clone().unwrap();
    assert_eq!(nconf.update_firmware, Some(true));
}

// ── Legacy firmware ─────────────────────────────────────────────────

async fn mount_legacy_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/rest/login"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_legacy_xml_fallback_and_outlet_control() {
    let server = MockServer::start().await;
    mount_legacy_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/status.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/status.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<status software="4.20_5B12" hardware="1.0"><hostname>classic</hostname>
               <probes><probe><name>Temp</name><value>77.0</value><type>Temp</type></probe></probes>
               <outlets><outlet><name>Light</name><outputID>2</outputID><state>AON</state><deviceID>3_1</deviceID></outlet></outlets>
               </status>"#,
        ))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/status.cgi"))
        .and(body_string_contains("Light_state=1"))
        .and(body_string_contains("noResponse=1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = Controller::new(config_for(&server)).unwrap();
    assert_eq!(controller.connect().await.unwrap(), Generation::Legacy);

    let status = controller.status().unwrap();
    assert_eq!(status.system.software, "4.20_5B12");
    assert_eq!(status.outputs[0].did, "3_1");
    assert!(controller.device_config().unwrap().is_empty());

    // The detected format is remembered: status.json is not asked again.
    controller.refresh_status().await.unwrap();

    let echoed = controller
        .set_output_state("3_1", OutputState::Off)
        .await
        .unwrap();
    assert!(echoed.is_none());
}

#[tokio::test]
async fn test_legacy_json_singleton_probe() {
    let server = MockServer::start().await;
    mount_legacy_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/status.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "istat": {
                "software": "4.53_1A17",
                "hardware": "1.0",
                "inputs": { "name": "pH", "value": 8.1 },
                "outputs": []
            }
        })))
        .mount(&server)
        .await;

    let mut controller = Controller::new(config_for(&server)).unwrap();
    controller.connect().await.unwrap();

    let inputs = &controller.status().unwrap().inputs;
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].kind, "variable");
}

#[tokio::test]
async fn test_legacy_rejects_config_commands_and_unknown_outlets() {
    let server = MockServer::start().await;
    mount_legacy_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/status.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "istat": { "software": "4.53", "hardware": "1.0", "outputs": [{ "did": "2_1", "name": "Return" }] }
        })))
        .mount(&server)
        .await;

    let mut controller = Controller::new(config_for(&server)).unwrap();
    controller.connect().await.unwrap();

    let result = controller.set_variable("2_1", "Set ON").await;
    assert!(matches!(result, Err(CoreError::Unsupported { .. })), "got: {result:?}");

    let result = controller.update_firmware().await;
    assert!(matches!(result, Err(CoreError::Unsupported { .. })), "got: {result:?}");

    let result = controller.set_output_state("9_9", OutputState::On).await;
    assert!(matches!(result, Err(CoreError::NotFound { .. })), "got: {result:?}");
}
