// Shared fixtures for the engine tests: a wiremock Central, a fleet
// wired to it and helpers to read back what a cycle reported.
#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value, json};
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fleetscan_api::{Authenticator, CentralClient, ClientCredential, Credential, TokenStore};
use fleetscan_core::{
    AuditLayout, AuditSheet, Fleet, RemediationConfig, Reporter, StatusColor, StatusEvent,
};

pub const GATEWAYS: &str = "/monitoring/v1/gateways";
pub const SWITCHES: &str = "/monitoring/v1/switches";
pub const APS: &str = "/monitoring/v2/aps";
pub const INVENTORY: &str = "/platform/device_inventory/v1/devices";

pub fn client(server: &MockServer) -> CentralClient {
    let http = reqwest::Client::new();
    let tokens = TokenStore::new(
        &server.uri(),
        http.clone(),
        ClientCredential::new("client-1", "secret-1"),
        Credential::new("token", "refresh", 7200, 0),
    )
    .unwrap();
    CentralClient::new(
        &server.uri(),
        http,
        Authenticator::new(Arc::new(tokens)),
        Duration::from_secs(5),
    )
    .unwrap()
}

pub fn config() -> RemediationConfig {
    RemediationConfig {
        settle_delay: Duration::ZERO,
        ..RemediationConfig::default()
    }
}

pub fn fleet(server: &MockServer, config: RemediationConfig) -> Fleet {
    Fleet::new(client(server), config)
}

pub fn device(serial: &str, group: &str, firmware: Option<&str>, status: &str) -> Value {
    json!({
        "serial": serial,
        "group_name": group,
        "firmware_version": firmware,
        "status": status
    })
}

pub fn switch(serial: &str, switch_type: &str) -> Value {
    json!({
        "serial": serial,
        "group_name": "default",
        "firmware_version": "16.11.0010",
        "status": "Up",
        "switch_type": switch_type
    })
}

fn page(key: &str, items: Vec<Value>) -> Value {
    let mut body = Map::new();
    body.insert("total".into(), json!(items.len()));
    body.insert(key.into(), Value::Array(items));
    Value::Object(body)
}

/// Serve `items` on the first page of `endpoint` and nothing after.
pub async fn mount_listing(server: &MockServer, endpoint: &str, key: &str, items: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(key, items)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(key, Vec::new())))
        .mount(server)
        .await;
}

/// Mount all three monitoring listings.
pub async fn mount_fleet(
    server: &MockServer,
    gateways: Vec<Value>,
    switches: Vec<Value>,
    aps: Vec<Value>,
) {
    mount_listing(server, GATEWAYS, "gateways", gateways).await;
    mount_listing(server, SWITCHES, "switches", switches).await;
    mount_listing(server, APS, "aps", aps).await;
}

pub fn reporter() -> (Reporter, mpsc::UnboundedReceiver<StatusEvent>, Arc<AuditSheet>) {
    reporter_with(AuditLayout::Firmware)
}

pub fn reporter_with(
    layout: AuditLayout,
) -> (Reporter, mpsc::UnboundedReceiver<StatusEvent>, Arc<AuditSheet>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sheet = Arc::new(AuditSheet::in_memory(layout));
    let audit: Arc<dyn fleetscan_core::AuditLog> = sheet.clone();
    (Reporter::new(Arc::new(tx), Some(audit)), rx, sheet)
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<StatusEvent>) -> Vec<StatusEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}

/// Headline statuses emitted since the last drain.
pub fn statuses(rx: &mut mpsc::UnboundedReceiver<StatusEvent>) -> Vec<(String, StatusColor)> {
    drain(rx)
        .into_iter()
        .filter_map(|e| match e {
            StatusEvent::Status { value, color } => Some((value, color)),
            _ => None,
        })
        .collect()
}

pub fn status(value: &str, color: StatusColor) -> (String, StatusColor) {
    (value.to_owned(), color)
}
