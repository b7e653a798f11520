#![allow(clippy::unwrap_used)]
// Endpoint contract tests for `CentralClient` using wiremock.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fleetscan_api::models::SkuType;
use fleetscan_api::{
    Authenticator, CentralClient, ClientCredential, Credential, Error, TokenStore,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, CentralClient) {
    let server = MockServer::start().await;
    let http = reqwest::Client::new();
    let tokens = TokenStore::new(
        &server.uri(),
        http.clone(),
        ClientCredential::new("client-1", "secret-1"),
        Credential::new("token", "refresh", 7200, 0),
    )
    .unwrap();
    let client = CentralClient::new(
        &server.uri(),
        http,
        Authenticator::new(Arc::new(tokens)),
        Duration::from_secs(5),
    )
    .unwrap();
    (server, client)
}

fn gateways(range: std::ops::Range<u32>) -> Value {
    let items: Vec<Value> = range
        .map(|i| {
            json!({
                "serial": format!("CN{i:06}"),
                "group_name": "default",
                "firmware_version": "10.5.0.0",
                "status": "Up"
            })
        })
        .collect();
    json!({ "count": items.len(), "total": 2500, "gateways": items })
}

// ── Monitoring ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_gateways_sends_paging_params() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/monitoring/v1/gateways"))
        .and(query_param("limit", "1000"))
        .and(query_param("offset", "0"))
        .and(query_param("calculate_total", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gateways(0..2)))
        .expect(1)
        .mount(&server)
        .await;

    let page = client.list_gateways(0, 1000).await.unwrap();
    assert_eq!(page.gateways.len(), 2);
    assert_eq!(page.total, Some(2500));
}

#[tokio::test]
async fn test_paginate_all_walks_until_empty_page() {
    let (server, client) = setup().await;

    for (offset, body) in [
        ("0", gateways(0..1000)),
        ("1000", gateways(1000..2000)),
        ("2000", gateways(2000..2500)),
        ("3000", gateways(0..0)),
    ] {
        Mock::given(method("GET"))
            .and(path("/monitoring/v1/gateways"))
            .and(query_param("offset", offset))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    let all = CentralClient::paginate_all(1000, |offset, limit| client.list_gateways(offset, limit))
        .await
        .unwrap();

    assert_eq!(all.len(), 2500);
    assert_eq!(all[2499].serial, "CN002499");
}

#[tokio::test]
async fn test_list_switches_keeps_switch_type() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/monitoring/v1/switches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "switches": [{
                "serial": "SG0000001",
                "group_name": "branch",
                "firmware_version": "10.12.1000",
                "status": "Up",
                "switch_type": "AOS-CX"
            }]
        })))
        .mount(&server)
        .await;

    let page = client.list_switches(0, 1000).await.unwrap();
    assert_eq!(page.switches[0].switch_type.as_deref(), Some("AOS-CX"));
}

#[tokio::test]
async fn test_delete_gateway_maps_not_found_to_false() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/monitoring/v1/gateways/CNGONE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/monitoring/v1/gateways/CNHERE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .mount(&server)
        .await;

    assert!(!client.delete_gateway("CNGONE").await.unwrap());
    assert!(client.delete_gateway("CNHERE").await.unwrap());
}

// ── Configuration & firmware ────────────────────────────────────────

#[tokio::test]
async fn test_move_devices_accepts_server_error_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/configuration/v1/devices/move"))
        .and(body_json(json!({ "group": "target", "serials": ["CN1234"] })))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "description": "Group not found" })),
        )
        .mount(&server)
        .await;

    let resp = client
        .move_devices("target", &["CN1234".to_owned()])
        .await
        .unwrap();
    assert!(!resp.initiated());
    assert_eq!(resp.description.as_deref(), Some("Group not found"));
}

#[tokio::test]
async fn test_firmware_compliance_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/firmware/v1/upgrade/compliance_version"))
        .and(query_param("group", "default"))
        .and(query_param("device_type", "CONTROLLER"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "firmware_compliance_version": "10.5.0.0",
            "compliance_scheduled_at": 0
        })))
        .mount(&server)
        .await;

    let compliance = client
        .firmware_compliance("default", "CONTROLLER")
        .await
        .unwrap();
    assert_eq!(compliance.firmware_compliance_version, "10.5.0.0");
}

#[tokio::test]
async fn test_api_error_uses_description() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/firmware/v1/status"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "description": "Invalid value for serial",
            "error_code": "0004"
        })))
        .mount(&server)
        .await;

    let err = client.firmware_status("bogus").await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid value for serial");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

// ── Platform ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_inventory_and_unassign() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/platform/device_inventory/v1/devices"))
        .and(query_param("sku_type", "all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "devices": [{
                "serial": "CNABC123",
                "device_type": "GATEWAY",
                "services": ["ADVANCE_90XX_SEC"]
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/platform/licensing/v1/subscriptions/unassign"))
        .and(body_json(json!({
            "serials": ["CNABC123"],
            "services": ["ADVANCE_90XX_SEC"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client.list_inventory(SkuType::All, 0, 1000).await.unwrap();
    let device = &page.devices[0];

    let resp = client
        .unassign_subscriptions(&[device.serial.clone()], &device.services)
        .await
        .unwrap();
    assert!(resp.succeeded());
}
