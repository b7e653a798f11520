#![allow(clippy::unwrap_used)]
// Token refresh and retry behavior of `Authenticator`, driven through
// `CentralClient` against a wiremock Central.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fleetscan_api::{
    Authenticator, CentralClient, ClientCredential, Credential, Error, JsonDocument, TokenStore,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, CentralClient) {
    let server = MockServer::start().await;
    let http = reqwest::Client::new();
    let tokens = TokenStore::new(
        &server.uri(),
        http.clone(),
        ClientCredential::new("client-1", "secret-1"),
        Credential::new("stale", "refresh-0", 7200, 0),
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

fn gateways_body() -> Value {
    json!({
        "count": 1,
        "total": 1,
        "gateways": [{
            "serial": "CNKJKLM01",
            "group_name": "default",
            "firmware_version": "10.5.0.0",
            "status": "Up"
        }]
    })
}

async fn mount_token_endpoint(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(query_param("client_id", "client-1"))
        .and(query_param("client_secret", "secret-1"))
        .and(query_param("grant_type", "refresh_token"))
        .and(query_param("refresh_token", "refresh-0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "refresh_token": "refresh-1",
            "expires_in": 7200,
            "token_type": "bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_gateways(server: &MockServer, token: &str, status: u16) {
    let template = if status == 200 {
        ResponseTemplate::new(200).set_body_json(gateways_body())
    } else {
        ResponseTemplate::new(status)
    };
    Mock::given(method("GET"))
        .and(path("/monitoring/v1/gateways"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(template)
        .mount(server)
        .await;
}

// ── Retry tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_valid_token_skips_refresh() {
    let (server, client) = setup().await;
    mount_gateways(&server, "stale", 200).await;
    mount_token_endpoint(&server, 0).await;

    let page = client.list_gateways(0, 1000).await.unwrap();
    assert_eq!(page.gateways.len(), 1);
    assert_eq!(client.tokens().generation(), 0);
}

#[tokio::test]
async fn test_single_unauthorized_refreshes_once_and_retries() {
    let (server, client) = setup().await;
    mount_gateways(&server, "stale", 401).await;
    mount_gateways(&server, "fresh", 200).await;
    mount_token_endpoint(&server, 1).await;

    let page = client.list_gateways(0, 1000).await.unwrap();

    assert_eq!(page.gateways[0].serial, "CNKJKLM01");
    assert_eq!(client.tokens().generation(), 1);
    assert_eq!(client.tokens().current().expose(), "fresh");
}

#[tokio::test]
async fn test_second_unauthorized_fails_without_third_attempt() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/monitoring/v1/gateways"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    mount_token_endpoint(&server, 1).await;

    let result = client.list_gateways(0, 1000).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_rejected_refresh_keeps_credential() {
    let (server, client) = setup().await;
    mount_gateways(&server, "stale", 401).await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = client.list_gateways(0, 1000).await;

    assert!(
        matches!(result, Err(Error::RefreshFailed { status: 400, .. })),
        "expected RefreshFailed, got: {result:?}"
    );
    assert_eq!(client.tokens().generation(), 0);
    assert_eq!(client.tokens().current().expose(), "stale");
}

#[tokio::test]
async fn test_concurrent_unauthorized_calls_share_one_refresh() {
    let (server, client) = setup().await;
    mount_gateways(&server, "stale", 401).await;
    mount_gateways(&server, "fresh", 200).await;
    mount_token_endpoint(&server, 1).await;

    let calls = (0..8).map(|_| client.list_gateways(0, 1000));
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(Result::is_ok), "{results:?}");
    assert_eq!(client.tokens().generation(), 1);
}

// ── Persistence tests ───────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_rewrites_credential_document_in_place() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let client_doc = JsonDocument::new(dir.path().join("client_id.json"));
    std::fs::write(
        client_doc.path(),
        r#"{"client_id":"client-1","client_secret":"secret-1"}"#,
    )
    .unwrap();

    let credential_doc = JsonDocument::new(dir.path().join("credential.json"));
    std::fs::write(
        credential_doc.path(),
        r#"{"access_token":"stale","refresh_token":"refresh-0","expires_in":7200,"created_at":0,"customer_id":"c-42"}"#,
    )
    .unwrap();

    let tokens = TokenStore::load(
        &server.uri(),
        reqwest::Client::new(),
        &client_doc,
        credential_doc.clone(),
    )
    .unwrap();
    mount_token_endpoint(&server, 1).await;

    tokens.refresh().await.unwrap();

    let stored: serde_json::Map<String, Value> = credential_doc.read().unwrap();
    assert_eq!(stored["access_token"], "fresh");
    assert_eq!(stored["refresh_token"], "refresh-1");
    assert_eq!(stored["expires_in"], 7200);
    assert_eq!(stored["customer_id"], "c-42");
    assert!(stored["created_at"].as_i64().unwrap() > 0);
}

#[test]
fn test_missing_client_document_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let credential_doc = JsonDocument::new(dir.path().join("credential.json"));
    std::fs::write(
        credential_doc.path(),
        r#"{"access_token":"a","refresh_token":"r","expires_in":1,"created_at":0}"#,
    )
    .unwrap();

    let result = TokenStore::load(
        "https://central.example.com",
        reqwest::Client::new(),
        &JsonDocument::new(dir.path().join("client_id.json")),
        credential_doc,
    );

    assert!(matches!(result, Err(Error::CredentialStore { .. })));
}
