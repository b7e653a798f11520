#![allow(clippy::unwrap_used)]
// Pagination, replacement and single-flight behavior of `InventoryCache`.

mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{APS, GATEWAYS, INVENTORY, SWITCHES, device, mount_listing, switch};
use fleetscan_core::{DeviceKind, Partition, RemediationConfig};

#[tokio::test]
async fn test_sweep_walks_pages_until_empty() {
    let server = MockServer::start().await;
    let fleet = common::fleet(
        &server,
        RemediationConfig {
            page_size: 2,
            ..common::config()
        },
    );

    let pages = [
        ("0", vec!["CN0001", "CN0002"]),
        ("2", vec!["CN0003", "CN0004"]),
        ("4", vec!["CN0005"]),
        ("6", vec![]),
    ];
    for (offset, serials) in pages {
        let items: Vec<_> = serials
            .iter()
            .map(|s| device(s, "default", Some("10.5.0.0"), "Up"))
            .collect();
        Mock::given(method("GET"))
            .and(path(GATEWAYS))
            .and(query_param("offset", offset))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "gateways": items })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let inventory = fleet.inventory();
    inventory.refresh_gateways().await.unwrap();

    assert_eq!(inventory.count(Partition::Gateway), 5);
    for serial in ["CN0001", "CN0003", "CN0005"] {
        assert!(inventory.is_present(serial), "{serial} missing");
    }
    assert!(inventory.last_refresh().is_some());
}

#[tokio::test]
async fn test_serial_repeated_across_pages_is_cached_once() {
    let server = MockServer::start().await;
    let fleet = common::fleet(
        &server,
        RemediationConfig {
            page_size: 2,
            ..common::config()
        },
    );

    // The listing shifted between requests: CN0002 shows up on both pages.
    let pages = [
        ("0", vec![("CN0001", "1.0"), ("CN0002", "1.0")]),
        ("2", vec![("CN0002", "2.0"), ("CN0003", "1.0")]),
        ("4", vec![]),
    ];
    for (offset, serials) in pages {
        let items: Vec<_> = serials
            .iter()
            .map(|(s, fw)| device(s, "default", Some(fw), "Up"))
            .collect();
        Mock::given(method("GET"))
            .and(path(GATEWAYS))
            .and(query_param("offset", offset))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "gateways": items })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let inventory = fleet.inventory();
    inventory.refresh_gateways().await.unwrap();

    assert_eq!(inventory.count(Partition::Gateway), 3);
    let repeated = inventory.lookup("CN0002").unwrap();
    assert_eq!(repeated.firmware.known(), Some("2.0"));
}

#[tokio::test]
async fn test_refresh_replaces_partition_instead_of_merging() {
    let server = MockServer::start().await;
    let fleet = common::fleet(&server, common::config());
    let inventory = fleet.inventory();

    mount_listing(
        &server,
        GATEWAYS,
        "gateways",
        vec![
            device("CNGONE", "default", Some("1.0"), "Up"),
            device("CNSTAY", "default", Some("1.0"), "Up"),
        ],
    )
    .await;
    mount_listing(&server, SWITCHES, "switches", vec![switch("SG0001", "AOS-S")]).await;
    inventory.refresh_gateways().await.unwrap();
    inventory.refresh_switches().await.unwrap();
    assert!(inventory.is_present("CNGONE"));

    server.reset().await;
    mount_listing(
        &server,
        GATEWAYS,
        "gateways",
        vec![device("CNSTAY", "default", Some("1.1"), "Up")],
    )
    .await;
    inventory.refresh_gateways().await.unwrap();

    assert!(!inventory.is_present("CNGONE"));
    assert_eq!(
        inventory.lookup("CNSTAY").unwrap().firmware.known(),
        Some("1.1")
    );
    // Other partitions are untouched by a gateway refresh.
    assert!(inventory.is_present("SG0001"));
}

#[tokio::test]
async fn test_concurrent_refreshes_share_one_sweep() {
    let server = MockServer::start().await;
    let fleet = common::fleet(&server, common::config());

    Mock::given(method("GET"))
        .and(path(GATEWAYS))
        .and(query_param("offset", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "gateways": [device("CN0001", "default", Some("1.0"), "Up")]
                }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(GATEWAYS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "gateways": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let inventory = fleet.inventory();
    let (a, b, c) = tokio::join!(
        inventory.refresh_gateways(),
        inventory.refresh_gateways(),
        inventory.refresh_gateways(),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    assert!(inventory.is_present("CN0001"));
}

#[tokio::test]
async fn test_kinds_and_subscription_services() {
    let server = MockServer::start().await;
    let fleet = common::fleet(&server, common::config());

    mount_listing(
        &server,
        GATEWAYS,
        "gateways",
        vec![device("CNGW01", "default", Some("10.5"), "Up")],
    )
    .await;
    mount_listing(
        &server,
        SWITCHES,
        "switches",
        vec![switch("SGCX01", "AOS-CX"), switch("SGHP01", "AOS-S")],
    )
    .await;
    mount_listing(
        &server,
        APS,
        "aps",
        vec![device("CNAP01", "default", Some("8.10"), "Up")],
    )
    .await;
    mount_listing(
        &server,
        INVENTORY,
        "devices",
        vec![json!({
            "serial": "CNGW01",
            "device_type": "GATEWAY",
            "services": ["ADVANCE_90XX_SEC"]
        })],
    )
    .await;

    fleet.refresh_all().await.unwrap();
    fleet.inventory().refresh_subscriptions().await.unwrap();

    let inventory = fleet.inventory();
    assert_eq!(inventory.kind_of("CNGW01"), Some(DeviceKind::Controller));
    assert_eq!(inventory.kind_of("SGCX01"), Some(DeviceKind::Cx));
    assert_eq!(inventory.kind_of("SGHP01"), Some(DeviceKind::Hp));
    assert_eq!(inventory.kind_of("CNAP01"), Some(DeviceKind::Iap));
    assert_eq!(inventory.kind_of("CNNONE"), None);
    assert_eq!(inventory.services_of("CNGW01"), vec!["ADVANCE_90XX_SEC"]);
    assert!(inventory.services_of("SGCX01").is_empty());
}
