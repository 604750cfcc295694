//! Bulk product creation and stock updates.

use m2rest::bulk::{self, StockUpdate};
use m2rest::{MagentoClient, StoreConfig};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> MagentoClient {
    MagentoClient::from_integration(StoreConfig::from_url(&server.uri(), "all").unwrap(), "t")
        .unwrap()
}

#[tokio::test]
async fn test_create_products_reports_each_sku() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/all/V1/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "sku": "x"})))
        .expect(5)
        .mount(&server)
        .await;

    let report = bulk::create_products(&client(&server), 5, 2).await;

    assert!(report.is_success());
    assert_eq!(report.succeeded.len(), 5);
    assert!(report.succeeded[0].starts_with("bulk-product-"));
    assert!(report.succeeded[4].ends_with("-5"));
}

#[tokio::test]
async fn test_update_stock_collects_failures() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/all/V1/products/A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "sku": "A",
            "extension_attributes": {"stock_item": {"item_id": 11, "qty": 0, "is_in_stock": false}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/rest/all/V1/products/A/stockItems/11"))
        .and(body_json(json!({"stockItem": {"qty": 40.0, "is_in_stock": true}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(11))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/rest/all/V1/products/MISSING$"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "no"})))
        .mount(&server)
        .await;

    let updates = vec![
        StockUpdate {
            sku: "A".to_string(),
            qty: 40.0,
        },
        StockUpdate {
            sku: "MISSING".to_string(),
            qty: 1.0,
        },
    ];
    let report = bulk::update_stock(&client(&server), updates, 4).await;

    assert_eq!(report.succeeded, vec!["A".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "MISSING");
    assert!(report.failed[0].1.contains("not found"));
}

#[tokio::test]
async fn test_created_skus_feed_stock_update_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("created.csv");

    let skus: Vec<String> = (1..=3).map(|i| format!("bulk-product-1-{i}")).collect();
    bulk::save_skus(&path, &skus).unwrap();

    let updates = bulk::load_stock_updates(&path).unwrap();
    let loaded: Vec<&str> = updates.iter().map(|u| u.sku.as_str()).collect();
    assert_eq!(loaded, vec!["bulk-product-1-1", "bulk-product-1-2", "bulk-product-1-3"]);
}
