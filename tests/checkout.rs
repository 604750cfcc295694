//! Guest checkout and order handling against a mocked Magento API.

use m2rest::{
    Address, AddressInformation, CartHandle, CartItem, Handle, HandleState, Lookup, MagentoClient,
    MagentoError, Order, OrderHandle, PaymentMethod, Refresh, StatusHistory, StoreConfig,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> MagentoClient {
    MagentoClient::new(StoreConfig::from_url(&server.uri(), "default").unwrap()).unwrap()
}

fn address() -> Address {
    Address {
        country_id: Some("US".to_string()),
        street: vec!["1 Main St".to_string()],
        city: Some("Austin".to_string()),
        region_code: Some("TX".to_string()),
        postcode: Some("78701".to_string()),
        telephone: Some("5551234".to_string()),
        firstname: Some("Jane".to_string()),
        lastname: Some("Doe".to_string()),
        email: Some("jane@example.com".to_string()),
        ..Default::default()
    }
}

async fn mount_new_cart(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/rest/default/V1/guest-carts"))
        .respond_with(ResponseTemplate::new(200).set_body_json("q123"))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/default/V1/guest-carts/q123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 77,
            "is_active": true,
            "items": [
                {"item_id": 1, "sku": "A", "qty": 2},
                {"item_id": 2, "sku": "B", "qty": 1}
            ],
            "customer": {"email": null},
            "billing_address": {
                "id": 90, "region": null, "region_id": null, "country_id": null,
                "street": [""], "city": null, "email": null, "same_as_billing": 0
            }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_guest_checkout_flow() {
    let server = MockServer::start().await;
    mount_new_cart(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/default/V1/guest-carts/q123/items"))
        .and(body_json(json!({"cartItem": {"sku": "A", "qty": 2.0, "quote_id": "q123"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"item_id": 1, "sku": "A", "qty": 2})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/default/V1/guest-carts/q123/estimate-shipping-methods"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "carrier_code": "flatrate",
            "method_code": "flatrate",
            "amount": 5,
            "available": true
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/default/V1/guest-carts/q123/shipping-information"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "payment_methods": [{"code": "checkmo", "title": "Check / Money order"}],
            "totals": {"grand_total": 25}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/rest/default/V1/guest-carts/q123/order"))
        .and(body_json(json!({"paymentMethod": {"method": "checkmo"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json("42"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/default/V1/orders/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entity_id": 42,
            "increment_id": "000000042",
            "state": "new",
            "status": "pending",
            "grand_total": 25
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let cart = CartHandle::new_guest(&client).await.unwrap();
    assert_eq!(cart.quote_id, "q123");
    assert_eq!(cart.state(), HandleState::Hydrated);
    assert_eq!(cart.cart.items.len(), 2);

    cart.add_items(&[CartItem::new("A", 2.0)]).await.unwrap();

    let carriers = cart.estimate_shipping_carriers(&address()).await.unwrap();
    let carrier = carriers.iter().find(|c| c.available).unwrap();

    let details = cart
        .add_shipping_information(&AddressInformation::same_address(address(), carrier))
        .await
        .unwrap();
    let method = details.payment_methods.first().unwrap();

    let mut order = cart.place_order(method).await.unwrap();
    assert_eq!(order.entity_id(), Some(42));
    assert_eq!(order.state(), HandleState::RouteKnown);

    order.refresh().await.unwrap();
    assert_eq!(order.order.increment_id.as_deref(), Some("000000042"));
}

#[tokio::test]
async fn test_unknown_sku_is_item_not_found() {
    let server = MockServer::start().await;
    mount_new_cart(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/default/V1/guest-carts/q123/items"))
        .and(body_json(json!({"cartItem": {"sku": "A", "qty": 1.0, "quote_id": "q123"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"item_id": 1, "sku": "A"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/default/V1/guest-carts/q123/items"))
        .and(body_json(json!({"cartItem": {"sku": "GHOST", "qty": 1.0, "quote_id": "q123"}})))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "no such product"})))
        .expect(1)
        .mount(&server)
        .await;

    let cart = CartHandle::new_guest(&client(&server)).await.unwrap();
    let err = cart
        .add_items(&[CartItem::new("A", 1.0), CartItem::new("GHOST", 1.0)])
        .await
        .unwrap_err();

    match err {
        MagentoError::ItemNotFound { sku, item_id } => {
            assert_eq!(sku, "GHOST");
            assert_eq!(item_id, None);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_place_order_with_non_numeric_id() {
    let server = MockServer::start().await;
    mount_new_cart(&server).await;

    Mock::given(method("PUT"))
        .and(path("/rest/default/V1/guest-carts/q123/order"))
        .respond_with(ResponseTemplate::new(200).set_body_json("not-a-number"))
        .mount(&server)
        .await;

    let cart = CartHandle::new_guest(&client(&server)).await.unwrap();
    let err = cart
        .place_order(&PaymentMethod {
            code: "checkmo".to_string(),
            title: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err.root(), MagentoError::UnexpectedResponse { .. }));
}

#[tokio::test]
async fn test_delete_all_items() {
    let server = MockServer::start().await;
    mount_new_cart(&server).await;

    for id in [1, 2] {
        Mock::given(method("DELETE"))
            .and(path(format!("/rest/default/V1/guest-carts/q123/items/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(true))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut cart = CartHandle::new_guest(&client(&server)).await.unwrap();
    cart.delete_all_items().await.unwrap();
    assert!(cart.cart.items.is_empty());
}

#[tokio::test]
async fn test_order_lookup_by_increment_id_and_comment() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/default/V1/orders"))
        .and(query_param("searchCriteria[filter_groups][0][filters][0][field]", "increment_id"))
        .and(query_param("searchCriteria[filter_groups][0][filters][0][value]", "000000042"))
        .and(query_param("searchCriteria[filter_groups][0][filters][0][condition_type]", "eq"))
        .and(query_param("fields", "items[entity_id]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [{"entity_id": 42}]})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/default/V1/orders/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entity_id": 42,
            "increment_id": "000000042",
            "status": "pending",
            "payment": {"method": "checkmo"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/default/V1/orders/42/comments"))
        .and(body_json(json!({"statusHistory": {
            "comment": "packed",
            "is_customer_notified": 0,
            "is_visible_on_front": 0
        }})))
        .respond_with(ResponseTemplate::new(200).set_body_json(true))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/default/V1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entity_id": 42,
            "increment_id": "000000042",
            "status": "processing",
            "payment": {"method": "checkmo"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut handle = OrderHandle::lookup(&client(&server), "000000042".to_string())
        .await
        .unwrap();
    assert_eq!(handle.state(), HandleState::Hydrated);
    assert_eq!(handle.order.extra["payment"]["method"], "checkmo");

    assert!(handle.add_comment(&StatusHistory::comment("packed")).await.unwrap());

    let update = Order {
        status: Some("processing".to_string()),
        ..handle.order.clone()
    };
    handle.update_entity(update).await.unwrap();
    assert_eq!(handle.order.status.as_deref(), Some("processing"));
}

#[tokio::test]
async fn test_order_lookup_without_match() {
    let server = MockServer::start().await;

    // A `fields` projection that matches nothing omits `items` entirely
    Mock::given(method("GET"))
        .and(path("/rest/default/V1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let err = OrderHandle::lookup(&client(&server), "999".to_string())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
