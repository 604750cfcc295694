//! Guest cart and order endpoint handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::search::ListQuery;
use super::{magento_error, not_found};
use crate::mock_server::state::{CartError, MockState};
use crate::{Carrier, CartItem, Order, PaymentDetails, PaymentMethod, StatusHistory};

type Shared = State<Arc<RwLock<MockState>>>;

#[derive(Debug, Deserialize)]
pub struct CartItemBody {
    #[serde(rename = "cartItem")]
    pub cart_item: CartItem,
}

#[derive(Debug, Deserialize)]
pub struct PaymentMethodCode {
    pub method: String,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderBody {
    #[serde(rename = "paymentMethod")]
    pub payment_method: PaymentMethodCode,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    #[serde(rename = "statusHistory")]
    pub status_history: StatusHistory,
}

#[derive(Debug, Deserialize)]
pub struct OrderBody {
    pub entity: Order,
}

fn flat_rate() -> Carrier {
    Carrier {
        carrier_code: "flatrate".to_string(),
        method_code: "flatrate".to_string(),
        carrier_title: Some("Flat Rate".to_string()),
        method_title: Some("Fixed".to_string()),
        amount: Some(5.0),
        base_amount: Some(5.0),
        available: true,
        price_excl_tax: Some(5.0),
        price_incl_tax: Some(5.0),
        ..Default::default()
    }
}

fn check_money_order() -> PaymentMethod {
    PaymentMethod {
        code: "checkmo".to_string(),
        title: "Check / Money order".to_string(),
    }
}

fn cart_error(err: CartError, cart_id: &str) -> Response {
    match err {
        CartError::NoSuchCart => not_found("cart", cart_id),
        CartError::NoSuchProduct(sku) => not_found("product", sku),
        CartError::EmptyCart => magento_error(
            StatusCode::BAD_REQUEST,
            "The shipping method is missing. Select the shipping method and try again.",
        ),
    }
}

/// POST /guest-carts
pub async fn create_guest_cart(State(state): Shared) -> Response {
    let mut state = state.write().await;
    Json(state.create_cart()).into_response()
}

/// GET /guest-carts/{cart_id}
pub async fn get_guest_cart(State(state): Shared, Path(cart_id): Path<String>) -> Response {
    let state = state.read().await;
    match state.carts.get(&cart_id) {
        Some(cart) => Json(cart.clone()).into_response(),
        None => not_found("cart", cart_id),
    }
}

/// POST /guest-carts/{cart_id}/items
pub async fn add_cart_item(
    State(state): Shared,
    Path(cart_id): Path<String>,
    Json(body): Json<CartItemBody>,
) -> Response {
    let mut state = state.write().await;
    match state.add_cart_item(&cart_id, body.cart_item) {
        Ok(item) => Json(item).into_response(),
        Err(e) => cart_error(e, &cart_id),
    }
}

/// DELETE /guest-carts/{cart_id}/items/{item_id}
pub async fn delete_cart_item(
    State(state): Shared,
    Path((cart_id, item_id)): Path<(String, u64)>,
) -> Response {
    let mut state = state.write().await;
    if state.remove_cart_item(&cart_id, item_id) {
        Json(true).into_response()
    } else {
        not_found("cart item", item_id)
    }
}

/// POST /guest-carts/{cart_id}/estimate-shipping-methods
pub async fn estimate_shipping(State(state): Shared, Path(cart_id): Path<String>) -> Response {
    let state = state.read().await;
    if !state.carts.contains_key(&cart_id) {
        return not_found("cart", cart_id);
    }
    Json(vec![flat_rate()]).into_response()
}

/// POST /guest-carts/{cart_id}/shipping-information
pub async fn shipping_information(State(state): Shared, Path(cart_id): Path<String>) -> Response {
    let state = state.read().await;
    let Some(cart) = state.carts.get(&cart_id) else {
        return not_found("cart", cart_id);
    };
    let subtotal: f64 = cart
        .items
        .iter()
        .map(|i| i.price.unwrap_or_default() * i.qty)
        .sum();
    Json(PaymentDetails {
        payment_methods: vec![check_money_order()],
        totals: Some(serde_json::json!({
            "subtotal": subtotal,
            "shipping_amount": flat_rate().amount,
            "grand_total": subtotal + flat_rate().amount.unwrap_or_default(),
        })),
    })
    .into_response()
}

/// GET /guest-carts/{cart_id}/payment-methods
pub async fn payment_methods(State(state): Shared, Path(cart_id): Path<String>) -> Response {
    let state = state.read().await;
    if !state.carts.contains_key(&cart_id) {
        return not_found("cart", cart_id);
    }
    Json(vec![check_money_order()]).into_response()
}

/// PUT /guest-carts/{cart_id}/order
pub async fn place_order(
    State(state): Shared,
    Path(cart_id): Path<String>,
    Json(body): Json<PlaceOrderBody>,
) -> Response {
    let mut state = state.write().await;
    match state.place_order(&cart_id, &body.payment_method.method) {
        // Magento answers with the order id as a JSON string
        Ok(id) => Json(id.to_string()).into_response(),
        Err(e) => cart_error(e, &cart_id),
    }
}

/// GET /orders/{id}
pub async fn get_order(State(state): Shared, Path(id): Path<u64>) -> Response {
    let state = state.read().await;
    match state.orders.get(&id) {
        Some(order) => Json(order.clone()).into_response(),
        None => not_found("order", id),
    }
}

/// GET /orders
pub async fn list_orders(State(state): Shared, RawQuery(query): RawQuery) -> Response {
    let state = state.read().await;
    let query = ListQuery::parse(query.as_deref());
    Json(query.respond(state.orders.values().cloned())).into_response()
}

/// POST /orders
pub async fn save_order(State(state): Shared, Json(body): Json<OrderBody>) -> Response {
    let mut state = state.write().await;
    let Some(id) = body.entity.entity_id else {
        return magento_error(StatusCode::BAD_REQUEST, "entity_id is required");
    };
    let Some(order) = state.orders.get_mut(&id) else {
        return not_found("order", id);
    };
    *order = body.entity;
    Json(order.clone()).into_response()
}

/// POST /orders/{id}/comments
pub async fn add_order_comment(
    State(state): Shared,
    Path(id): Path<u64>,
    Json(body): Json<CommentBody>,
) -> Response {
    let mut state = state.write().await;
    if state.add_order_comment(id, body.status_history) {
        Json(true).into_response()
    } else {
        not_found("order", id)
    }
}
