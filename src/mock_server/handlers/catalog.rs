//! Product, category and attribute endpoint handlers.

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
use crate::mock_server::state::MockState;
use crate::{Attribute, AttributeOption, Category, Product, ProductLink, StockItem};

type Shared = State<Arc<RwLock<MockState>>>;

#[derive(Debug, Deserialize)]
pub struct SaveProductBody {
    pub product: Product,
}

#[derive(Debug, Deserialize)]
pub struct StockItemBody {
    #[serde(rename = "stockItem")]
    pub stock_item: StockItem,
}

#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    pub category: Category,
}

#[derive(Debug, Deserialize)]
pub struct ProductLinkBody {
    #[serde(rename = "productLink")]
    pub product_link: ProductLink,
}

#[derive(Debug, Deserialize)]
pub struct AttributeBody {
    pub attribute: Attribute,
}

#[derive(Debug, Deserialize)]
pub struct OptionBody {
    pub option: AttributeOption,
}

/// GET /products/{sku}
pub async fn get_product(State(state): Shared, Path(sku): Path<String>) -> Response {
    let state = state.read().await;
    match state.products.get(&sku) {
        Some(product) => Json(product.clone()).into_response(),
        None => not_found("product", sku),
    }
}

/// GET /products
pub async fn list_products(State(state): Shared, RawQuery(query): RawQuery) -> Response {
    let state = state.read().await;
    let query = ListQuery::parse(query.as_deref());
    Json(query.respond(state.products.values().cloned())).into_response()
}

/// POST /products
pub async fn save_product(State(state): Shared, Json(body): Json<SaveProductBody>) -> Response {
    if body.product.sku.is_empty() {
        return magento_error(StatusCode::BAD_REQUEST, "The \"sku\" attribute value is empty.");
    }
    let mut state = state.write().await;
    Json(state.save_product(body.product)).into_response()
}

/// PUT /products/{sku}/stockItems/{item_id}
pub async fn update_stock_item(
    State(state): Shared,
    Path((sku, item_id)): Path<(String, u64)>,
    Json(body): Json<StockItemBody>,
) -> Response {
    let mut state = state.write().await;
    match state.update_stock(&sku, item_id, &body.stock_item) {
        Some(id) => Json(id).into_response(),
        None => not_found("stock item", format!("{sku}/{item_id}")),
    }
}

/// POST /categories
pub async fn create_category(State(state): Shared, Json(body): Json<CategoryBody>) -> Response {
    let mut state = state.write().await;
    Json(state.create_category(body.category)).into_response()
}

/// GET /categories/{id}
pub async fn get_category(State(state): Shared, Path(id): Path<u64>) -> Response {
    let state = state.read().await;
    match state.categories.get(&id) {
        Some(category) => Json(category.clone()).into_response(),
        None => not_found("category", id),
    }
}

/// GET /categories/list
pub async fn list_categories(State(state): Shared, RawQuery(query): RawQuery) -> Response {
    let state = state.read().await;
    let query = ListQuery::parse(query.as_deref());
    Json(query.respond(state.categories.values().cloned())).into_response()
}

/// GET /categories/{id}/products
pub async fn category_products(State(state): Shared, Path(id): Path<u64>) -> Response {
    let state = state.read().await;
    if !state.categories.contains_key(&id) {
        return not_found("category", id);
    }
    let links = state.category_products.get(&id).cloned().unwrap_or_default();
    Json(links).into_response()
}

/// PUT /categories/{id}/products
pub async fn assign_category_product(
    State(state): Shared,
    Path(id): Path<u64>,
    Json(body): Json<ProductLinkBody>,
) -> Response {
    let mut state = state.write().await;
    if state.assign_product(id, body.product_link) {
        Json(true).into_response()
    } else {
        not_found("category or product", id)
    }
}

/// GET /products/attributes/{code}
pub async fn get_attribute(State(state): Shared, Path(code): Path<String>) -> Response {
    let state = state.read().await;
    match state.attributes.get(&code) {
        Some(attribute) => Json(attribute.clone()).into_response(),
        None => not_found("attribute", code),
    }
}

/// GET /products/attributes
pub async fn list_attributes(State(state): Shared, RawQuery(query): RawQuery) -> Response {
    let state = state.read().await;
    let query = ListQuery::parse(query.as_deref());
    Json(query.respond(state.attributes.values().cloned())).into_response()
}

/// POST /products/attributes
pub async fn create_attribute(State(state): Shared, Json(body): Json<AttributeBody>) -> Response {
    let mut state = state.write().await;
    if state.attributes.contains_key(&body.attribute.attribute_code) {
        return magento_error(
            StatusCode::BAD_REQUEST,
            "An attribute with the same code already exists.",
        );
    }
    (StatusCode::OK, Json(state.create_attribute(body.attribute))).into_response()
}

/// POST /products/attributes/{code}/options
pub async fn add_attribute_option(
    State(state): Shared,
    Path(code): Path<String>,
    Json(body): Json<OptionBody>,
) -> Response {
    let mut state = state.write().await;
    match state.add_option(&code, body.option) {
        Some(value) => Json(format!("id_{value}")).into_response(),
        None => not_found("attribute", code),
    }
}
