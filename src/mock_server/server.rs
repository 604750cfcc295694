//! Mock Magento REST server.
//!
//! An axum server that answers under `/rest/{STORE_CODE}/V1`.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::Fixtures;
use super::handlers;
use super::state::MockState;
use crate::{MagentoClient, StoreConfig};

/// Store code the mock answers for.
pub const STORE_CODE: &str = "all";

/// A mock Magento store for testing.
///
/// The server runs in the background on a random local port.
pub struct MockServer {
    url: String,
    handle: JoinHandle<()>,
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a server with the default fixtures.
    pub async fn start() -> Self {
        Self::with_state(Fixtures::default_state()).await
    }

    /// Start a server with no catalog, carts or orders.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Start a server with custom state.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn with_state(state: MockState) -> Self {
        let shared_state = state.shared();
        let app = Self::create_router(shared_state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "mock server stopped");
            }
        });

        Self {
            url: format!("http://{}", addr),
            handle,
            state: shared_state,
        }
    }

    /// Base URL of the server (scheme, host and port).
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Store endpoint pointing at this server.
    ///
    /// # Panics
    ///
    /// Panics if the server URL does not parse, which cannot happen for a
    /// bound local address.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::from_url(&self.url, STORE_CODE).expect("mock server URL is valid")
    }

    /// An unauthenticated client for this server.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    pub fn client(&self) -> MagentoClient {
        MagentoClient::new(self.store_config()).expect("client builds")
    }

    /// Shared state, for seeding or inspecting during a test.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Stop the server. Safe to call multiple times.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }

    fn create_router(state: Arc<RwLock<MockState>>) -> Router {
        let api = Router::new()
            // Products
            .route(
                "/products",
                get(handlers::list_products).post(handlers::save_product),
            )
            .route("/products/:sku", get(handlers::get_product))
            .route(
                "/products/:sku/stockItems/:item_id",
                put(handlers::update_stock_item),
            )
            // Attributes
            .route(
                "/products/attributes",
                get(handlers::list_attributes).post(handlers::create_attribute),
            )
            .route("/products/attributes/:code", get(handlers::get_attribute))
            .route(
                "/products/attributes/:code/options",
                post(handlers::add_attribute_option),
            )
            // Categories
            .route("/categories", post(handlers::create_category))
            .route("/categories/list", get(handlers::list_categories))
            .route("/categories/:id", get(handlers::get_category))
            .route(
                "/categories/:id/products",
                get(handlers::category_products).put(handlers::assign_category_product),
            )
            // Guest carts
            .route("/guest-carts", post(handlers::create_guest_cart))
            .route("/guest-carts/:cart_id", get(handlers::get_guest_cart))
            .route("/guest-carts/:cart_id/items", post(handlers::add_cart_item))
            .route(
                "/guest-carts/:cart_id/items/:item_id",
                delete(handlers::delete_cart_item),
            )
            .route(
                "/guest-carts/:cart_id/estimate-shipping-methods",
                post(handlers::estimate_shipping),
            )
            .route(
                "/guest-carts/:cart_id/shipping-information",
                post(handlers::shipping_information),
            )
            .route(
                "/guest-carts/:cart_id/payment-methods",
                get(handlers::payment_methods),
            )
            .route("/guest-carts/:cart_id/order", put(handlers::place_order))
            // Orders
            .route(
                "/orders",
                get(handlers::list_orders).post(handlers::save_order),
            )
            .route("/orders/:id", get(handlers::get_order))
            .route("/orders/:id/comments", post(handlers::add_order_comment))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                handlers::require_token,
            ))
            // Token endpoints are open
            .route("/integration/admin/token", post(handlers::issue_token))
            .route("/integration/customer/token", post(handlers::issue_token));

        Router::new()
            .nest(&format!("/rest/{STORE_CODE}/V1"), api)
            .route("/health", get(health_check))
            .with_state(state)
    }
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}
