//! Magento 2 REST API client library.
//!
//! A Rust library for driving a Magento 2 store over its REST API. A
//! shared [`MagentoClient`] owns the HTTP transport (base URL, bearer
//! token, retries, cancellation); entity handles such as
//! [`ProductHandle`] or [`CartHandle`] hold a clone of it plus the
//! entity's resolved route.
//!
//! # Quick Start
//!
//! ```no_run
//! use m2rest::{CartHandle, CartItem, Lookup, MagentoClient, ProductHandle, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> m2rest::Result<()> {
//!     let store = StoreConfig::new("https", "shop.example.com", "default");
//!     let client = MagentoClient::from_integration(store, "integration-token")?;
//!
//!     // Fetch a product by SKU
//!     let product = ProductHandle::lookup(&client, "TS-RED".to_string()).await?;
//!     println!("Product: {:?}", product.product.name);
//!
//!     // Put it in a guest cart
//!     let cart = CartHandle::new_guest(&client).await?;
//!     cart.add_items(&[CartItem::new("TS-RED", 2.0)]).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Handles share a small set of traits:
//!
//! - [`Handle`] - route and lifecycle state (`Uninitialized`, `RouteKnown`, `Hydrated`)
//! - [`Lookup`] - resolve a handle from a natural key (SKU, name, code, increment id)
//! - [`Refresh`] - overwrite local state with the remote entity
//! - [`List`] - paginated searches with [`SearchCriteria`]
//!
//! Errors are a closed set of [`MagentoError`] variants. Operations wrap
//! them in context; [`MagentoError::root`] recovers the original outcome.
//!
//! # Configuration
//!
//! The library never reads the environment. The `m2rest` binary does,
//! through [`config::Settings`]:
//!
//! - `MAGENTO_HOST` (required) - Store host, optionally with scheme
//! - `MAGENTO_BEARER_TOKEN` (required) - Integration access token
//! - `MAGENTO_STORE_CODE` (optional) - Store view code (defaults to `all`)
//! - `MAGENTO_TIMEOUT` (optional) - Request timeout in seconds (defaults to 60)
//! - `MAGENTO_DEBUG` (optional) - Enable debug logging

pub mod bulk;
pub mod cli;
mod client;
pub mod config;
mod error;
#[cfg(feature = "test-server")]
pub mod mock_server;
mod models;
pub mod output;
mod pagination;
pub mod response;
mod retry;
mod search;
mod traits;

// Re-export core types
pub use client::{AuthenticationType, ClientBuilder, Credentials, MagentoClient, StoreConfig};
pub use error::{MagentoError, Result, ResultExt};
pub use pagination::{Page, SearchResults};
pub use retry::RetryPolicy;
pub use search::{build_search_query, Condition, Filter, FilterGroup, SearchCriteria, SortDirection};

// Re-export traits
pub use traits::{Handle, HandleState, List, Lookup, Refresh, DEFAULT_PAGE_SIZE};

// Re-export models
pub use models::{
    // Shared types
    Address,
    CustomAttribute,
    // Product types
    CategoryLink,
    Product,
    ProductExtensionAttributes,
    ProductHandle,
    StockItem,
    PRODUCTS,
    // Category types
    Category,
    CategoryHandle,
    ProductLink,
    CATEGORIES,
    // Attribute types
    Attribute,
    AttributeHandle,
    AttributeOption,
    PRODUCT_ATTRIBUTES,
    // Attribute set types
    AttributeGroup,
    AttributeSet,
    AttributeSetHandle,
    ATTRIBUTE_SETS,
    DEFAULT_SKELETON_ID,
    // Configurable product types
    ConfigurableProductHandle,
    ConfigurableProductOption,
    OptionValue,
    CONFIGURABLE_PRODUCTS,
    // Cart types
    AddressInformation,
    Carrier,
    Cart,
    CartHandle,
    CartItem,
    PaymentDetails,
    PaymentMethod,
    CUSTOMER_CART,
    GUEST_CARTS,
    // Order types
    Order,
    OrderHandle,
    OrderItem,
    StatusHistory,
    ORDERS,
};
