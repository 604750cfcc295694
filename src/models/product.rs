//! Product model and handle.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::client::MagentoClient;
use crate::error::{MagentoError, Result, ResultExt};
use crate::models::common::{magento_datetime, CustomAttribute};
use crate::pagination::{Page, SearchResults};
use crate::response::unquote;
use crate::search::SearchCriteria;
use crate::traits::{Handle, HandleState, List, Lookup, Refresh};

/// Base route of the product endpoints.
pub const PRODUCTS: &str = "/products";

const STOCK_ITEMS: &str = "stockItems";

/// A Magento catalog product.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<u64>,
    #[serde(default)]
    pub sku: String,
    pub name: Option<String>,
    pub attribute_set_id: Option<u64>,
    pub price: Option<f64>,
    /// 1 = enabled, 2 = disabled.
    pub status: Option<u8>,
    /// 1 = not visible, 2 = catalog, 3 = search, 4 = both.
    pub visibility: Option<u8>,
    /// `simple`, `configurable`, `virtual`, `bundle`, ...
    pub type_id: Option<String>,
    pub weight: Option<f64>,
    #[serde(default, with = "magento_datetime")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "magento_datetime")]
    pub updated_at: Option<NaiveDateTime>,
    pub extension_attributes: Option<ProductExtensionAttributes>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_attributes: Vec<CustomAttribute>,
}

impl Product {
    /// A new enabled simple product in the default attribute set.
    pub fn simple(sku: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            sku: sku.into(),
            name: Some(name.into()),
            attribute_set_id: Some(4),
            price: Some(price),
            status: Some(1),
            visibility: Some(4),
            type_id: Some("simple".to_string()),
            ..Default::default()
        }
    }

    /// The stock item attached through extension attributes, if any.
    pub fn stock_item(&self) -> Option<&StockItem> {
        self.extension_attributes.as_ref()?.stock_item.as_ref()
    }

    /// Value of a custom attribute by code.
    pub fn custom_attribute(&self, code: &str) -> Option<&serde_json::Value> {
        self.custom_attributes
            .iter()
            .find(|a| a.attribute_code == code)
            .map(|a| &a.value)
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductExtensionAttributes {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub website_ids: Vec<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category_links: Vec<CategoryLink>,
    pub stock_item: Option<StockItem>,
    /// Extension attributes contributed by other modules.
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLink {
    #[serde(default)]
    pub position: u32,
    pub category_id: String,
}

/// Inventory record of a product.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    pub item_id: Option<u64>,
    pub product_id: Option<u64>,
    pub stock_id: Option<u64>,
    pub qty: Option<f64>,
    #[serde(default)]
    pub is_in_stock: bool,
}

#[derive(Serialize)]
struct SaveProductPayload<'a> {
    product: &'a Product,
    #[serde(rename = "saveOptions")]
    save_options: bool,
}

#[derive(Serialize)]
struct UpdateStockPayload {
    #[serde(rename = "stockItem")]
    stock_item: StockItem,
}

pub(crate) fn product_route(sku: &str) -> String {
    format!("{PRODUCTS}/{}", urlencoding::encode(sku))
}

/// Accessor for one remote product.
#[derive(Debug, Clone)]
pub struct ProductHandle {
    route: Option<String>,
    state: HandleState,
    pub product: Product,
    client: MagentoClient,
}

impl ProductHandle {
    /// An empty handle. Route-requiring calls fail until a create or lookup.
    pub fn new(client: &MagentoClient) -> Self {
        Self {
            route: None,
            state: HandleState::Uninitialized,
            product: Product::default(),
            client: client.clone(),
        }
    }

    /// Create the product, or replace an existing one with the same SKU.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error wrapped with the operation.
    #[tracing::instrument(skip(client, product), fields(sku = %product.sku))]
    pub async fn create_or_replace(
        client: &MagentoClient,
        product: Product,
        save_options: bool,
    ) -> Result<Self> {
        let payload = SaveProductPayload {
            product: &product,
            save_options,
        };

        let created: Product = client
            .post(PRODUCTS, &payload, "create new product on remote")
            .await
            .context("create or replace product")?;

        let sku = unquote(&created.sku).to_string();
        tracing::info!(sku = %sku, id = ?created.id, "product saved");

        Ok(Self {
            route: Some(product_route(&sku)),
            state: HandleState::RouteKnown,
            product: created,
            client: client.clone(),
        })
    }

    /// Item id of the product's stock item, when the product is hydrated.
    pub fn stock_item_id(&self) -> Option<u64> {
        self.product.stock_item().and_then(|s| s.item_id)
    }

    /// Set quantity and stock status of a stock item.
    ///
    /// # Errors
    ///
    /// Fails with [`MagentoError::InvalidUsage`] on an uninitialized handle.
    #[tracing::instrument(skip(self), fields(sku = %self.product.sku))]
    pub async fn update_quantity_for_stock_item(
        &self,
        item_id: u64,
        qty: f64,
        is_in_stock: bool,
    ) -> Result<()> {
        let route = self.require_route("update stock for product")?;
        let endpoint = format!("{route}/{STOCK_ITEMS}/{item_id}");
        let payload = UpdateStockPayload {
            stock_item: StockItem {
                qty: Some(qty),
                is_in_stock,
                ..Default::default()
            },
        };

        let _: serde_json::Value = self
            .client
            .put(&endpoint, &payload, "update stock for product")
            .await?;
        tracing::info!(item_id, qty, is_in_stock, "stock updated");
        Ok(())
    }

    /// Update stock using the stock item id from the hydrated product.
    ///
    /// # Errors
    ///
    /// Returns [`MagentoError::UnexpectedResponse`] if the product carries
    /// no stock item.
    pub async fn update_stock(&self, qty: f64, is_in_stock: bool) -> Result<()> {
        let Some(item_id) = self.stock_item_id() else {
            tracing::error!(sku = %self.product.sku, "product has no stock item");
            return Err(MagentoError::UnexpectedResponse {
                operation: "update stock for product".to_string(),
                body: format!("product '{}' has no stock item", self.product.sku),
            });
        };
        self.update_quantity_for_stock_item(item_id, qty, is_in_stock)
            .await
    }
}

impl Handle for ProductHandle {
    fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    fn state(&self) -> HandleState {
        self.state
    }
}

#[async_trait]
impl Lookup for ProductHandle {
    type Key = String;

    #[tracing::instrument(skip(client))]
    async fn lookup(client: &MagentoClient, sku: String) -> Result<Self> {
        let mut handle = Self::new(client);
        handle.route = Some(product_route(&sku));
        handle.state = HandleState::RouteKnown;
        handle
            .refresh()
            .await
            .context("get product by SKU from remote")?;
        Ok(handle)
    }
}

#[async_trait]
impl Refresh for ProductHandle {
    async fn refresh(&mut self) -> Result<()> {
        let route = self
            .require_route("get detailed product from remote")?
            .to_string();
        tracing::debug!(route = %route, "updating product from remote");
        self.product = self
            .client
            .get(&route, "get detailed product from remote")
            .await?;
        self.state = HandleState::Hydrated;
        Ok(())
    }
}

#[async_trait]
impl List for Product {
    async fn list_page(
        client: &MagentoClient,
        criteria: &SearchCriteria,
        page: u32,
        count: u32,
    ) -> Result<Page<Self>> {
        let criteria = criteria.clone().page(page, count);
        let results: SearchResults<Product> = client
            .get_with_query(PRODUCTS, &criteria, "list products")
            .await?;
        Ok(Page::from_results(results, page, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StoreConfig;

    fn client() -> MagentoClient {
        MagentoClient::new(StoreConfig::new("http", "localhost", "default")).unwrap()
    }

    #[test]
    fn test_product_deserialize() {
        let json = r#"{
            "id": 42,
            "sku": "TS-RED",
            "name": "Red T-Shirt",
            "attribute_set_id": 4,
            "price": 19.9,
            "status": 1,
            "visibility": 4,
            "type_id": "simple",
            "created_at": "2024-01-02 03:04:05",
            "updated_at": "2024-01-02 03:04:05",
            "extension_attributes": {
                "website_ids": [1],
                "category_links": [{"position": 0, "category_id": "3"}],
                "stock_item": {"item_id": 17, "product_id": 42, "stock_id": 1, "qty": 5, "is_in_stock": true},
                "configurable_product_options": []
            },
            "custom_attributes": [{"attribute_code": "color", "value": "49"}]
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, Some(42));
        assert_eq!(product.sku, "TS-RED");
        assert_eq!(product.stock_item().and_then(|s| s.item_id), Some(17));
        assert_eq!(product.stock_item().and_then(|s| s.qty), Some(5.0));
        assert_eq!(
            product.custom_attribute("color"),
            Some(&serde_json::json!("49"))
        );
        let ext = product.extension_attributes.unwrap();
        assert!(ext.other.contains_key("configurable_product_options"));
    }

    #[test]
    fn test_create_payload_omits_unset_fields() {
        let product = Product::simple("X", "Thing", 1.5);
        let payload = SaveProductPayload {
            product: &product,
            save_options: true,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["saveOptions"], true);
        assert_eq!(json["product"]["sku"], "X");
        assert!(json["product"].get("id").is_none());
        assert!(json["product"].get("custom_attributes").is_none());
    }

    #[test]
    fn test_product_route_encodes_sku() {
        assert_eq!(product_route("X"), "/products/X");
        assert_eq!(product_route("a b/c"), "/products/a%20b%2Fc");
    }

    #[tokio::test]
    async fn test_uninitialized_handle_rejects_stock_update() {
        let handle = ProductHandle::new(&client());
        assert_eq!(handle.state(), HandleState::Uninitialized);

        let err = handle
            .update_quantity_for_stock_item(1, 10.0, true)
            .await
            .unwrap_err();
        assert!(matches!(err, MagentoError::InvalidUsage(_)));
    }

    #[tokio::test]
    async fn test_update_stock_without_stock_item() {
        let mut handle = ProductHandle::new(&client());
        handle.route = Some(product_route("X"));
        let err = handle.update_stock(1.0, true).await.unwrap_err();
        assert!(matches!(err, MagentoError::UnexpectedResponse { .. }));
    }
}
