//! Category model and handle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, skip_serializing_none, DefaultOnNull};

use crate::client::MagentoClient;
use crate::error::{MagentoError, Result, ResultExt};
use crate::models::common::CustomAttribute;
use crate::pagination::{Page, SearchResults};
use crate::search::{Condition, SearchCriteria};
use crate::traits::{Handle, HandleState, List, Lookup, Refresh};

/// Base route of the category endpoints.
pub const CATEGORIES: &str = "/categories";

const CATEGORIES_LIST: &str = "/categories/list";

#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Option<u64>,
    pub parent_id: Option<u64>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub name: String,
    pub is_active: Option<bool>,
    pub position: Option<u32>,
    pub level: Option<u32>,
    pub path: Option<String>,
    pub include_in_menu: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_attributes: Vec<CustomAttribute>,
}

impl Category {
    /// An active category under `parent_id`.
    pub fn new(name: impl Into<String>, parent_id: u64) -> Self {
        Self {
            name: name.into(),
            parent_id: Some(parent_id),
            is_active: Some(true),
            include_in_menu: Some(true),
            ..Default::default()
        }
    }
}

/// Assignment of a product to a category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductLink {
    pub sku: String,
    #[serde(default)]
    pub position: u32,
    /// Filled from the category when left empty.
    #[serde(default, deserialize_with = "string_or_number")]
    pub category_id: String,
}

impl ProductLink {
    pub fn new(sku: impl Into<String>, position: u32) -> Self {
        Self {
            sku: sku.into(),
            position,
            category_id: String::new(),
        }
    }
}

// `/categories/{id}/products` answers with a string id, other endpoints with a number.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected category id, got {other}"
        ))),
    }
}

#[derive(Serialize)]
struct CategoryPayload<'a> {
    category: &'a Category,
}

#[derive(Serialize)]
struct AssignProductPayload<'a> {
    #[serde(rename = "productLink")]
    product_link: &'a ProductLink,
}

/// Accessor for one remote category and its product assignments.
#[derive(Debug, Clone)]
pub struct CategoryHandle {
    route: Option<String>,
    state: HandleState,
    pub category: Category,
    pub products: Vec<ProductLink>,
    client: MagentoClient,
}

impl CategoryHandle {
    pub fn new(client: &MagentoClient) -> Self {
        Self {
            route: None,
            state: HandleState::Uninitialized,
            category: Category::default(),
            products: Vec::new(),
            client: client.clone(),
        }
    }

    fn bind(client: &MagentoClient, category: Category) -> Result<Self> {
        let id = category.id.ok_or_else(|| MagentoError::UnexpectedResponse {
            operation: "derive category route".to_string(),
            body: format!("category '{}' has no id", category.name),
        })?;
        Ok(Self {
            route: Some(format!("{CATEGORIES}/{id}")),
            state: HandleState::RouteKnown,
            category,
            products: Vec::new(),
            client: client.clone(),
        })
    }

    /// Create a category. The handle is route-known but not hydrated.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error wrapped with the operation.
    #[tracing::instrument(skip(client, category), fields(name = %category.name))]
    pub async fn create(client: &MagentoClient, category: Category) -> Result<Self> {
        let created: Category = client
            .post(CATEGORIES, &CategoryPayload { category: &category }, "create category")
            .await
            .context("create category")?;
        tracing::info!(id = ?created.id, "category created");
        Self::bind(client, created)
    }

    /// Reload the products assigned to this category.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidUsage` on an uninitialized handle.
    pub async fn refresh_products(&mut self) -> Result<()> {
        let operation = "get category products from remote";
        let route = self.require_route(operation)?.to_string();
        let products: Vec<ProductLink> = self
            .client
            .get(&format!("{route}/products"), operation)
            .await?;
        self.products = products;
        Ok(())
    }

    /// Assign a product. An empty `category_id` is filled with this
    /// category's id; the link is appended to `products` on success.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidUsage` on an uninitialized handle.
    #[tracing::instrument(skip(self, link), fields(sku = %link.sku, category = ?self.category.id))]
    pub async fn assign_product(&mut self, mut link: ProductLink) -> Result<()> {
        let operation = "assign product to category";
        let route = self.require_route(operation)?.to_string();
        if link.category_id.is_empty() {
            if let Some(id) = self.category.id {
                link.category_id = id.to_string();
            }
        }

        let _: serde_json::Value = self
            .client
            .put(
                &format!("{route}/products"),
                &AssignProductPayload {
                    product_link: &link,
                },
                operation,
            )
            .await?;
        self.products.push(link);
        Ok(())
    }
}

impl Handle for CategoryHandle {
    fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    fn state(&self) -> HandleState {
        self.state
    }
}

#[async_trait]
impl Lookup for CategoryHandle {
    /// The category name.
    type Key = String;

    #[tracing::instrument(skip(client))]
    async fn lookup(client: &MagentoClient, name: String) -> Result<Self> {
        let criteria = SearchCriteria::new().filter("name", &name, Condition::In);
        let results: SearchResults<Category> = client
            .get_with_query(CATEGORIES_LIST, &criteria, "get category by name from remote")
            .await
            .context("get category by name")?;

        let Some(first) = results.items.into_iter().next() else {
            tracing::warn!(name = %name, "category not found by name");
            return Err(MagentoError::NotFound);
        };

        let mut handle = Self::bind(client, first)?;
        handle
            .refresh()
            .await
            .context("update category from remote after getting by name")?;
        Ok(handle)
    }
}

#[async_trait]
impl Refresh for CategoryHandle {
    /// Reload the category and its product assignments.
    async fn refresh(&mut self) -> Result<()> {
        let operation = "get category from remote";
        let route = self.require_route(operation)?.to_string();
        let category: Category = self.client.get(&route, operation).await?;
        self.category = category;
        self.refresh_products()
            .await
            .context("update category products after updating category details")?;
        self.state = HandleState::Hydrated;
        Ok(())
    }
}

#[async_trait]
impl List for Category {
    async fn list_page(
        client: &MagentoClient,
        criteria: &SearchCriteria,
        page: u32,
        count: u32,
    ) -> Result<Page<Self>> {
        let criteria = criteria.clone().page(page, count);
        let results: SearchResults<Category> = client
            .get_with_query(CATEGORIES_LIST, &criteria, "list categories")
            .await?;
        Ok(Page::from_results(results, page, count))
    }
}
