//! Sales order model and handle.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, skip_serializing_none, DefaultOnNull};

use crate::client::MagentoClient;
use crate::error::{MagentoError, Result, ResultExt};
use crate::models::common::{magento_datetime, Address};
use crate::pagination::{Page, SearchResults};
use crate::search::{Condition, SearchCriteria};
use crate::traits::{Handle, HandleState, List, Lookup, Refresh};

/// Base route of the order endpoints.
pub const ORDERS: &str = "/orders";

/// A sales order.
///
/// Fields not modelled here are kept in `extra` so that
/// [`OrderHandle::update_entity`] sends them back unchanged.
#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub entity_id: Option<u64>,
    pub increment_id: Option<String>,
    pub state: Option<String>,
    pub status: Option<String>,
    pub customer_email: Option<String>,
    pub customer_firstname: Option<String>,
    pub customer_lastname: Option<String>,
    pub grand_total: Option<f64>,
    pub subtotal: Option<f64>,
    pub order_currency_code: Option<String>,
    pub total_qty_ordered: Option<f64>,
    #[serde(default, with = "magento_datetime")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "magento_datetime")]
    pub updated_at: Option<NaiveDateTime>,
    pub billing_address: Option<Address>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<OrderItem>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_histories: Vec<StatusHistory>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub item_id: Option<u64>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub sku: String,
    pub name: Option<String>,
    pub product_type: Option<String>,
    pub qty_ordered: Option<f64>,
    pub price: Option<f64>,
    pub row_total: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An order comment / status history entry.
#[serde_as]
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusHistory {
    pub entity_id: Option<u64>,
    pub parent_id: Option<u64>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub comment: String,
    pub status: Option<String>,
    pub is_customer_notified: Option<u8>,
    pub is_visible_on_front: Option<u8>,
    #[serde(default, with = "magento_datetime")]
    pub created_at: Option<NaiveDateTime>,
}

impl StatusHistory {
    /// An internal comment, not shown to the customer.
    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            comment: text.into(),
            is_customer_notified: Some(0),
            is_visible_on_front: Some(0),
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct EntityIdOnly {
    entity_id: u64,
}

#[derive(Serialize)]
struct UpdateOrderPayload<'a> {
    entity: &'a Order,
}

#[derive(Serialize)]
struct CommentPayload<'a> {
    #[serde(rename = "statusHistory")]
    status_history: &'a StatusHistory,
}

/// Accessor for one remote order.
#[derive(Debug, Clone)]
pub struct OrderHandle {
    route: Option<String>,
    state: HandleState,
    pub order: Order,
    client: MagentoClient,
}

impl OrderHandle {
    pub fn new(client: &MagentoClient) -> Self {
        Self {
            route: None,
            state: HandleState::Uninitialized,
            order: Order::default(),
            client: client.clone(),
        }
    }

    /// A handle for an order whose entity id is already known (e.g. just
    /// placed). The order is not fetched.
    pub fn from_entity_id(client: &MagentoClient, entity_id: u64) -> Self {
        Self {
            route: Some(format!("{ORDERS}/{entity_id}")),
            state: HandleState::RouteKnown,
            order: Order {
                entity_id: Some(entity_id),
                ..Default::default()
            },
            client: client.clone(),
        }
    }

    pub fn entity_id(&self) -> Option<u64> {
        self.order.entity_id
    }

    /// Save `order` over this order and take the returned state.
    ///
    /// The entity id is forced to this handle's order.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidUsage` on an uninitialized handle.
    #[tracing::instrument(skip(self, order), fields(entity_id = ?self.order.entity_id))]
    pub async fn update_entity(&mut self, mut order: Order) -> Result<()> {
        self.require_route("update order entity on remote")?;
        order.entity_id = self.order.entity_id;

        let updated: Order = self
            .client
            .post(
                ORDERS,
                &UpdateOrderPayload { entity: &order },
                "update order entity on remote",
            )
            .await?;
        self.order = updated;
        self.state = HandleState::Hydrated;
        Ok(())
    }

    /// Add a status history comment. Returns Magento's boolean answer.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidUsage` on an uninitialized handle.
    #[tracing::instrument(skip(self, comment), fields(entity_id = ?self.order.entity_id))]
    pub async fn add_comment(&self, comment: &StatusHistory) -> Result<bool> {
        let route = self.require_route("add comment to order")?;
        let added: bool = self
            .client
            .post(
                &format!("{route}/comments"),
                &CommentPayload {
                    status_history: comment,
                },
                "add comment to order",
            )
            .await?;
        tracing::debug!(added, "comment posted");
        Ok(added)
    }
}

impl Handle for OrderHandle {
    fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    fn state(&self) -> HandleState {
        self.state
    }
}

#[async_trait]
impl Lookup for OrderHandle {
    /// The increment id (e.g. `000000123`).
    type Key = String;

    #[tracing::instrument(skip(client))]
    async fn lookup(client: &MagentoClient, increment_id: String) -> Result<Self> {
        let criteria = SearchCriteria::new()
            .filter("increment_id", &increment_id, Condition::Eq)
            .param("fields", "items[entity_id]");

        let results: SearchResults<EntityIdOnly> = client
            .get_with_query(ORDERS, &criteria, "get order by increment_id from remote")
            .await
            .context("get order by increment id")?;

        let Some(first) = results.items.first() else {
            tracing::warn!(increment_id = %increment_id, "order not found by increment id");
            return Err(MagentoError::NotFound);
        };

        let mut handle = Self::from_entity_id(client, first.entity_id);
        handle
            .refresh()
            .await
            .context("update order from remote after getting by increment id")?;
        Ok(handle)
    }
}

#[async_trait]
impl Refresh for OrderHandle {
    async fn refresh(&mut self) -> Result<()> {
        let route = self
            .require_route("get detailed order object from remote")?
            .to_string();
        let order: Order = self
            .client
            .get(&route, "get detailed order object from remote")
            .await?;
        self.order = order;
        self.state = HandleState::Hydrated;
        Ok(())
    }
}

#[async_trait]
impl List for Order {
    async fn list_page(
        client: &MagentoClient,
        criteria: &SearchCriteria,
        page: u32,
        count: u32,
    ) -> Result<Page<Self>> {
        let criteria = criteria.clone().page(page, count);
        let results: SearchResults<Order> = client
            .get_with_query(ORDERS, &criteria, "list orders")
            .await?;
        Ok(Page::from_results(results, page, count))
    }
}
