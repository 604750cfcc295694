//! Configurable product options and child links.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::client::MagentoClient;
use crate::error::{MagentoError, Result, ResultExt};
use crate::traits::{Handle, HandleState, Lookup, Refresh};

/// Base route of the configurable product endpoints.
pub const CONFIGURABLE_PRODUCTS: &str = "/configurable-products";

/// A configurable option (e.g. "Color") of a parent product.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurableProductOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Magento serializes this id as a string.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub attribute_id: u64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub is_use_default: bool,
    #[serde(default)]
    pub values: Vec<OptionValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u64>,
}

impl ConfigurableProductOption {
    pub fn new(attribute_id: u64, label: impl Into<String>, value_indexes: &[u64]) -> Self {
        Self {
            attribute_id,
            label: label.into(),
            values: value_indexes
                .iter()
                .map(|&value_index| OptionValue { value_index })
                .collect(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionValue {
    pub value_index: u64,
}

#[derive(Serialize)]
struct OptionPayload<'a> {
    option: &'a ConfigurableProductOption,
}

#[derive(Serialize)]
struct AddChildPayload<'a> {
    #[serde(rename = "childSku")]
    child_sku: &'a str,
}

/// Accessor for the configurable options of one parent product.
#[derive(Debug, Clone)]
pub struct ConfigurableProductHandle {
    route: Option<String>,
    state: HandleState,
    pub sku: String,
    pub options: Vec<ConfigurableProductOption>,
    client: MagentoClient,
}

impl ConfigurableProductHandle {
    fn for_sku(client: &MagentoClient, sku: &str) -> Self {
        Self {
            route: Some(format!(
                "{CONFIGURABLE_PRODUCTS}/{}",
                urlencoding::encode(sku)
            )),
            state: HandleState::RouteKnown,
            sku: sku.to_string(),
            options: Vec::new(),
            client: client.clone(),
        }
    }

    /// Add a configurable option to an existing parent product.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error wrapped with the operation.
    #[tracing::instrument(skip(client, option), fields(attribute_id = option.attribute_id))]
    pub async fn set_option(
        client: &MagentoClient,
        sku: &str,
        option: &ConfigurableProductOption,
    ) -> Result<Self> {
        let mut handle = Self::for_sku(client, sku);
        let endpoint = format!("{}/options", handle.route.as_deref().unwrap_or_default());

        let option_id = handle
            .client
            .post_raw(
                &endpoint,
                &OptionPayload { option },
                "create configurable product option",
            )
            .await
            .context("set option for configurable product")?;
        tracing::debug!(option_id = %option_id.trim(), "configurable option created");

        handle
            .refresh()
            .await
            .context("update options from remote after setting option")?;
        Ok(handle)
    }

    /// Link a simple product as a child of this configurable product.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidUsage` on an uninitialized handle.
    #[tracing::instrument(skip(self), fields(parent = %self.sku))]
    pub async fn add_child(&self, child_sku: &str) -> Result<()> {
        let route = self.require_route("add child by sku to configurable product")?;
        let _: serde_json::Value = self
            .client
            .post(
                &format!("{route}/child"),
                &AddChildPayload { child_sku },
                "add child by sku to configurable product",
            )
            .await?;
        tracing::info!(child = child_sku, "child linked");
        Ok(())
    }

    /// Replace an existing option (matched by its id), then re-fetch.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidUsage` if the option has no id or the handle has
    /// no route.
    #[tracing::instrument(skip(self, option), fields(parent = %self.sku, option_id = ?option.id))]
    pub async fn update_option(&mut self, option: &ConfigurableProductOption) -> Result<()> {
        let route = self
            .require_route("update option for configurable product")?
            .to_string();
        let Some(id) = option.id else {
            tracing::error!("configurable option has no id");
            return Err(MagentoError::InvalidUsage(
                "cannot update option for configurable product: option has no id".to_string(),
            ));
        };

        self.client
            .put_raw(
                &format!("{route}/options/{id}"),
                &OptionPayload { option },
                "update option for configurable product",
            )
            .await?;

        self.refresh()
            .await
            .context("update options from remote after updating option by id")
    }

    /// Option for the given attribute id, if loaded.
    pub fn option_for_attribute(&self, attribute_id: u64) -> Option<&ConfigurableProductOption> {
        self.options.iter().find(|o| o.attribute_id == attribute_id)
    }
}

impl Handle for ConfigurableProductHandle {
    fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    fn state(&self) -> HandleState {
        self.state
    }
}

#[async_trait]
impl Lookup for ConfigurableProductHandle {
    type Key = String;

    #[tracing::instrument(skip(client))]
    async fn lookup(client: &MagentoClient, sku: String) -> Result<Self> {
        let mut handle = Self::for_sku(client, &sku);
        handle
            .refresh()
            .await
            .context("get configurable product by SKU")?;
        Ok(handle)
    }
}

#[async_trait]
impl Refresh for ConfigurableProductHandle {
    async fn refresh(&mut self) -> Result<()> {
        let route = self
            .require_route("get options for configurable product from remote")?
            .to_string();
        self.options = self
            .client
            .get(
                &format!("{route}/options/all"),
                "get options for configurable product from remote",
            )
            .await?;
        self.state = HandleState::Hydrated;
        Ok(())
    }
}
