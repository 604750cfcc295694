//! Product attribute model and handle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::client::MagentoClient;
use crate::error::{Result, ResultExt};
use crate::pagination::{Page, SearchResults};
use crate::response::strip_option_prefix;
use crate::search::SearchCriteria;
use crate::traits::{Handle, HandleState, List, Lookup, Refresh};

/// Base route of the product attribute endpoints.
pub const PRODUCT_ATTRIBUTES: &str = "/products/attributes";

/// A catalog product attribute (EAV).
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub attribute_id: Option<u64>,
    #[serde(default)]
    pub attribute_code: String,
    /// `text`, `select`, `multiselect`, `boolean`, ...
    pub frontend_input: Option<String>,
    pub default_frontend_label: Option<String>,
    pub is_required: Option<bool>,
    pub is_user_defined: Option<bool>,
    pub scope: Option<String>,
    pub entity_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<AttributeOption>,
    /// Remaining storefront and admin flags, kept for round trips.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Attribute {
    /// A user-defined dropdown attribute.
    pub fn dropdown(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            attribute_code: code.into(),
            frontend_input: Some("select".to_string()),
            default_frontend_label: Some(label.into()),
            is_required: Some(false),
            is_user_defined: Some(true),
            scope: Some("global".to_string()),
            ..Default::default()
        }
    }

    /// Find an option by label.
    pub fn option_by_label(&self, label: &str) -> Option<&AttributeOption> {
        self.options.iter().find(|o| o.label == label)
    }
}

/// One choice of a dropdown attribute.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeOption {
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    pub sort_order: Option<u32>,
    pub is_default: Option<bool>,
}

impl AttributeOption {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct AttributePayload<'a> {
    attribute: &'a Attribute,
}

#[derive(Serialize)]
struct OptionPayload<'a> {
    option: &'a AttributeOption,
}

fn attribute_route(code: &str) -> String {
    format!("{PRODUCT_ATTRIBUTES}/{}", urlencoding::encode(code))
}

/// Accessor for one remote attribute.
#[derive(Debug, Clone)]
pub struct AttributeHandle {
    route: Option<String>,
    state: HandleState,
    pub attribute: Attribute,
    client: MagentoClient,
}

impl AttributeHandle {
    pub fn new(client: &MagentoClient) -> Self {
        Self {
            route: None,
            state: HandleState::Uninitialized,
            attribute: Attribute::default(),
            client: client.clone(),
        }
    }

    /// Create the attribute; the route is derived from the returned code.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error wrapped with the operation.
    #[tracing::instrument(skip(client, attribute), fields(code = %attribute.attribute_code))]
    pub async fn create(client: &MagentoClient, attribute: Attribute) -> Result<Self> {
        let created: Attribute = client
            .post(
                PRODUCT_ATTRIBUTES,
                &AttributePayload {
                    attribute: &attribute,
                },
                "create attribute",
            )
            .await
            .context("create attribute")?;

        tracing::info!(code = %created.attribute_code, id = ?created.attribute_id, "attribute created");
        Ok(Self {
            route: Some(attribute_route(&created.attribute_code)),
            state: HandleState::RouteKnown,
            attribute: created,
            client: client.clone(),
        })
    }

    /// Push the local attribute to the remote and take the echoed state.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidUsage` on an uninitialized handle.
    #[tracing::instrument(skip(self), fields(code = %self.attribute.attribute_code))]
    pub async fn update_on_remote(&mut self) -> Result<()> {
        let route = self
            .require_route("update remote attribute from local")?
            .to_string();
        let updated: Attribute = self
            .client
            .put(
                &route,
                &AttributePayload {
                    attribute: &self.attribute,
                },
                "update remote attribute from local",
            )
            .await?;
        self.attribute = updated;
        self.state = HandleState::Hydrated;
        Ok(())
    }

    /// Add a dropdown option and return its value (the bare option id).
    ///
    /// The attribute is re-fetched afterwards so `options` includes the new
    /// entry. If that re-fetch fails the option still exists remotely; the
    /// error names its value.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidUsage` on an uninitialized handle.
    #[tracing::instrument(skip(self, option), fields(code = %self.attribute.attribute_code, label = %option.label))]
    pub async fn add_option(&mut self, option: AttributeOption) -> Result<String> {
        let route = self
            .require_route("assign option to attribute")?
            .to_string();
        let endpoint = format!("{route}/options");

        let raw = self
            .client
            .post_raw(
                &endpoint,
                &OptionPayload { option: &option },
                "assign option to attribute",
            )
            .await?;
        let value = strip_option_prefix(&raw).to_string();
        tracing::debug!(value = %value, "option added, updating attribute from remote");

        if let Err(e) = self.refresh().await {
            tracing::error!(value = %value, error = %e, "re-fetch after adding option failed");
            return Err(e.context(format!(
                "update attribute from remote after adding option '{value}'"
            )));
        }
        Ok(value)
    }
}

impl Handle for AttributeHandle {
    fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    fn state(&self) -> HandleState {
        self.state
    }
}

#[async_trait]
impl Lookup for AttributeHandle {
    type Key = String;

    #[tracing::instrument(skip(client))]
    async fn lookup(client: &MagentoClient, code: String) -> Result<Self> {
        let mut handle = Self::new(client);
        handle.route = Some(attribute_route(&code));
        handle.state = HandleState::RouteKnown;
        handle
            .refresh()
            .await
            .context("get attribute by attribute code")?;
        Ok(handle)
    }
}

#[async_trait]
impl Refresh for AttributeHandle {
    async fn refresh(&mut self) -> Result<()> {
        let route = self
            .require_route("update local attribute from remote")?
            .to_string();
        self.attribute = self
            .client
            .get(&route, "update local attribute from remote")
            .await?;
        self.state = HandleState::Hydrated;
        Ok(())
    }
}

#[async_trait]
impl List for Attribute {
    async fn list_page(
        client: &MagentoClient,
        criteria: &SearchCriteria,
        page: u32,
        count: u32,
    ) -> Result<Page<Self>> {
        let criteria = criteria.clone().page(page, count);
        let results: SearchResults<Attribute> = client
            .get_with_query(PRODUCT_ATTRIBUTES, &criteria, "list attributes")
            .await?;
        Ok(Page::from_results(results, page, count))
    }
}
