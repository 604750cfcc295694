//! Attribute set model and handle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, skip_serializing_none, DisplayFromStr, PickFirst};

use crate::client::MagentoClient;
use crate::error::{MagentoError, Result, ResultExt};
use crate::models::attribute::Attribute;
use crate::pagination::{Page, SearchResults};
use crate::search::{build_search_query, Condition, SearchCriteria};
use crate::traits::{Handle, HandleState, List, Lookup, Refresh};

/// Base route of the attribute set endpoints.
pub const ATTRIBUTE_SETS: &str = "/products/attribute-sets";

const ATTRIBUTE_SETS_LIST: &str = "/products/attribute-sets/sets/list";
const ATTRIBUTE_SET_GROUPS: &str = "/products/attribute-sets/groups";
const ATTRIBUTE_SET_GROUPS_LIST: &str = "/products/attribute-sets/groups/list";
const ATTRIBUTE_SET_ATTRIBUTES: &str = "/products/attribute-sets/attributes";

/// Skeleton id of Magento's stock "Default" attribute set.
pub const DEFAULT_SKELETON_ID: u64 = 4;

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSet {
    pub attribute_set_id: Option<u64>,
    #[serde(default)]
    pub attribute_set_name: String,
    pub sort_order: Option<u32>,
    pub entity_type_id: Option<u64>,
}

impl AttributeSet {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            attribute_set_name: name.into(),
            sort_order: Some(0),
            entity_type_id: Some(4),
            ..Default::default()
        }
    }
}

/// A group (tab) inside an attribute set.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeGroup {
    /// Magento serializes this id as a string.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_group_id: Option<u64>,
    #[serde(default)]
    pub attribute_group_name: String,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_set_id: Option<u64>,
}

#[derive(Serialize)]
struct CreateAttributeSetPayload<'a> {
    #[serde(rename = "attributeSet")]
    attribute_set: &'a AttributeSet,
    #[serde(rename = "skeletonId")]
    skeleton_id: u64,
}

#[derive(Serialize)]
struct UpdateAttributeSetPayload<'a> {
    #[serde(rename = "attributeSet")]
    attribute_set: &'a AttributeSet,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignAttributePayload<'a> {
    attribute_set_id: u64,
    attribute_group_id: u64,
    attribute_code: &'a str,
    sort_order: u32,
}

#[derive(Serialize)]
struct CreateGroupPayload {
    group: AttributeGroup,
}

/// Accessor for one remote attribute set, its groups and its attributes.
#[derive(Debug, Clone)]
pub struct AttributeSetHandle {
    route: Option<String>,
    state: HandleState,
    pub attribute_set: AttributeSet,
    pub groups: Vec<AttributeGroup>,
    pub attributes: Vec<Attribute>,
    client: MagentoClient,
}

impl AttributeSetHandle {
    pub fn new(client: &MagentoClient) -> Self {
        Self {
            route: None,
            state: HandleState::Uninitialized,
            attribute_set: AttributeSet::default(),
            groups: Vec::new(),
            attributes: Vec::new(),
            client: client.clone(),
        }
    }

    fn set_id(&self, operation: &str) -> Result<u64> {
        self.attribute_set.attribute_set_id.ok_or_else(|| {
            tracing::error!(operation, "attribute set has no id");
            MagentoError::InvalidUsage(format!("cannot {operation}: attribute set has no id"))
        })
    }

    fn bind(&mut self, set: AttributeSet) -> Result<()> {
        self.attribute_set = set;
        let id = self.set_id("derive attribute set route")?;
        self.route = Some(format!("{ATTRIBUTE_SETS}/{id}"));
        self.state = HandleState::RouteKnown;
        Ok(())
    }

    /// Create an attribute set based on `skeleton_id` and hydrate it.
    ///
    /// # Errors
    ///
    /// Returns the normalized API error wrapped with the operation.
    #[tracing::instrument(skip(client, attribute_set), fields(name = %attribute_set.attribute_set_name))]
    pub async fn create(
        client: &MagentoClient,
        attribute_set: AttributeSet,
        skeleton_id: u64,
    ) -> Result<Self> {
        let payload = CreateAttributeSetPayload {
            attribute_set: &attribute_set,
            skeleton_id,
        };
        let created: AttributeSet = client
            .post(ATTRIBUTE_SETS, &payload, "create attribute-set")
            .await
            .context("create attribute set")?;

        let mut handle = Self::new(client);
        handle.bind(created)?;
        handle
            .refresh()
            .await
            .context("update attribute set from remote after creation")?;
        Ok(handle)
    }

    /// Push the local attribute set to the remote.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidUsage` on an uninitialized handle.
    #[tracing::instrument(skip(self), fields(route = ?self.route))]
    pub async fn update_on_remote(&mut self) -> Result<()> {
        let route = self
            .require_route("update remote attribute-set from local")?
            .to_string();
        let payload = UpdateAttributeSetPayload {
            attribute_set: &self.attribute_set,
        };
        let updated: AttributeSet = self
            .client
            .put(&route, &payload, "update remote attribute-set from local")
            .await?;
        self.attribute_set = updated;
        Ok(())
    }

    /// Place an attribute into one of this set's groups, then re-fetch.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidUsage` on an uninitialized handle.
    #[tracing::instrument(skip(self))]
    pub async fn assign_attribute(
        &mut self,
        group_id: u64,
        sort_order: u32,
        attribute_code: &str,
    ) -> Result<()> {
        self.require_route("assign attribute to attribute-set")?;
        let payload = AssignAttributePayload {
            attribute_set_id: self.set_id("assign attribute to attribute-set")?,
            attribute_group_id: group_id,
            attribute_code,
            sort_order,
        };
        self.client
            .post_raw(
                ATTRIBUTE_SET_ATTRIBUTES,
                &payload,
                "assign attribute to attribute-set",
            )
            .await?;

        self.refresh()
            .await
            .context("update attribute set from remote after assigning attribute")
    }

    /// Add a new group to this set, then re-fetch.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidUsage` on an uninitialized handle.
    #[tracing::instrument(skip(self))]
    pub async fn create_group(&mut self, name: &str) -> Result<()> {
        self.require_route("create group on attribute-set")?;
        let payload = CreateGroupPayload {
            group: AttributeGroup {
                attribute_group_id: None,
                attribute_group_name: name.to_string(),
                attribute_set_id: Some(self.set_id("create group on attribute-set")?),
            },
        };
        let _: serde_json::Value = self
            .client
            .post(ATTRIBUTE_SET_GROUPS, &payload, "create group on attribute-set")
            .await?;

        self.refresh()
            .await
            .context("update attribute set from remote after creating group")
    }

    /// Group with the given name, if loaded.
    pub fn group_by_name(&self, name: &str) -> Option<&AttributeGroup> {
        self.groups.iter().find(|g| g.attribute_group_name == name)
    }

    async fn refresh_details(&mut self, route: &str) -> Result<()> {
        self.attribute_set = self
            .client
            .get(route, "get details for attribute-set from remote")
            .await?;
        Ok(())
    }

    async fn refresh_groups(&mut self) -> Result<()> {
        let id = self.set_id("get groups for attribute-set from remote")?;
        let query = build_search_query("attribute_set_id", &id.to_string(), Condition::In);
        let results: SearchResults<AttributeGroup> = self
            .client
            .get(
                &format!("{ATTRIBUTE_SET_GROUPS_LIST}?{query}"),
                "get groups for attribute-set from remote",
            )
            .await?;
        self.groups = results.items;
        tracing::debug!(groups = self.groups.len(), "attribute set groups updated");
        Ok(())
    }

    async fn refresh_attributes(&mut self, route: &str) -> Result<()> {
        self.attributes = self
            .client
            .get(
                &format!("{route}/attributes"),
                "get attributes for attribute-set from remote",
            )
            .await?;
        Ok(())
    }
}

impl Handle for AttributeSetHandle {
    fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    fn state(&self) -> HandleState {
        self.state
    }
}

#[async_trait]
impl Lookup for AttributeSetHandle {
    type Key = String;

    #[tracing::instrument(skip(client))]
    async fn lookup(client: &MagentoClient, name: String) -> Result<Self> {
        let criteria = SearchCriteria::new().filter("attribute_set_name", &name, Condition::In);
        let results: SearchResults<AttributeSet> = client
            .get_with_query(
                ATTRIBUTE_SETS_LIST,
                &criteria,
                "get attribute-set by name from remote",
            )
            .await
            .context("get attribute set by name")?;

        let Some(first) = results.items.into_iter().next() else {
            tracing::warn!(name = %name, "attribute set not found by name");
            return Err(MagentoError::NotFound);
        };

        let mut handle = Self::new(client);
        handle.bind(first)?;
        handle
            .refresh()
            .await
            .context("update attribute set from remote after getting by name")?;
        Ok(handle)
    }
}

#[async_trait]
impl Refresh for AttributeSetHandle {
    /// Reload details, groups and attributes.
    async fn refresh(&mut self) -> Result<()> {
        let route = self
            .require_route("get details for attribute-set from remote")?
            .to_string();
        self.refresh_details(&route)
            .await
            .context("update attribute set details")?;
        self.refresh_groups()
            .await
            .context("update attribute set groups")?;
        self.refresh_attributes(&route)
            .await
            .context("update attribute set attributes")?;
        self.state = HandleState::Hydrated;
        Ok(())
    }
}

#[async_trait]
impl List for AttributeSet {
    async fn list_page(
        client: &MagentoClient,
        criteria: &SearchCriteria,
        page: u32,
        count: u32,
    ) -> Result<Page<Self>> {
        let criteria = criteria.clone().page(page, count);
        let results: SearchResults<AttributeSet> = client
            .get_with_query(ATTRIBUTE_SETS_LIST, &criteria, "list attribute sets")
            .await?;
        Ok(Page::from_results(results, page, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StoreConfig;

    #[test]
    fn test_group_ids_accept_strings() {
        let json = r#"{"attribute_group_id": "17", "attribute_group_name": "General", "attribute_set_id": 4}"#;
        let group: AttributeGroup = serde_json::from_str(json).unwrap();
        assert_eq!(group.attribute_group_id, Some(17));
        assert_eq!(group.attribute_set_id, Some(4));
    }

    #[test]
    fn test_assign_payload_is_camel_case() {
        let payload = AssignAttributePayload {
            attribute_set_id: 10,
            attribute_group_id: 17,
            attribute_code: "color",
            sort_order: 5,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "attributeSetId": 10,
                "attributeGroupId": 17,
                "attributeCode": "color",
                "sortOrder": 5
            })
        );
    }

    #[test]
    fn test_bind_requires_id() {
        let client = MagentoClient::new(StoreConfig::new("http", "localhost", "all")).unwrap();
        let mut handle = AttributeSetHandle::new(&client);
        assert!(matches!(
            handle.bind(AttributeSet::named("Shirts")),
            Err(MagentoError::InvalidUsage(_))
        ));

        let mut set = AttributeSet::named("Shirts");
        set.attribute_set_id = Some(12);
        handle.bind(set).unwrap();
        assert_eq!(handle.route(), Some("/products/attribute-sets/12"));
        assert_eq!(handle.state(), HandleState::RouteKnown);
    }
}
