//! Magento `searchCriteria` query-string builder.
//!
//! List endpoints accept filters encoded as nested query keys:
//!
//! ```text
//! searchCriteria[filter_groups][0][filters][0][field]=increment_id
//! searchCriteria[filter_groups][0][filters][0][value]=100000123
//! searchCriteria[filter_groups][0][filters][0][condition_type]=eq
//! ```
//!
//! Filter groups are AND-ed together; filters inside one group are OR-ed.
//! Indices follow insertion order.

use std::fmt;

/// Magento filter condition types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Eq,
    Neq,
    In,
    Nin,
    Like,
    NotLike,
    Gt,
    Gteq,
    Lt,
    Lteq,
    Null,
    NotNull,
    Finset,
    From,
    To,
}

impl Condition {
    /// The wire name of this condition.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::In => "in",
            Self::Nin => "nin",
            Self::Like => "like",
            Self::NotLike => "nlike",
            Self::Gt => "gt",
            Self::Gteq => "gteq",
            Self::Lt => "lt",
            Self::Lteq => "lteq",
            Self::Null => "null",
            Self::NotNull => "notnull",
            Self::Finset => "finset",
            Self::From => "from",
            Self::To => "to",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction for `sortOrders`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A single field/value/condition triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub value: String,
    pub condition: Condition,
}

impl Filter {
    pub fn new(field: impl Into<String>, value: impl Into<String>, condition: Condition) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            condition,
        }
    }
}

/// Filters that Magento combines with OR.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterGroup {
    pub filters: Vec<Filter>,
}

impl FilterGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an alternative filter to this group.
    #[must_use]
    pub fn or(mut self, field: impl Into<String>, value: impl Into<String>, condition: Condition) -> Self {
        self.filters.push(Filter::new(field, value, condition));
        self
    }
}

/// Full search criteria for a list endpoint.
///
/// # Example
///
/// ```
/// use m2rest::{Condition, SearchCriteria};
///
/// let query = SearchCriteria::new()
///     .filter("increment_id", "100000123", Condition::Eq)
///     .param("fields", "items[entity_id]")
///     .to_query_string();
///
/// assert!(query.contains("searchCriteria[filter_groups][0][filters][0][field]=increment_id"));
/// assert!(query.ends_with("fields=items%5Bentity_id%5D"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub filter_groups: Vec<FilterGroup>,
    pub sort_orders: Vec<(String, SortDirection)>,
    pub page_size: Option<u32>,
    pub current_page: Option<u32>,
    /// Extra top-level parameters such as `fields`.
    pub params: Vec<(String, String)>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter group containing a single filter (AND-ed with the others).
    #[must_use]
    pub fn filter(self, field: impl Into<String>, value: impl Into<String>, condition: Condition) -> Self {
        self.group(FilterGroup::new().or(field, value, condition))
    }

    /// Add a filter group (AND-ed with the others).
    #[must_use]
    pub fn group(mut self, group: FilterGroup) -> Self {
        self.filter_groups.push(group);
        self
    }

    #[must_use]
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_orders.push((field.into(), direction));
        self
    }

    #[must_use]
    pub fn page(mut self, current_page: u32, page_size: u32) -> Self {
        self.current_page = Some(current_page);
        self.page_size = Some(page_size);
        self
    }

    /// Add a supplementary query parameter outside `searchCriteria`.
    ///
    /// The key is sent as given; the value is percent-encoded.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Encode into a query string (without the leading `?`).
    ///
    /// Keys keep their literal brackets; values are percent-encoded. Empty
    /// criteria still emit `searchCriteria=` because Magento rejects list
    /// requests that carry no criteria at all.
    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<String> = Vec::new();

        for (g, group) in self.filter_groups.iter().enumerate() {
            for (f, filter) in group.filters.iter().enumerate() {
                let prefix = format!("searchCriteria[filter_groups][{g}][filters][{f}]");
                pairs.push(format!("{prefix}[field]={}", encode(&filter.field)));
                pairs.push(format!("{prefix}[value]={}", encode(&filter.value)));
                pairs.push(format!("{prefix}[condition_type]={}", filter.condition));
            }
        }

        for (i, (field, direction)) in self.sort_orders.iter().enumerate() {
            pairs.push(format!("searchCriteria[sortOrders][{i}][field]={}", encode(field)));
            pairs.push(format!(
                "searchCriteria[sortOrders][{i}][direction]={}",
                direction.as_str()
            ));
        }

        if let Some(size) = self.page_size {
            pairs.push(format!("searchCriteria[pageSize]={size}"));
        }
        if let Some(page) = self.current_page {
            pairs.push(format!("searchCriteria[currentPage]={page}"));
        }

        if pairs.is_empty() {
            pairs.push("searchCriteria=".to_string());
        }

        for (key, value) in &self.params {
            pairs.push(format!("{key}={}", encode(value)));
        }

        pairs.join("&")
    }
}

impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// Single-filter shortcut.
pub fn build_search_query(field: &str, value: &str, condition: Condition) -> String {
    SearchCriteria::new()
        .filter(field, value, condition)
        .to_query_string()
}

fn encode(value: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_filter_shape() {
        let query = build_search_query("increment_id", "100000123", Condition::Eq);
        assert_eq!(
            query,
            "searchCriteria[filter_groups][0][filters][0][field]=increment_id&\
             searchCriteria[filter_groups][0][filters][0][value]=100000123&\
             searchCriteria[filter_groups][0][filters][0][condition_type]=eq"
        );
    }

    #[test]
    fn test_groups_and_filters_are_indexed_by_position() {
        let query = SearchCriteria::new()
            .filter("type_id", "simple", Condition::Eq)
            .group(
                FilterGroup::new()
                    .or("sku", "a%", Condition::Like)
                    .or("name", "b%", Condition::Like),
            )
            .to_query_string();

        assert!(query.contains("searchCriteria[filter_groups][0][filters][0][field]=type_id"));
        assert!(query.contains("searchCriteria[filter_groups][1][filters][0][field]=sku"));
        assert!(query.contains("searchCriteria[filter_groups][1][filters][1][field]=name"));
        assert!(query.contains("searchCriteria[filter_groups][1][filters][1][condition_type]=like"));
        assert!(!query.contains("[filter_groups][2]"));
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let query = build_search_query("name", "Default Category & More", Condition::In);
        assert!(query.contains("[value]=Default%20Category%20%26%20More"));
    }

    #[test]
    fn test_paging_sorting_and_params() {
        let query = SearchCriteria::new()
            .sort("created_at", SortDirection::Desc)
            .page(2, 50)
            .param("fields", "items[entity_id]")
            .to_query_string();

        assert_eq!(
            query,
            "searchCriteria[sortOrders][0][field]=created_at&\
             searchCriteria[sortOrders][0][direction]=DESC&\
             searchCriteria[pageSize]=50&\
             searchCriteria[currentPage]=2&\
             fields=items%5Bentity_id%5D"
        );
    }

    #[test]
    fn test_param_values_are_percent_encoded() {
        let query = SearchCriteria::new()
            .param("fields", "items[sku,name]")
            .param("note", "a&b #1+2")
            .to_query_string();
        assert_eq!(
            query,
            "searchCriteria=&fields=items%5Bsku%2Cname%5D&note=a%26b%20%231%2B2"
        );
    }

    #[test]
    fn test_empty_criteria() {
        assert_eq!(SearchCriteria::new().to_query_string(), "searchCriteria=");
    }
}
