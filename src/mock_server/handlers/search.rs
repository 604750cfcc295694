//! Decoding of Magento `searchCriteria` query strings.

use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    pub field: String,
    pub value: String,
    pub condition: String,
}

impl QueryFilter {
    fn matches(&self, entity: &serde_json::Value) -> bool {
        let actual = match entity.get(&self.field) {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            Some(serde_json::Value::Bool(b)) => Some(if *b { "1" } else { "0" }.to_string()),
            _ => None,
        };

        match (self.condition.as_str(), actual) {
            ("null", actual) => actual.is_none(),
            ("notnull", actual) => actual.is_some(),
            (_, None) => false,
            ("eq", Some(a)) => a == self.value,
            ("neq", Some(a)) => a != self.value,
            ("in", Some(a)) => self.value.split(',').any(|v| v.trim() == a),
            ("nin", Some(a)) => !self.value.split(',').any(|v| v.trim() == a),
            ("like", Some(a)) => like(&a, &self.value),
            ("nlike", Some(a)) => !like(&a, &self.value),
            _ => true,
        }
    }
}

fn like(actual: &str, pattern: &str) -> bool {
    let actual = actual.to_lowercase();
    let pattern = pattern.to_lowercase();
    match (pattern.strip_prefix('%'), pattern.strip_suffix('%')) {
        (Some(rest), Some(_)) => actual.contains(rest.trim_end_matches('%')),
        (Some(rest), None) => actual.ends_with(rest),
        (None, Some(rest)) => actual.starts_with(rest),
        (None, None) => actual == pattern,
    }
}

/// Filters and paging decoded from a list request.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// AND-ed groups of OR-ed filters.
    pub groups: Vec<Vec<QueryFilter>>,
    pub page_size: Option<usize>,
    pub current_page: Option<usize>,
}

impl ListQuery {
    pub fn parse(raw: Option<&str>) -> Self {
        let mut filters: BTreeMap<(usize, usize), QueryFilter> = BTreeMap::new();
        let mut query = Self::default();

        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            if let Some(rest) = key.strip_prefix("searchCriteria[filter_groups][") {
                let parts: Vec<&str> = rest.trim_end_matches(']').split("][").collect();
                let [group, "filters", index, attr] = parts.as_slice() else {
                    continue;
                };
                let (Ok(group), Ok(index)) = (group.parse(), index.parse()) else {
                    continue;
                };
                let filter = filters.entry((group, index)).or_default();
                match *attr {
                    "field" => filter.field = value.into_owned(),
                    "value" => filter.value = value.into_owned(),
                    "condition_type" => filter.condition = value.into_owned(),
                    _ => {}
                }
            } else if key == "searchCriteria[pageSize]" {
                query.page_size = value.parse().ok();
            } else if key == "searchCriteria[currentPage]" {
                query.current_page = value.parse().ok();
            }
        }

        let mut current_group = None;
        for ((group, _), mut filter) in filters {
            if filter.condition.is_empty() {
                filter.condition = "eq".to_string();
            }
            if current_group != Some(group) {
                query.groups.push(Vec::new());
                current_group = Some(group);
            }
            if let Some(last) = query.groups.last_mut() {
                last.push(filter);
            }
        }

        query
    }

    /// True if every group has at least one matching filter.
    pub fn matches<T: Serialize>(&self, entity: &T) -> bool {
        let Ok(value) = serde_json::to_value(entity) else {
            return false;
        };
        self.groups
            .iter()
            .all(|group| group.iter().any(|f| f.matches(&value)))
    }

    /// Filter then page `items`, answering with a Magento list envelope.
    pub fn respond<T: Serialize + Clone>(&self, items: impl IntoIterator<Item = T>) -> serde_json::Value {
        let matching: Vec<T> = items.into_iter().filter(|e| self.matches(e)).collect();
        let total = matching.len();

        let page: Vec<T> = match self.page_size {
            Some(size) if size > 0 => {
                let current = self.current_page.unwrap_or(1).max(1);
                matching
                    .into_iter()
                    .skip((current - 1) * size)
                    .take(size)
                    .collect()
            }
            _ => matching,
        };

        serde_json::json!({
            "items": page,
            "total_count": total,
            "search_criteria": {
                "page_size": self.page_size,
                "current_page": self.current_page,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{Condition, FilterGroup, SearchCriteria};

    #[test]
    fn test_parses_client_encoding() {
        let criteria = SearchCriteria::new()
            .filter("name", "Shoes & Socks", Condition::In)
            .group(
                FilterGroup::new()
                    .or("type_id", "simple", Condition::Eq)
                    .or("type_id", "virtual", Condition::Eq),
            )
            .page(2, 5);
        let query = ListQuery::parse(Some(&criteria.to_query_string()));

        assert_eq!(query.groups.len(), 2);
        assert_eq!(query.groups[0][0].value, "Shoes & Socks");
        assert_eq!(query.groups[1].len(), 2);
        assert_eq!(query.page_size, Some(5));
        assert_eq!(query.current_page, Some(2));
    }

    #[test]
    fn test_matches_and_pages() {
        let items = vec![
            serde_json::json!({"sku": "A", "type_id": "simple"}),
            serde_json::json!({"sku": "B", "type_id": "configurable"}),
            serde_json::json!({"sku": "C", "type_id": "simple"}),
        ];
        let query = ListQuery::parse(Some(
            "searchCriteria[filter_groups][0][filters][0][field]=type_id\
             &searchCriteria[filter_groups][0][filters][0][value]=simple\
             &searchCriteria[pageSize]=1&searchCriteria[currentPage]=2",
        ));
        let body = query.respond(items);
        assert_eq!(body["total_count"], 2);
        assert_eq!(body["items"][0]["sku"], "C");
    }

    #[test]
    fn test_like() {
        assert!(like("Blue Shirt", "%shirt%"));
        assert!(like("Blue Shirt", "blue%"));
        assert!(!like("Blue Shirt", "%pants"));
    }
}
