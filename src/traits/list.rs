//! List trait for fetching collections of entities.

use async_trait::async_trait;

use crate::client::MagentoClient;
use crate::error::Result;
use crate::pagination::Page;
use crate::search::SearchCriteria;

/// Default page size for list operations.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Maximum pages to fetch (safety limit).
const MAX_PAGES: u32 = 1000;

/// List/filter entities with pagination support.
///
/// # Example
///
/// ```ignore
/// use m2rest::{Condition, List, Product, SearchCriteria};
///
/// let criteria = SearchCriteria::new().filter("type_id", "simple", Condition::Eq);
///
/// // Fetch a single page
/// let page = Product::list_page(&client, &criteria, 1, 50).await?;
///
/// // Fetch all pages
/// let all = Product::list_all(&client, &criteria).await?;
/// ```
#[async_trait]
pub trait List: Sized + Send {
    /// List entities matching the criteria (single page).
    ///
    /// Paging fields already present in `criteria` are overridden by
    /// `page` and `count`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn list_page(
        client: &MagentoClient,
        criteria: &SearchCriteria,
        page: u32,
        count: u32,
    ) -> Result<Page<Self>>;

    /// List all entities matching the criteria (fetches all pages).
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    async fn list_all(client: &MagentoClient, criteria: &SearchCriteria) -> Result<Vec<Self>> {
        let mut all_items = Vec::new();
        let mut page = 1;

        loop {
            let result = Self::list_page(client, criteria, page, DEFAULT_PAGE_SIZE).await?;
            let items_count = result.len();
            let has_more = result.has_more;
            all_items.extend(result);

            if !has_more || items_count < DEFAULT_PAGE_SIZE as usize {
                break;
            }
            page += 1;

            // Safety limit to prevent infinite loops
            if page > MAX_PAGES {
                tracing::warn!("Reached pagination limit of {} pages, stopping", MAX_PAGES);
                break;
            }
        }

        Ok(all_items)
    }
}
