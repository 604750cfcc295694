//! Lookup trait for resolving a handle from a natural key.

use async_trait::async_trait;

use crate::client::MagentoClient;
use crate::error::Result;

/// Resolve an entity by its natural key (SKU, name, code, increment id)
/// and hydrate a handle for it.
///
/// # Example
///
/// ```ignore
/// use m2rest::{Lookup, MagentoClient, ProductHandle};
///
/// let product = ProductHandle::lookup(&client, "SKU-1".to_string()).await?;
/// assert_eq!(product.route(), Some("/products/SKU-1"));
/// ```
#[async_trait]
pub trait Lookup: Sized {
    /// The natural key type for this entity.
    type Key: Send;

    /// Find the entity and return a hydrated handle.
    ///
    /// # Errors
    ///
    /// Returns [`MagentoError::NotFound`](crate::MagentoError::NotFound)
    /// (possibly wrapped in context) if no entity matches the key.
    async fn lookup(client: &MagentoClient, key: Self::Key) -> Result<Self>;
}
