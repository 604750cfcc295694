//! Refresh trait for re-reading remote state.

use async_trait::async_trait;

use crate::error::Result;

/// Overwrite a handle's local entity with the remote state.
#[async_trait]
pub trait Refresh {
    /// Re-fetch the entity from its route.
    ///
    /// # Errors
    ///
    /// Returns [`MagentoError::InvalidUsage`](crate::MagentoError::InvalidUsage)
    /// if the handle has no route yet, or any request error.
    async fn refresh(&mut self) -> Result<()>;
}
