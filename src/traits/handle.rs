//! Common state of entity handles.

use crate::error::{MagentoError, Result};

/// Lifecycle of an entity handle.
///
/// `Uninitialized` handles have no route. Any create or lookup that
/// resolves the remote identifier moves to `RouteKnown`; a detail GET
/// moves to `Hydrated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleState {
    #[default]
    Uninitialized,
    RouteKnown,
    Hydrated,
}

/// Shared accessors for entity handles.
pub trait Handle {
    /// The resolved remote path, once known.
    fn route(&self) -> Option<&str>;

    fn state(&self) -> HandleState;

    /// The route, or [`MagentoError::InvalidUsage`] if it is not known yet.
    ///
    /// # Errors
    ///
    /// Fails without I/O when the handle is still uninitialized.
    fn require_route(&self, operation: &str) -> Result<&str> {
        self.route().ok_or_else(|| {
            tracing::error!(operation, "handle has no route");
            MagentoError::InvalidUsage(format!("cannot {operation}: route is not known yet"))
        })
    }
}
