//! Trait definitions for Magento entity operations.
//!
//! Entity handles implement the traits their endpoints support.

mod handle;
mod list;
mod lookup;
mod refresh;

pub use handle::{Handle, HandleState};
pub use list::{List, DEFAULT_PAGE_SIZE};
pub use lookup::Lookup;
pub use refresh::Refresh;
