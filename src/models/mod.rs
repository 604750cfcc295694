//! Magento entity types and their accessor handles.

mod attribute;
mod attribute_set;
mod cart;
mod category;
pub mod common;
mod configurable_product;
mod order;
mod product;

pub use attribute::*;
pub use attribute_set::*;
pub use cart::*;
pub use category::*;
pub use common::{Address, CustomAttribute};
pub use configurable_product::*;
pub use order::*;
pub use product::*;
