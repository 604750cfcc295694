//! Test data fixtures for the mock server.

use crate::{Attribute, AttributeOption, Category, Product, StockItem};

/// Collection of fixture factories for test data.
pub struct Fixtures;

impl Fixtures {
    /// An enabled simple product with stock.
    pub fn stocked_product(sku: &str, name: &str, price: f64, qty: f64) -> Product {
        let mut product = Product::simple(sku, name, price);
        product.weight = Some(1.0);
        let extension = product.extension_attributes.get_or_insert_with(Default::default);
        extension.stock_item = Some(StockItem {
            qty: Some(qty),
            is_in_stock: qty > 0.0,
            ..Default::default()
        });
        product
    }

    /// A dropdown attribute with the given option labels.
    pub fn dropdown(code: &str, label: &str, options: &[&str]) -> Attribute {
        let mut attribute = Attribute::dropdown(code, label);
        attribute.options = options
            .iter()
            .enumerate()
            .map(|(i, l)| AttributeOption {
                value: (100 + i).to_string(),
                ..AttributeOption::new(*l)
            })
            .collect();
        attribute
    }

    /// A small store: a category tree, three products and a color attribute.
    pub fn default_state() -> super::MockState {
        super::MockState::new()
            .with_category(Category {
                id: Some(2),
                ..Category::new("Default Category", 1)
            })
            .with_category(Category {
                id: Some(3),
                ..Category::new("Men", 2)
            })
            .with_product(Self::stocked_product("MH01-XS-Black", "Chaz Kangeroo Hoodie", 52.0, 100.0))
            .with_product(Self::stocked_product("MS04-M-Red", "Gobi HeatTec Tee", 29.0, 20.0))
            .with_product(Self::stocked_product("24-MB01", "Joust Duffle Bag", 34.0, 0.0))
            .with_attribute(Self::dropdown("color", "Color", &["Black", "Red", "Blue"]))
    }
}
