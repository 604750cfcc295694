//! Mock server state management.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    Attribute, AttributeOption, Cart, CartItem, Category, Order, OrderItem, Product, ProductLink,
    StatusHistory, StockItem,
};

/// Shared state for the mock server.
#[derive(Debug, Default)]
pub struct MockState {
    /// Products by SKU.
    pub products: BTreeMap<String, Product>,
    /// Categories by id.
    pub categories: BTreeMap<u64, Category>,
    /// Product assignments by category id.
    pub category_products: HashMap<u64, Vec<ProductLink>>,
    /// Attributes by code.
    pub attributes: BTreeMap<String, Attribute>,
    /// Guest carts by masked quote id.
    pub carts: HashMap<String, Cart>,
    /// Orders by entity id.
    pub orders: BTreeMap<u64, Order>,
    /// If set, API requests must carry this bearer token.
    pub required_token: Option<String>,
    /// Username and password accepted by the token endpoints.
    pub credentials: Option<(String, String)>,
    last_id: u64,
}

/// Why an item could not be added to a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    NoSuchCart,
    NoSuchProduct(String),
    EmptyCart,
}

impl MockState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Allocate an id. Ids are unique across entity kinds.
    pub fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.save_product(product);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.create_category(category);
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.create_attribute(attribute);
        self
    }

    pub fn with_order(mut self, mut order: Order) -> Self {
        let id = order.entity_id.unwrap_or_else(|| self.next_id());
        self.last_id = self.last_id.max(id);
        order.entity_id = Some(id);
        self.orders.insert(id, order);
        self
    }

    pub fn with_required_token(mut self, token: &str) -> Self {
        self.required_token = Some(token.to_string());
        self
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some((username.to_string(), password.to_string()));
        self
    }

    /// Create or replace a product by SKU. New products get an id and an
    /// empty stock item.
    pub fn save_product(&mut self, mut product: Product) -> Product {
        let existing_id = self.products.get(&product.sku).and_then(|p| p.id);
        let id = match existing_id.or(product.id) {
            Some(id) => id,
            None => self.next_id(),
        };
        self.last_id = self.last_id.max(id);
        product.id = Some(id);

        let extension = product.extension_attributes.get_or_insert_with(Default::default);
        let stock = extension.stock_item.get_or_insert_with(StockItem::default);
        stock.item_id = Some(id);
        stock.product_id = Some(id);
        stock.stock_id.get_or_insert(1);
        stock.qty.get_or_insert(0.0);

        self.products.insert(product.sku.clone(), product.clone());
        product
    }

    /// Set stock on the item `item_id` of product `sku`.
    pub fn update_stock(&mut self, sku: &str, item_id: u64, update: &StockItem) -> Option<u64> {
        let stock = self
            .products
            .get_mut(sku)?
            .extension_attributes
            .as_mut()?
            .stock_item
            .as_mut()?;
        if stock.item_id != Some(item_id) {
            return None;
        }
        stock.qty = update.qty;
        stock.is_in_stock = update.is_in_stock;
        Some(item_id)
    }

    pub fn create_category(&mut self, mut category: Category) -> Category {
        let id = match category.id {
            Some(id) => id,
            None => self.next_id(),
        };
        self.last_id = self.last_id.max(id);
        category.id = Some(id);

        let parent_path = category
            .parent_id
            .and_then(|p| self.categories.get(&p))
            .and_then(|p| p.path.clone());
        category.path = Some(match parent_path {
            Some(path) => format!("{path}/{id}"),
            None => id.to_string(),
        });
        category.level = Some(category.path.as_deref().map_or(0, |p| p.split('/').count() as u32));

        self.categories.insert(id, category.clone());
        category
    }

    /// Assign a product to a category. Returns false if either is unknown.
    pub fn assign_product(&mut self, category_id: u64, mut link: ProductLink) -> bool {
        if !self.categories.contains_key(&category_id) || !self.products.contains_key(&link.sku) {
            return false;
        }
        link.category_id = category_id.to_string();
        let links = self.category_products.entry(category_id).or_default();
        links.retain(|l| l.sku != link.sku);
        links.push(link);
        true
    }

    pub fn create_attribute(&mut self, mut attribute: Attribute) -> Attribute {
        let id = match attribute.attribute_id {
            Some(id) => id,
            None => self.next_id(),
        };
        self.last_id = self.last_id.max(id);
        attribute.attribute_id = Some(id);
        if attribute.options.iter().all(|o| !o.value.is_empty()) {
            attribute.options.insert(
                0,
                AttributeOption {
                    label: " ".to_string(),
                    value: String::new(),
                    ..Default::default()
                },
            );
        }
        self.attributes
            .insert(attribute.attribute_code.clone(), attribute.clone());
        attribute
    }

    /// Add an option to an attribute and return its new value.
    pub fn add_option(&mut self, code: &str, mut option: AttributeOption) -> Option<String> {
        if !self.attributes.contains_key(code) {
            return None;
        }
        let value = self.next_id().to_string();
        option.value = value.clone();
        self.attributes.get_mut(code)?.options.push(option);
        Some(value)
    }

    /// Open a guest cart and return its masked id.
    pub fn create_cart(&mut self) -> String {
        let id = self.next_id();
        let masked = format!("{:032x}", u128::from(id).wrapping_mul(0x9e37_79b9_7f4a_7c15));
        // Magento attaches an empty billing address to every new quote.
        let mut extra = serde_json::Map::new();
        extra.insert("billing_address".to_string(), empty_billing_address(id));
        self.carts.insert(
            masked.clone(),
            Cart {
                id: Some(id),
                is_active: Some(true),
                is_virtual: Some(false),
                items_count: Some(0),
                items_qty: Some(0.0),
                extra,
                ..Default::default()
            },
        );
        masked
    }

    pub fn add_cart_item(&mut self, masked: &str, item: CartItem) -> Result<CartItem, CartError> {
        if !self.carts.contains_key(masked) {
            return Err(CartError::NoSuchCart);
        }
        let product = self
            .products
            .get(&item.sku)
            .ok_or_else(|| CartError::NoSuchProduct(item.sku.clone()))?;

        let item = CartItem {
            item_id: Some(self.last_id + 1),
            name: product.name.clone(),
            price: product.price,
            product_type: product.type_id.clone(),
            ..item
        };
        self.last_id += 1;

        let cart = self.carts.get_mut(masked).ok_or(CartError::NoSuchCart)?;
        cart.items.push(item.clone());
        recount(cart);
        Ok(item)
    }

    pub fn remove_cart_item(&mut self, masked: &str, item_id: u64) -> bool {
        let Some(cart) = self.carts.get_mut(masked) else {
            return false;
        };
        let before = cart.items.len();
        cart.items.retain(|i| i.item_id != Some(item_id));
        let removed = cart.items.len() != before;
        recount(cart);
        removed
    }

    /// Turn a cart into an order and return the order's entity id.
    pub fn place_order(&mut self, masked: &str, payment_method: &str) -> Result<u64, CartError> {
        let cart = self.carts.get(masked).ok_or(CartError::NoSuchCart)?;
        if cart.items.is_empty() {
            return Err(CartError::EmptyCart);
        }

        let items: Vec<OrderItem> = cart
            .items
            .iter()
            .map(|i| OrderItem {
                item_id: i.item_id,
                sku: i.sku.clone(),
                name: i.name.clone(),
                product_type: i.product_type.clone(),
                qty_ordered: Some(i.qty),
                price: i.price,
                row_total: i.price.map(|p| p * i.qty),
                ..Default::default()
            })
            .collect();
        let total: f64 = items.iter().filter_map(|i| i.row_total).sum();
        let qty: f64 = items.iter().filter_map(|i| i.qty_ordered).sum();

        let id = self.next_id();
        let mut extra = serde_json::Map::new();
        extra.insert(
            "payment".to_string(),
            serde_json::json!({ "method": payment_method }),
        );

        let order = Order {
            entity_id: Some(id),
            increment_id: Some(format!("{id:09}")),
            state: Some("new".to_string()),
            status: Some("pending".to_string()),
            grand_total: Some(total),
            subtotal: Some(total),
            total_qty_ordered: Some(qty),
            order_currency_code: Some("USD".to_string()),
            items,
            extra,
            ..Default::default()
        };
        self.orders.insert(id, order);
        self.carts.remove(masked);
        Ok(id)
    }

    pub fn add_order_comment(&mut self, entity_id: u64, mut comment: StatusHistory) -> bool {
        let Some(order) = self.orders.get_mut(&entity_id) else {
            return false;
        };
        comment.parent_id = Some(entity_id);
        order.status_histories.push(comment);
        true
    }
}

fn recount(cart: &mut Cart) {
    cart.items_count = Some(cart.items.len() as u32);
    cart.items_qty = Some(cart.items.iter().map(|i| i.qty).sum());
}

fn empty_billing_address(id: u64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "region": null,
        "region_id": null,
        "region_code": null,
        "country_id": null,
        "street": [""],
        "telephone": null,
        "postcode": null,
        "city": null,
        "firstname": null,
        "lastname": null,
        "email": null,
        "same_as_billing": 0,
        "save_in_address_book": 0
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_product_assigns_id_and_stock_item() {
        let mut state = MockState::new();
        let saved = state.save_product(Product::simple("A", "Alpha", 1.0));
        assert_eq!(saved.id, Some(1));
        assert_eq!(saved.stock_item().and_then(|s| s.item_id), Some(1));

        // Replacing keeps the id
        let again = state.save_product(Product::simple("A", "Alpha v2", 2.0));
        assert_eq!(again.id, Some(1));
        assert_eq!(state.products["A"].name.as_deref(), Some("Alpha v2"));
    }

    #[test]
    fn test_update_stock_checks_item_id() {
        let mut state = MockState::new().with_product(Product::simple("A", "Alpha", 1.0));
        let update = StockItem {
            qty: Some(7.0),
            is_in_stock: true,
            ..Default::default()
        };
        assert_eq!(state.update_stock("A", 99, &update), None);
        assert_eq!(state.update_stock("A", 1, &update), Some(1));
        assert_eq!(state.products["A"].stock_item().and_then(|s| s.qty), Some(7.0));
    }

    #[test]
    fn test_category_paths() {
        let mut state = MockState::new();
        let root = state.create_category(Category::new("Root", 0));
        let child = state.create_category(Category::new("Shoes", root.id.unwrap()));
        assert_eq!(child.path, Some(format!("{}/{}", root.id.unwrap(), child.id.unwrap())));
        assert_eq!(child.level, Some(2));
    }

    #[test]
    fn test_cart_to_order() {
        let mut state = MockState::new().with_product(Product::simple("A", "Alpha", 2.5));
        let cart = state.create_cart();

        let missing = state.add_cart_item(&cart, CartItem::new("nope", 1.0));
        assert_eq!(missing, Err(CartError::NoSuchProduct("nope".into())));

        state.add_cart_item(&cart, CartItem::new("A", 2.0)).unwrap();
        let order_id = state.place_order(&cart, "checkmo").unwrap();

        let order = &state.orders[&order_id];
        assert_eq!(order.grand_total, Some(5.0));
        assert_eq!(order.increment_id, Some(format!("{order_id:09}")));
        assert!(state.carts.is_empty());
    }

    #[test]
    fn test_new_cart_has_null_billing_address() {
        let mut state = MockState::new();
        let cart = state.create_cart();
        let json = serde_json::to_value(&state.carts[&cart]).unwrap();
        assert!(json["billing_address"]["country_id"].is_null());

        let decoded: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.billing_address.and_then(|a| a.country_id), None);
    }

    #[test]
    fn test_empty_cart_cannot_order() {
        let mut state = MockState::new();
        let cart = state.create_cart();
        assert_eq!(state.place_order(&cart, "checkmo"), Err(CartError::EmptyCart));
    }

    #[test]
    fn test_add_option_appends_after_placeholder() {
        let mut state = MockState::new().with_attribute(Attribute::dropdown("color", "Color"));
        let value = state
            .add_option("color", AttributeOption::new("Red"))
            .unwrap();
        let options = &state.attributes["color"].options;
        assert_eq!(options[0].value, "");
        assert_eq!(options[1].value, value);
        assert!(state.add_option("size", AttributeOption::new("S")).is_none());
    }
}
