//! Basic example demonstrating the Magento client.
//!
//! Run with:
//! ```
//! MAGENTO_HOST=shop.example.com MAGENTO_BEARER_TOKEN=token cargo run --example basic
//! ```

use m2rest::config::Settings;
use m2rest::{
    Address, AddressInformation, CartHandle, CartItem, Condition, List, Lookup, Product,
    ProductHandle, SearchCriteria,
};

#[tokio::main]
async fn main() -> m2rest::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    // Create client from environment variables
    let settings = Settings::from_env()?;
    let client = settings.client()?;
    println!("Connected to: {}", client.base_url());

    // List first page of simple products
    println!("\n--- Listing Products (first page) ---");
    let criteria = SearchCriteria::new().filter("type_id", "simple", Condition::Eq);
    let products = Product::list_page(&client, &criteria, 1, 10).await?;
    println!(
        "Found {} products (total: {:?})",
        products.len(),
        products.total
    );
    for product in products.iter() {
        println!("  - {} ({})", product.sku, product.name.as_deref().unwrap_or("-"));
    }

    let Some(first) = products.items.first() else {
        println!("No products to put in a cart");
        return Ok(());
    };

    // Fetch full details, including stock
    println!("\n--- Product Details ---");
    let handle = ProductHandle::lookup(&client, first.sku.clone()).await?;
    println!("Price: {:?}", handle.product.price);
    println!("Stock: {:?}", handle.product.stock_item());

    // Walk a guest cart up to the payment step
    println!("\n--- Guest Cart ---");
    let cart = CartHandle::new_guest(&client).await?;
    println!("Quote: {}", cart.quote_id);
    cart.add_items(&[CartItem::new(handle.product.sku.clone(), 1.0)])
        .await?;

    let address = Address {
        country_id: Some("US".to_string()),
        street: vec!["1 Main St".to_string()],
        city: Some("Austin".to_string()),
        region_code: Some("TX".to_string()),
        postcode: Some("78701".to_string()),
        telephone: Some("5551234".to_string()),
        firstname: Some("Jane".to_string()),
        lastname: Some("Doe".to_string()),
        email: Some("jane@example.com".to_string()),
        ..Default::default()
    };

    let carriers = cart.estimate_shipping_carriers(&address).await?;
    for carrier in &carriers {
        println!(
            "  carrier {}/{} {:?}",
            carrier.carrier_code, carrier.method_code, carrier.amount
        );
    }

    if let Some(carrier) = carriers.iter().find(|c| c.available) {
        let details = cart
            .add_shipping_information(&AddressInformation::same_address(address, carrier))
            .await?;
        for method in &details.payment_methods {
            println!("  payment {} ({})", method.code, method.title);
        }
    }

    Ok(())
}
