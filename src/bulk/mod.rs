//! Bulk catalog tooling: concurrent product creation and stock updates.
//!
//! Each item is processed independently; a failure is recorded in the
//! [`BulkReport`] and does not stop the rest of the batch. Cancelling the
//! client's token makes the remaining requests fail with `Cancelled`.

mod files;
mod pool;

pub use files::{load_stock_updates, read_stock_updates, save_skus, write_skus, StockUpdate};
pub use pool::WorkerPool;

use crate::client::MagentoClient;
use crate::error::Result;
use crate::models::{Product, ProductHandle};
use crate::traits::Lookup;

/// Default number of requests in flight.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Outcome of a bulk run, keyed by SKU.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkReport {
    pub succeeded: Vec<String>,
    /// SKU and error message.
    pub failed: Vec<(String, String)>,
}

impl BulkReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn from_outcomes(outcomes: Vec<(String, Result<()>)>) -> Self {
        let mut report = Self::default();
        for (sku, outcome) in outcomes {
            match outcome {
                Ok(()) => report.succeeded.push(sku),
                Err(e) => report.failed.push((sku, e.to_string())),
            }
        }
        report
    }
}

/// The generated product for position `index` of a bulk create.
pub fn generated_product(prefix: &str, index: usize) -> Product {
    let n = index + 1;
    let mut product = Product::simple(
        format!("{prefix}-{n}"),
        format!("Bulk Product {n}"),
        9.99 + (index % 10) as f64,
    );
    product.weight = Some(1.0);
    product
}

/// Create `count` simple products with generated SKUs.
#[tracing::instrument(skip(client))]
pub async fn create_products(
    client: &MagentoClient,
    count: usize,
    concurrency: usize,
) -> BulkReport {
    let prefix = format!("bulk-product-{}", chrono::Utc::now().timestamp());
    let products: Vec<Product> = (0..count).map(|i| generated_product(&prefix, i)).collect();
    create_from(client, products, concurrency).await
}

/// Create or replace each product.
#[tracing::instrument(skip(client, products), fields(count = products.len()))]
pub async fn create_from(
    client: &MagentoClient,
    products: Vec<Product>,
    concurrency: usize,
) -> BulkReport {
    let pool = WorkerPool::new(concurrency);
    let total = products.len();
    let client = client.clone();

    let outcomes = pool
        .run(products, move |idx, product| {
            let client = client.clone();
            async move {
                let sku = product.sku.clone();
                let outcome = ProductHandle::create_or_replace(&client, product, true)
                    .await
                    .map(|_| ());
                match &outcome {
                    Ok(()) => tracing::info!(sku = %sku, "created {}/{}", idx + 1, total),
                    Err(e) => tracing::error!(sku = %sku, error = %e, "failed to create product"),
                }
                (sku, outcome)
            }
        })
        .await;

    let report = BulkReport::from_outcomes(outcomes);
    tracing::info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "bulk create finished"
    );
    report
}

/// Look up each SKU and set its quantity, marking it in stock.
#[tracing::instrument(skip(client, updates), fields(count = updates.len()))]
pub async fn update_stock(
    client: &MagentoClient,
    updates: Vec<StockUpdate>,
    concurrency: usize,
) -> BulkReport {
    let pool = WorkerPool::new(concurrency);
    let total = updates.len();
    let client = client.clone();

    let outcomes = pool
        .run(updates, move |idx, update| {
            let client = client.clone();
            async move {
                let outcome = update_one(&client, &update).await;
                match &outcome {
                    Ok(()) => tracing::info!(
                        sku = %update.sku,
                        qty = update.qty,
                        "updated {}/{}",
                        idx + 1,
                        total
                    ),
                    Err(e) => tracing::error!(sku = %update.sku, error = %e, "failed to update stock"),
                }
                (update.sku, outcome)
            }
        })
        .await;

    let report = BulkReport::from_outcomes(outcomes);
    tracing::info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "bulk stock update finished"
    );
    report
}

async fn update_one(client: &MagentoClient, update: &StockUpdate) -> Result<()> {
    let handle = ProductHandle::lookup(client, update.sku.clone()).await?;
    handle.update_stock(update.qty, true).await
}
