//! Magento 2 REST API CLI binary.
//!
//! A command-line interface for inspecting a Magento store and running
//! bulk catalog jobs.

use clap::Parser;
use m2rest::bulk::{self, BulkReport};
use m2rest::cli::{criteria_from_filters, BulkCommand, Cli, Command, Entity};
use m2rest::config::{Settings, ENV_BEARER_TOKEN, ENV_HOST};
use m2rest::output::PrettyPrint;
use m2rest::{
    Attribute, AttributeHandle, AttributeSet, AttributeSetHandle, Category, CategoryHandle, List,
    Lookup, MagentoClient, Order, OrderHandle, Page, Product, ProductHandle, SearchCriteria,
};
use serde::Serialize;
use std::process::ExitCode;
use tabled::{Table, Tabled};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Hint: Set {ENV_HOST} and {ENV_BEARER_TOKEN} environment variables");
            return ExitCode::FAILURE;
        }
    };

    init_logging(cli.debug || settings.debug);

    let client = match settings.client() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let token = CancellationToken::new();
    let client = client.with_cancellation(token.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling outstanding requests");
            token.cancel();
        }
    });

    match run(&client, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "m2rest=debug" } else { "m2rest=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(client: &MagentoClient, cli: Cli) -> m2rest::Result<()> {
    match cli.command {
        Command::Get { entity, key } => handle_get(client, entity, key, cli.json).await,
        Command::List {
            entity,
            page,
            count,
            filters,
        } => {
            let criteria = criteria_from_filters(&filters);
            handle_list(client, entity, &criteria, page, count, cli.json).await
        }
        Command::Bulk(command) => handle_bulk(client, command, cli.json).await,
    }
}

async fn handle_get(
    client: &MagentoClient,
    entity: Entity,
    key: String,
    json: bool,
) -> m2rest::Result<()> {
    match entity {
        Entity::Product => {
            let handle = ProductHandle::lookup(client, key).await?;
            output_single(&handle.product, json)?;
        }
        Entity::Order => {
            let handle = OrderHandle::lookup(client, key).await?;
            output_single(&handle.order, json)?;
        }
        Entity::Category => {
            let handle = CategoryHandle::lookup(client, key).await?;
            output_single(&handle.category, json)?;
            if !json && !handle.products.is_empty() {
                println!("Products:       {}", handle.products.len());
                for link in &handle.products {
                    println!("  - {} (position {})", link.sku, link.position);
                }
            }
        }
        Entity::Attribute => {
            let handle = AttributeHandle::lookup(client, key).await?;
            output_single(&handle.attribute, json)?;
        }
        Entity::AttributeSet => {
            let handle = AttributeSetHandle::lookup(client, key).await?;
            output_single(&handle.attribute_set, json)?;
            if !json {
                for group in &handle.groups {
                    println!(
                        "  [{}] {}",
                        group.attribute_group_id.unwrap_or_default(),
                        group.attribute_group_name
                    );
                }
            }
        }
    }
    Ok(())
}

async fn handle_list(
    client: &MagentoClient,
    entity: Entity,
    criteria: &SearchCriteria,
    page: Option<u32>,
    count: Option<u32>,
    json: bool,
) -> m2rest::Result<()> {
    let page = page.unwrap_or(1);
    let count = count.unwrap_or(20);

    match entity {
        Entity::Product => {
            let products = Product::list_page(client, criteria, page, count).await?;
            output_page(&products, json, |x| ProductRow::from(x))?;
        }
        Entity::Order => {
            let orders = Order::list_page(client, criteria, page, count).await?;
            output_page(&orders, json, |x| OrderRow::from(x))?;
        }
        Entity::Category => {
            let categories = Category::list_page(client, criteria, page, count).await?;
            output_page(&categories, json, |x| CategoryRow::from(x))?;
        }
        Entity::Attribute => {
            let attributes = Attribute::list_page(client, criteria, page, count).await?;
            output_page(&attributes, json, |x| AttributeRow::from(x))?;
        }
        Entity::AttributeSet => {
            let sets = AttributeSet::list_page(client, criteria, page, count).await?;
            output_page(&sets, json, |x| AttributeSetRow::from(x))?;
        }
    }
    Ok(())
}

async fn handle_bulk(client: &MagentoClient, command: BulkCommand, json: bool) -> m2rest::Result<()> {
    let report = match command {
        BulkCommand::Create {
            count,
            concurrency,
            csv,
        } => {
            let report = bulk::create_products(client, count, concurrency).await;
            if let Some(path) = csv {
                bulk::save_skus(&path, &report.succeeded)?;
                tracing::info!(path = %path.display(), "saved created SKUs");
            }
            report
        }
        BulkCommand::UpdateStock { csv, concurrency } => {
            let updates = bulk::load_stock_updates(&csv)?;
            tracing::info!(count = updates.len(), "loaded stock updates");
            bulk::update_stock(client, updates, concurrency).await
        }
    };

    output_report(&report, json)?;
    if report.is_success() {
        Ok(())
    } else {
        Err(m2rest::MagentoError::UnexpectedResponse {
            operation: "run bulk job".to_string(),
            body: format!("{} of {} items failed", report.failed.len(), report.total()),
        })
    }
}

fn output_single<T: Serialize + PrettyPrint>(item: &T, json: bool) -> m2rest::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(item)?);
    } else {
        println!("{}", item.pretty_print());
    }
    Ok(())
}

fn output_page<T, R, F>(page: &Page<T>, json: bool, to_row: F) -> m2rest::Result<()>
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    if json {
        println!("{}", serde_json::to_string_pretty(&page.items)?);
    } else {
        let rows: Vec<R> = page.iter().map(to_row).collect();
        println!("{}", Table::new(rows));
        if let Some(total) = page.total {
            let total_pages = total.div_ceil(u64::from(page.count.max(1)));
            println!("\nPage {}/{} ({} total items)", page.page, total_pages, total);
        } else if page.has_more {
            println!("\nPage {} (more available)", page.page);
        } else {
            println!("\nPage {} (end)", page.page);
        }
    }
    Ok(())
}

fn output_report(report: &BulkReport, json: bool) -> m2rest::Result<()> {
    if json {
        let failed: Vec<_> = report
            .failed
            .iter()
            .map(|(sku, error)| serde_json::json!({"sku": sku, "error": error}))
            .collect();
        let value = serde_json::json!({"succeeded": report.succeeded, "failed": failed});
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!(
            "{} succeeded, {} failed",
            report.succeeded.len(),
            report.failed.len()
        );
        if !report.failed.is_empty() {
            let rows: Vec<FailureRow> = report
                .failed
                .iter()
                .map(|(sku, error)| FailureRow {
                    sku: sku.clone(),
                    error: error.clone(),
                })
                .collect();
            println!("{}", Table::new(rows));
        }
    }
    Ok(())
}

// Table row types for non-JSON output

#[derive(Tabled)]
struct ProductRow {
    sku: String,
    name: String,
    #[tabled(rename = "type")]
    type_id: String,
    price: String,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        Self {
            sku: p.sku.clone(),
            name: p.name.clone().unwrap_or_default(),
            type_id: p.type_id.clone().unwrap_or_default(),
            price: p.price.map(|v| format!("{v:.2}")).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct OrderRow {
    increment_id: String,
    status: String,
    customer: String,
    total: String,
}

impl From<&Order> for OrderRow {
    fn from(o: &Order) -> Self {
        Self {
            increment_id: o.increment_id.clone().unwrap_or_default(),
            status: o.status.clone().unwrap_or_default(),
            customer: o.customer_email.clone().unwrap_or_default(),
            total: o.grand_total.map(|v| format!("{v:.2}")).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct CategoryRow {
    id: String,
    name: String,
    parent: String,
}

impl From<&Category> for CategoryRow {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id.map(|v| v.to_string()).unwrap_or_default(),
            name: c.name.clone(),
            parent: c.parent_id.map(|v| v.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct AttributeRow {
    code: String,
    label: String,
    input: String,
}

impl From<&Attribute> for AttributeRow {
    fn from(a: &Attribute) -> Self {
        Self {
            code: a.attribute_code.clone(),
            label: a.default_frontend_label.clone().unwrap_or_default(),
            input: a.frontend_input.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct AttributeSetRow {
    id: String,
    name: String,
}

impl From<&AttributeSet> for AttributeSetRow {
    fn from(s: &AttributeSet) -> Self {
        Self {
            id: s.attribute_set_id.map(|v| v.to_string()).unwrap_or_default(),
            name: s.attribute_set_name.clone(),
        }
    }
}

#[derive(Tabled)]
struct FailureRow {
    sku: String,
    error: String,
}
