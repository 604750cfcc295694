//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the m2rest binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::bulk::DEFAULT_CONCURRENCY;
use crate::search::{Condition, SearchCriteria};

/// Magento 2 REST API command-line interface.
#[derive(Parser, Debug)]
#[command(name = "m2rest", about = "Magento 2 REST API CLI", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Log request and response details.
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Get a single entity by its natural key.
    Get {
        /// The type of entity to get.
        entity: Entity,

        /// SKU (products), increment id (orders), name (categories,
        /// attribute sets) or attribute code (attributes).
        key: String,
    },

    /// List entities with optional filtering and pagination.
    List {
        /// The type of entity to list.
        entity: Entity,

        /// Page number (1-indexed).
        #[arg(long)]
        page: Option<u32>,

        /// Number of items per page.
        #[arg(long)]
        count: Option<u32>,

        /// Filter as `field=value` (repeatable, AND-ed). Use `field~value`
        /// for a `like` match.
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<FilterArg>,
    },

    /// Bulk catalog operations.
    #[command(subcommand)]
    Bulk(BulkCommand),
}

/// Bulk subcommands.
#[derive(Subcommand, Debug)]
pub enum BulkCommand {
    /// Create generated simple products.
    Create {
        /// Number of products to create.
        #[arg(long, default_value_t = 100)]
        count: usize,

        /// Requests in flight.
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Write the created SKUs to this CSV for a later stock update.
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Set stock quantities from a `sku,qty` CSV file.
    UpdateStock {
        /// CSV file with `sku,qty` rows.
        csv: PathBuf,

        /// Requests in flight.
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },
}

/// Entity types that can be operated on.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    /// A catalog product.
    #[value(alias = "products")]
    Product,
    /// A sales order.
    #[value(alias = "orders")]
    Order,
    /// A catalog category.
    #[value(alias = "categories")]
    Category,
    /// A product attribute.
    #[value(alias = "attributes")]
    Attribute,
    /// A product attribute set.
    #[value(alias = "attribute-sets", alias = "sets")]
    AttributeSet,
}

/// One `--filter` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterArg {
    pub field: String,
    pub value: String,
    pub condition: Condition,
}

fn parse_filter(raw: &str) -> Result<FilterArg, String> {
    let (split, condition) = match (raw.find('='), raw.find('~')) {
        (Some(eq), Some(like)) if like < eq => (like, Condition::Like),
        (Some(eq), _) => (eq, Condition::Eq),
        (None, Some(like)) => (like, Condition::Like),
        (None, None) => return Err(format!("expected field=value or field~value, got '{raw}'")),
    };

    let field = raw[..split].trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }

    Ok(FilterArg {
        field: field.to_string(),
        value: raw[split + 1..].to_string(),
        condition,
    })
}

/// Build search criteria from parsed `--filter` arguments.
pub fn criteria_from_filters(filters: &[FilterArg]) -> SearchCriteria {
    filters
        .iter()
        .fold(SearchCriteria::new(), |criteria, f| {
            criteria.filter(f.field.clone(), f.value.clone(), f.condition)
        })
}
