//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output
//! as an alternative to JSON serialization.

use crate::{Attribute, AttributeSet, Category, Order, Product};

/// Trait for human-readable key-value output.
///
/// Implemented by entity types to provide formatted output
/// suitable for terminal display when `--json` is not specified.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl PrettyPrint for Product {
    fn pretty_print(&self) -> String {
        let header = format!("Product: {}", self.sku);
        let divider = "─".repeat(header.len().max(30));

        let mut lines = vec![header, divider];

        if let Some(ref name) = self.name {
            lines.push(format!("Name:           {}", name));
        }
        if let Some(id) = self.id {
            lines.push(format!("ID:             {}", id));
        }
        if let Some(ref type_id) = self.type_id {
            lines.push(format!("Type:           {}", type_id));
        }
        if let Some(price) = self.price {
            lines.push(format!("Price:          {:.2}", price));
        }
        if let Some(status) = self.status {
            let label = if status == 1 { "enabled" } else { "disabled" };
            lines.push(format!("Status:         {}", label));
        }
        if let Some(stock) = self.stock_item() {
            lines.push(format!(
                "Stock:          {} ({})",
                stock.qty.unwrap_or_default(),
                if stock.is_in_stock { "in stock" } else { "out of stock" }
            ));
        }
        if let Some(ref updated) = self.updated_at {
            lines.push(format!("Updated:        {}", updated.format(TIME_FORMAT)));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Order {
    fn pretty_print(&self) -> String {
        let header = format!(
            "Order #{}",
            self.increment_id.as_deref().unwrap_or("(unknown)")
        );
        let divider = "─".repeat(header.len().max(30));

        let mut lines = vec![header, divider];

        if let Some(id) = self.entity_id {
            lines.push(format!("Entity ID:      {}", id));
        }
        if let (Some(state), Some(status)) = (&self.state, &self.status) {
            lines.push(format!("Status:         {} ({})", status, state));
        }
        if let Some(ref email) = self.customer_email {
            lines.push(format!("Customer:       {}", email));
        }
        if let Some(total) = self.grand_total {
            lines.push(format!(
                "Grand Total:    {:.2} {}",
                total,
                self.order_currency_code.as_deref().unwrap_or_default()
            ));
        }
        if !self.items.is_empty() {
            lines.push(format!("Items:          {}", self.items.len()));
            for item in &self.items {
                lines.push(format!(
                    "  - {} x{}",
                    item.sku,
                    item.qty_ordered.unwrap_or_default()
                ));
            }
        }
        if let Some(ref created) = self.created_at {
            lines.push(format!("Created:        {}", created.format(TIME_FORMAT)));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Category {
    fn pretty_print(&self) -> String {
        let header = format!("Category: {}", self.name);
        let divider = "─".repeat(header.len().max(30));

        let mut lines = vec![header, divider];

        if let Some(id) = self.id {
            lines.push(format!("ID:             {}", id));
        }
        if let Some(parent) = self.parent_id {
            lines.push(format!("Parent:         {}", parent));
        }
        if let Some(ref path) = self.path {
            lines.push(format!("Path:           {}", path));
        }
        if let Some(active) = self.is_active {
            lines.push(format!("Active:         {}", if active { "yes" } else { "no" }));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Attribute {
    fn pretty_print(&self) -> String {
        let header = format!("Attribute: {}", self.attribute_code);
        let divider = "─".repeat(header.len().max(30));

        let mut lines = vec![header, divider];

        if let Some(ref label) = self.default_frontend_label {
            lines.push(format!("Label:          {}", label));
        }
        if let Some(ref input) = self.frontend_input {
            lines.push(format!("Input:          {}", input));
        }

        // Magento lists an empty placeholder option first
        let options: Vec<_> = self
            .options
            .iter()
            .filter(|o| !o.value.is_empty())
            .collect();
        if !options.is_empty() {
            lines.push(format!("Options:        {}", options.len()));
            for option in options {
                lines.push(format!("  - {} = {}", option.value, option.label));
            }
        }

        lines.join("\n")
    }
}

impl PrettyPrint for AttributeSet {
    fn pretty_print(&self) -> String {
        let header = format!("Attribute Set: {}", self.attribute_set_name);
        let divider = "─".repeat(header.len().max(30));

        let mut lines = vec![header, divider];

        if let Some(id) = self.attribute_set_id {
            lines.push(format!("ID:             {}", id));
        }
        if let Some(entity_type) = self.entity_type_id {
            lines.push(format!("Entity Type:    {}", entity_type));
        }

        lines.join("\n")
    }
}
