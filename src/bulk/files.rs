//! CSV files of `sku,qty` rows.

use std::io::{Read, Write};
use std::path::Path;

use crate::error::Result;

/// Target quantity for one SKU.
#[derive(Debug, Clone, PartialEq)]
pub struct StockUpdate {
    pub sku: String,
    pub qty: f64,
}

/// Load stock updates from a CSV file.
///
/// A leading `sku` header row is optional. Rows with fewer than two
/// fields or a non-numeric quantity are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or is not valid CSV.
pub fn load_stock_updates(path: impl AsRef<Path>) -> Result<Vec<StockUpdate>> {
    let file = std::fs::File::open(path.as_ref())?;
    read_stock_updates(file)
}

/// Parse stock updates from any reader. See [`load_stock_updates`].
///
/// # Errors
///
/// Returns an error if the input is not valid CSV.
pub fn read_stock_updates<R: Read>(reader: R) -> Result<Vec<StockUpdate>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut updates = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = i + 1;

        if i == 0 && record.get(0).is_some_and(|f| f.eq_ignore_ascii_case("sku")) {
            continue;
        }

        let (Some(sku), Some(qty)) = (record.get(0), record.get(1)) else {
            tracing::warn!(row, "skipping invalid row");
            continue;
        };
        let Ok(qty) = qty.parse::<f64>() else {
            tracing::warn!(row, qty, "skipping row with invalid quantity");
            continue;
        };

        updates.push(StockUpdate {
            sku: sku.to_string(),
            qty,
        });
    }

    Ok(updates)
}

/// Write created SKUs with a starting quantity between 10 and 100.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn save_skus(path: impl AsRef<Path>, skus: &[String]) -> Result<()> {
    let file = std::fs::File::create(path.as_ref())?;
    write_skus(file, skus)
}

/// Write `sku,qty` rows to any writer. See [`save_skus`].
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_skus<W: Write>(writer: W, skus: &[String]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["sku", "qty"])?;
    for (i, sku) in skus.iter().enumerate() {
        let qty = 10 + (i * 37) % 91;
        writer.write_record([sku.as_str(), &qty.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_skips_header_and_bad_rows() {
        let input = "SKU,qty\nA,5\nB\nC,lots\nD, 2.5 \n";
        let updates = read_stock_updates(input.as_bytes()).unwrap();
        assert_eq!(
            updates,
            vec![
                StockUpdate { sku: "A".into(), qty: 5.0 },
                StockUpdate { sku: "D".into(), qty: 2.5 },
            ]
        );
    }

    #[test]
    fn test_read_without_header() {
        let updates = read_stock_updates("A,1\n".as_bytes()).unwrap();
        assert_eq!(updates.len(), 1);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock.csv");
        let skus = vec!["bulk-1".to_string(), "bulk-2".to_string()];

        save_skus(&path, &skus).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("sku,qty\n"));

        let updates = load_stock_updates(&path).unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1].sku, "bulk-2");
        assert!(updates.iter().all(|u| (10.0..=100.0).contains(&u.qty)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_stock_updates("/nonexistent/stock.csv").unwrap_err();
        assert!(matches!(err, crate::MagentoError::Io(_)));
    }
}
