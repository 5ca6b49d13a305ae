//! Loader for the e-commerce order tables.
//!
//! Reads the six CSV exports and joins them into one row per order item
//! payment, with product categories translated to English:
//! - orders ⋈ customers on `customer_id` (inner)
//! - order items ⟕ orders on `order_id` (left)
//! - ⋈ products on `product_id` (inner)
//! - ⋈ payments on `order_id` (inner)

use std::path::{Path, PathBuf};

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Category column in the products and translation tables.
const CATEGORY_COLUMN: &str = "product_category_name";
/// English category column in the translation table.
const CATEGORY_ENGLISH_COLUMN: &str = "product_category_name_english";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// File names of the source tables, relative to the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableFiles {
    pub customers: String,
    pub products: String,
    pub category_translation: String,
    pub orders: String,
    pub order_items: String,
    pub order_payments: String,
}

impl Default for TableFiles {
    fn default() -> Self {
        Self {
            customers: "olist_customers_dataset.csv".to_string(),
            products: "olist_products_dataset.csv".to_string(),
            category_translation: "product_category_name_translation.csv".to_string(),
            orders: "olist_orders_dataset.csv".to_string(),
            order_items: "olist_order_items_dataset.csv".to_string(),
            order_payments: "olist_order_payments_dataset.csv".to_string(),
        }
    }
}

/// CSV loader for the order tables.
pub struct OrderTablesLoader {
    data_dir: PathBuf,
    tables: TableFiles,
}

impl OrderTablesLoader {
    /// Create a loader pointing to the directory holding the CSV exports.
    pub fn new(data_dir: impl Into<PathBuf>, tables: TableFiles) -> Self {
        Self {
            data_dir: data_dir.into(),
            tables,
        }
    }

    fn table_path(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }

    /// Scan one CSV table lazily.
    pub fn scan_table(&self, file_name: &str) -> Result<LazyFrame, LoaderError> {
        let path = self.table_path(file_name);
        if !Path::new(&path).exists() {
            return Err(LoaderError::FileNotFound(path.display().to_string()));
        }
        debug!("Scanning {}", path.display());
        let lf = LazyCsvReader::new(&path).with_has_header(true).finish()?;
        Ok(lf)
    }

    /// Products with their category replaced by the English name.
    ///
    /// Categories without a translation become null.
    pub fn translated_products(&self) -> Result<LazyFrame, LoaderError> {
        let products = self.scan_table(&self.tables.products)?;
        let translation = self.scan_table(&self.tables.category_translation)?;

        let translated = products
            .join(
                translation,
                [col(CATEGORY_COLUMN)],
                [col(CATEGORY_COLUMN)],
                JoinArgs::new(JoinType::Left),
            )
            .with_column(col(CATEGORY_ENGLISH_COLUMN).alias(CATEGORY_COLUMN));

        Ok(translated)
    }

    /// Join all tables into the per-payment transaction table.
    pub fn load_transactions(&self) -> Result<LazyFrame, LoaderError> {
        let customers = self.scan_table(&self.tables.customers)?;
        let orders = self.scan_table(&self.tables.orders)?;
        let order_items = self.scan_table(&self.tables.order_items)?;
        let payments = self.scan_table(&self.tables.order_payments)?;
        let products = self.translated_products()?;

        let sales_orders = orders.join(
            customers,
            [col("customer_id")],
            [col("customer_id")],
            JoinArgs::new(JoinType::Inner),
        );

        let joined = order_items
            .join(
                sales_orders,
                [col("order_id")],
                [col("order_id")],
                JoinArgs::new(JoinType::Left),
            )
            .join(
                products,
                [col("product_id")],
                [col("product_id")],
                JoinArgs::new(JoinType::Inner),
            )
            .join(
                payments,
                [col("order_id")],
                [col("order_id")],
                JoinArgs::new(JoinType::Inner),
            );

        Ok(joined)
    }

    /// Collect the joined transaction table.
    pub fn load_transactions_dataframe(&self) -> Result<DataFrame, LoaderError> {
        Ok(self.load_transactions()?.collect()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_files() {
        let tables = TableFiles::default();
        assert_eq!(tables.orders, "olist_orders_dataset.csv");
        assert_eq!(tables.category_translation, "product_category_name_translation.csv");
    }

    #[test]
    fn test_table_path() {
        let loader = OrderTablesLoader::new("data/olist", TableFiles::default());
        let path = loader.table_path("orders.csv");
        assert_eq!(path, PathBuf::from("data/olist/orders.csv"));
    }

    #[test]
    fn test_missing_table() {
        let loader = OrderTablesLoader::new("does/not/exist", TableFiles::default());
        match loader.scan_table("orders.csv") {
            Err(LoaderError::FileNotFound(path)) => assert!(path.ends_with("orders.csv")),
            other => panic!("expected FileNotFound, got {:?}", other.map(|_| ())),
        }
    }
}
