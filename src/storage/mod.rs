//! Storage module for persisting the catalog
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Category tree persistence
//! - Per-category crawl progress (resume points)
//! - Product rows and per-category dedup lookups

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::CrawlError;

use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, CrawlError> {
    SqliteStorage::new(path)
}

/// A category row as stored in the database
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
    pub url: String,
    /// Depth from the root, top-level categories are 1
    pub level: u32,
    /// Number of direct children; `None` until the node's page was read
    pub total_sub_category: Option<u32>,
    pub parent_id: Option<i64>,
    /// Last listing page processed; `None` until pagination starts
    pub total_pages: Option<u32>,
    pub total_products: Option<u32>,
    pub create_at: String,
}

impl CategoryRecord {
    /// A leaf has been read and has no children
    pub fn is_leaf(&self) -> bool {
        self.total_sub_category == Some(0)
    }

    /// First page to fetch when (re)starting pagination
    ///
    /// The stored page is fetched again; rows already present are skipped by
    /// the dedup check, so re-reading it is harmless.
    pub fn resume_page(&self) -> u32 {
        match self.total_pages {
            None | Some(0) => 1,
            Some(page) => page,
        }
    }
}

/// A category about to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub url: String,
    pub level: u32,
    pub parent_id: Option<i64>,
}

impl NewCategory {
    /// Builds a top-level category
    pub fn root(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            level: 1,
            parent_id: None,
        }
    }

    /// Builds a direct child of `parent`
    pub fn child_of(
        parent: &CategoryRecord,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            level: parent.level + 1,
            parent_id: Some(parent.id),
        }
    }
}

/// Fields read from one product card on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetails {
    pub product_id: Option<String>,
    pub product_sku: Option<String>,
    pub product_name: String,
    pub data_id: Option<String>,
    pub current_price: i64,
    pub product_brand: Option<String>,
    pub product_link: String,
    pub product_image_link: Option<String>,
    pub original_price: i64,
    pub discount_p: u32,
    pub rating_p: u32,
    pub number_of_reviews: u32,
}

/// A product about to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub category_id: i64,
    /// Listing page the product was found on
    pub page: u32,
    pub details: ProductDetails,
}

/// A product row as stored in the database
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub id: i64,
    pub category_id: i64,
    pub page: u32,
    pub details: ProductDetails,
    pub create_at: String,
}

/// Product count for one category, used in statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryProductCount {
    pub category_id: i64,
    pub name: String,
    pub products: u64,
}
