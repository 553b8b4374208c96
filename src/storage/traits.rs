//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{
    CategoryProductCount, CategoryRecord, NewCategory, NewProduct, ProductRecord,
};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Category not found: {0}")]
    CategoryNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every write is committed on its own; nothing spans several statements.
pub trait Storage {
    // ===== Category Tree =====

    /// Inserts a category and returns its new ID
    ///
    /// No upsert: inserting the same URL twice produces two rows.
    fn insert_category(&mut self, category: &NewCategory) -> StorageResult<i64>;

    /// Gets a category by ID
    fn get_category(&self, id: i64) -> StorageResult<CategoryRecord>;

    /// Gets all categories at a tree level, in ID order
    fn get_categories_by_level(&self, level: u32) -> StorageResult<Vec<CategoryRecord>>;

    /// Gets the direct children of a category, in ID order
    fn get_children(&self, parent_id: i64) -> StorageResult<Vec<CategoryRecord>>;

    /// Records how many direct children a category has
    fn update_total_sub_category(&mut self, id: i64, total: u32) -> StorageResult<()>;

    // ===== Crawl Progress =====

    /// Finds leaf categories whose pagination should run
    ///
    /// Returns the most recently crawled leaf (highest ID with progress set)
    /// first, followed by every leaf that was never crawled, in ID order.
    fn find_unresumed(&self) -> StorageResult<Vec<CategoryRecord>>;

    /// Stores the resume point of a category
    ///
    /// # Arguments
    ///
    /// * `id` - The category ID
    /// * `total_pages` - Last page processed
    /// * `total_products` - Running product total for the category
    fn update_progress(&mut self, id: i64, total_pages: u32, total_products: u32)
        -> StorageResult<()>;

    // ===== Products =====

    /// Inserts a product and returns its new ID
    fn insert_product(&mut self, product: &NewProduct) -> StorageResult<i64>;

    /// Gets every product link stored for a category
    fn product_links(&self, category_id: i64) -> StorageResult<HashSet<String>>;

    /// Gets all products of a category, in ID order
    fn get_products_for_category(&self, category_id: i64) -> StorageResult<Vec<ProductRecord>>;

    // ===== Statistics =====

    /// Counts all categories
    fn count_categories(&self) -> StorageResult<u64>;

    /// Counts categories per tree level
    fn count_categories_by_level(&self) -> StorageResult<BTreeMap<u32, u64>>;

    /// Counts leaf categories as `(all, with progress)`
    fn count_leaf_categories(&self) -> StorageResult<(u64, u64)>;

    /// Counts all products
    fn count_products(&self) -> StorageResult<u64>;

    /// Gets the categories with the most products
    fn top_categories_by_products(&self, limit: usize)
        -> StorageResult<Vec<CategoryProductCount>>;
}
