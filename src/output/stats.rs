//! Statistics generation from the catalog database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::storage::{CategoryProductCount, Storage};
use crate::CrawlError;
use std::collections::BTreeMap;

/// Number of categories listed in the "top categories" section
const TOP_CATEGORIES: usize = 10;

/// Catalog statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestStatistics {
    /// Total number of categories stored
    pub total_categories: u64,

    /// Count of categories per tree level
    pub categories_by_level: BTreeMap<u32, u64>,

    /// Categories read with zero children
    pub leaf_categories: u64,

    /// Leaves with a resume point
    pub crawled_leaves: u64,

    /// Leaves never paginated
    pub pending_leaves: u64,

    /// Total number of products stored
    pub total_products: u64,

    /// Categories with the most products
    pub top_categories: Vec<CategoryProductCount>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(CrawlError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<HarvestStatistics, CrawlError> {
    let total_categories = storage.count_categories()?;
    let categories_by_level = storage.count_categories_by_level()?;
    let (leaf_categories, crawled_leaves) = storage.count_leaf_categories()?;
    let total_products = storage.count_products()?;
    let top_categories = storage.top_categories_by_products(TOP_CATEGORIES)?;

    Ok(HarvestStatistics {
        total_categories,
        categories_by_level,
        leaf_categories,
        crawled_leaves,
        pending_leaves: leaf_categories.saturating_sub(crawled_leaves),
        total_products,
        top_categories,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Categories:");
    println!("  Total categories: {}", stats.total_categories);
    for (level, count) in &stats.categories_by_level {
        println!("  Level {}: {}", level, count);
    }
    println!();

    println!("Leaf Categories:");
    println!("  Leaves: {}", stats.leaf_categories);
    println!("  Crawled: {}", stats.crawled_leaves);
    println!("  Pending: {}", stats.pending_leaves);
    println!();

    println!("Products:");
    println!("  Total products: {}", stats.total_products);
    println!();

    if !stats.top_categories.is_empty() {
        println!("Top Categories ({}):", stats.top_categories.len());
        for entry in &stats.top_categories {
            println!("  {:>8}  {} (#{})", entry.products, entry.name, entry.category_id);
        }
        println!();
    }

    let progress = if stats.leaf_categories > 0 {
        (stats.crawled_leaves as f64 / stats.leaf_categories as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Progress: {:.1}% ({} / {} leaf categories crawled)",
        progress, stats.crawled_leaves, stats.leaf_categories
    );
}
