//! Output module for run summaries and catalog statistics
//!
//! This module handles:
//! - Printing the summary of a finished run
//! - Recording catalog statistics from the database

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};

use crate::crawler::{CategoryStatus, HarvestSummary, ProductSummary, WalkSummary};

/// Prints the summary of a category walk
pub fn print_walk_summary(walk: &WalkSummary) {
    println!("Category walk:");
    println!("  Top-level categories: {}", walk.main_categories);
    println!("  Sub-categories: {}", walk.sub_categories);
    println!("  Pages read: {}", walk.parents_read);
    if walk.parents_failed > 0 {
        println!("  Pages failed: {}", walk.parents_failed);
    }
    println!();
}

/// Prints the summary of a pagination pass
pub fn print_product_summary(products: &ProductSummary) {
    println!("Pagination:");
    println!("  Categories crawled: {}", products.categories.len());
    println!("  New products: {}", products.products_added());

    let abandoned: Vec<_> = products
        .categories
        .iter()
        .filter_map(|report| match report.status {
            CategoryStatus::Abandoned { at_page } => Some((report.category_id, at_page)),
            CategoryStatus::Exhausted => None,
        })
        .collect();

    if !abandoned.is_empty() {
        println!("  Abandoned ({}):", abandoned.len());
        for (category_id, at_page) in abandoned {
            println!("    - category {} at page {}", category_id, at_page);
        }
    }
    println!();
}

/// Prints the summary of a full run
pub fn print_harvest_summary(summary: &HarvestSummary) {
    println!("=== Run Summary ===\n");
    if let Some(walk) = &summary.walk {
        print_walk_summary(walk);
    }
    print_product_summary(&summary.products);
}
