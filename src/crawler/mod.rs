//! Crawler module for the category walk and the pagination crawl
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a single delayed retry
//! - HTML parsing of category menus and product listings
//! - Politeness delays between requests
//! - The category tree walk and per-category pagination

mod categories;
mod coordinator;
mod extractor;
mod fetcher;
mod pacer;
mod pagination;
mod parser;

pub use categories::WalkSummary;
pub use coordinator::{HarvestSummary, Harvester};
pub use extractor::{
    extract_listing, extract_product, parse_digits, parse_percent, ExtractError, Extraction,
};
pub use fetcher::{build_http_client, fetch_url, FetchResult, PageFetcher};
pub use pacer::Pacer;
pub use pagination::{CategoryReport, CategoryStatus, PageOutcome, ProductSummary};
pub use parser::{
    clean_category_name, page_url, parse_main_categories, parse_sub_categories, resolve_link,
    CategoryLink, CompiledSelectors,
};
