//! Pagination crawl over leaf categories
//!
//! Listing pages of a category are fetched in order from its resume point
//! until a page comes back without product cards. Progress is written after
//! every page that had cards, so an interrupted run resumes on the last page
//! it finished.

use crate::crawler::coordinator::Harvester;
use crate::crawler::extractor::{extract_listing, Extraction};
use crate::crawler::fetcher::FetchResult;
use crate::crawler::parser::page_url;
use crate::storage::{CategoryRecord, NewProduct, Storage};
use crate::Result;
use std::collections::HashSet;
use url::Url;

/// Outcome of one listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page had product cards
    Items {
        /// Cards on the page
        found: usize,
        /// Cards stored as new products
        inserted: u32,
    },

    /// The page was fetched and had no product cards: end of the listing
    Exhausted,

    /// The page could not be fetched, even after the retry
    Failed { error: String },
}

/// How the crawl of a category ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryStatus {
    /// An empty listing page was reached
    Exhausted,
    /// Too many pages were skipped; the crawl stopped on `at_page`
    Abandoned { at_page: u32 },
}

/// Result of crawling one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub category_id: i64,
    /// Page the crawl started on
    pub first_page: u32,
    /// Last page with product cards, as stored in `total_pages`
    pub last_page: Option<u32>,
    pub pages_processed: u32,
    pub products_added: u32,
    pub skipped_pages: u32,
    pub status: CategoryStatus,
}

/// Result of a pagination pass over all pending categories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductSummary {
    pub categories: Vec<CategoryReport>,
}

impl ProductSummary {
    /// New products stored across all categories
    pub fn products_added(&self) -> u64 {
        self.categories
            .iter()
            .map(|report| u64::from(report.products_added))
            .sum()
    }

    /// Categories that stopped on the skipped-page limit
    pub fn abandoned(&self) -> usize {
        self.categories
            .iter()
            .filter(|report| matches!(report.status, CategoryStatus::Abandoned { .. }))
            .count()
    }
}

impl<S: Storage> Harvester<S> {
    /// Paginates every leaf category that still needs crawling
    ///
    /// Categories come from [`Storage::find_unresumed`]. A category that
    /// fails with an error is logged and the pass moves on to the next one.
    pub async fn crawl_products(&mut self) -> Result<ProductSummary> {
        let pending = self.storage.find_unresumed()?;
        tracing::info!("{} categories to paginate", pending.len());

        let mut summary = ProductSummary::default();
        for category in &pending {
            match self.crawl_category(category).await {
                Ok(report) => summary.categories.push(report),
                Err(e) => tracing::error!(
                    "Failed to crawl category {} ({}): {}",
                    category.id,
                    category.url,
                    e
                ),
            }
        }

        tracing::info!(
            "Pagination finished: {} categories, {} new products, {} abandoned",
            summary.categories.len(),
            summary.products_added(),
            summary.abandoned()
        );
        Ok(summary)
    }

    /// Paginates one category from its resume point
    ///
    /// # Loop
    ///
    /// | Page outcome | Action |
    /// |--------------|--------|
    /// | Items | Store new products, write progress, next page |
    /// | Exhausted | Stop |
    /// | Failed | Skip page, next page; abandon once the skip limit is exceeded |
    ///
    /// A category never crawled before that is exhausted on its first page
    /// gets progress `(0, 0)` so it is not picked up again.
    pub async fn crawl_category(&mut self, category: &CategoryRecord) -> Result<CategoryReport> {
        let mut known = self.storage.product_links(category.id)?;
        let mut page = category.resume_page();
        let mut total_products = category.total_products.unwrap_or(0);

        let mut report = CategoryReport {
            category_id: category.id,
            first_page: page,
            last_page: category.total_pages,
            pages_processed: 0,
            products_added: 0,
            skipped_pages: 0,
            status: CategoryStatus::Exhausted,
        };

        tracing::info!(
            "Crawling category {} ({}) from page {}",
            category.id,
            category.name,
            page
        );

        loop {
            let url = page_url(&category.url, page)?;
            let outcome = self.process_page(category.id, page, &url, &mut known).await;
            self.pacer.after_page().await;

            match outcome {
                PageOutcome::Items { found, inserted } => {
                    total_products = total_products.saturating_add(inserted);
                    report.pages_processed += 1;
                    report.products_added += inserted;
                    report.last_page = Some(page);

                    tracing::info!(
                        "Category {} page {}: {} items, {} new",
                        category.id,
                        page,
                        found,
                        inserted
                    );

                    if let Err(e) = self
                        .storage
                        .update_progress(category.id, page, total_products)
                    {
                        tracing::error!(
                            "Failed to record progress of category {} at page {}: {}",
                            category.id,
                            page,
                            e
                        );
                    }
                }

                PageOutcome::Exhausted => {
                    tracing::info!(
                        "Category {} exhausted at page {} ({} products)",
                        category.id,
                        page,
                        total_products
                    );

                    let never_crawled = category.total_pages.is_none()
                        && report.pages_processed == 0
                        && report.skipped_pages == 0;
                    if never_crawled {
                        if let Err(e) = self.storage.update_progress(category.id, 0, 0) {
                            tracing::error!(
                                "Failed to mark empty category {} as crawled: {}",
                                category.id,
                                e
                            );
                        }
                        report.last_page = Some(0);
                    }
                    break;
                }

                PageOutcome::Failed { error } => {
                    report.skipped_pages += 1;

                    if report.skipped_pages > self.max_skipped_pages {
                        tracing::warn!(
                            "Abandoning category {} at page {} after {} skipped pages",
                            category.id,
                            page,
                            report.skipped_pages
                        );
                        report.status = CategoryStatus::Abandoned { at_page: page };
                        break;
                    }

                    tracing::warn!(
                        "Skipping page {} of category {}: {}",
                        page,
                        category.id,
                        error
                    );
                }
            }

            page += 1;
        }

        Ok(report)
    }

    /// Fetches one listing page and stores its new products
    ///
    /// Links stored here are added to `known` so later pages of the same
    /// category see them.
    async fn process_page(
        &mut self,
        category_id: i64,
        page: u32,
        url: &str,
        known: &mut HashSet<String>,
    ) -> PageOutcome {
        let (body, final_url) = match self.fetcher.fetch_with_retry(url).await {
            FetchResult::Success {
                body, final_url, ..
            } => (body, final_url),
            failure => {
                return PageOutcome::Failed {
                    error: failure.to_string(),
                }
            }
        };

        let base = Url::parse(&final_url).unwrap_or_else(|_| self.base_url.clone());
        let results = extract_listing(&body, &base, known, &self.selectors);
        if results.is_empty() {
            return PageOutcome::Exhausted;
        }

        let found = results.len();
        let mut inserted = 0;

        for result in results {
            match result {
                Ok(Extraction::New(details)) => {
                    let link = details.product_link.clone();
                    let product = NewProduct {
                        category_id,
                        page,
                        details,
                    };
                    match self.storage.insert_product(&product) {
                        Ok(_) => {
                            known.insert(link);
                            inserted += 1;
                        }
                        Err(e) => tracing::error!("Failed to store product {}: {}", link, e),
                    }
                }
                Ok(Extraction::AlreadyKnown) => {}
                Err(e) => tracing::warn!("Skipping product card on {}: {}", url, e),
            }
        }

        PageOutcome::Items { found, inserted }
    }
}
