//! Harvester - main crawl orchestration
//!
//! The harvester owns every collaborator of a run (storage, fetcher, compiled
//! selectors, pacer) and drives the two phases:
//! - Walking the category tree (`crawler::categories`)
//! - Paginating leaf categories (`crawler::pagination`)

use crate::config::Config;
use crate::crawler::categories::WalkSummary;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::pacer::Pacer;
use crate::crawler::pagination::ProductSummary;
use crate::crawler::parser::CompiledSelectors;
use crate::storage::Storage;
use crate::Result;
use url::Url;

/// Main crawler structure, generic over the storage backend
pub struct Harvester<S: Storage> {
    pub(crate) storage: S,
    pub(crate) fetcher: PageFetcher,
    pub(crate) selectors: CompiledSelectors,
    pub(crate) pacer: Pacer,
    pub(crate) base_url: Url,
    pub(crate) max_skipped_pages: u32,
}

/// Outcome of a full run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Present when the tree walk ran in this invocation
    pub walk: Option<WalkSummary>,
    pub products: ProductSummary,
}

impl<S: Storage> Harvester<S> {
    /// Creates a harvester from a validated configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `storage` - Opened storage backend
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to run
    /// * `Err(CrawlError)` - Bad base URL, selector, page delay range or HTTP client setup
    pub fn new(config: &Config, storage: S) -> Result<Self> {
        let base_url = Url::parse(&config.site.base_url)?;
        let selectors = CompiledSelectors::new(&config.selectors)?;
        let fetcher = PageFetcher::new(&config.user_agent, &config.crawler)?;
        let pacer = Pacer::new(&config.crawler)?;

        Ok(Self {
            storage,
            fetcher,
            selectors,
            pacer,
            base_url,
            max_skipped_pages: config.crawler.max_skipped_pages,
        })
    }

    /// Borrows the storage backend
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Consumes the harvester, returning the storage backend
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Runs a full crawl
    ///
    /// The category tree is walked only when no category is stored yet; a
    /// database that already holds a tree goes straight to pagination.
    pub async fn run(&mut self) -> Result<HarvestSummary> {
        let start_time = std::time::Instant::now();

        let walk = if self.storage.count_categories()? == 0 {
            tracing::info!("No categories stored, walking the category tree");
            Some(self.crawl_categories().await?)
        } else {
            tracing::info!("Category tree already stored, skipping the tree walk");
            None
        };

        let products = self.crawl_products().await?;

        tracing::info!(
            "Run completed in {:?}: {} categories crawled, {} products added",
            start_time.elapsed(),
            products.categories.len(),
            products.products_added()
        );

        Ok(HarvestSummary { walk, products })
    }
}
