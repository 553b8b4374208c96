//! Category tree walk
//!
//! Top-level categories come from the home page menu. Every category page is
//! then read once to find its direct children, breadth first, until no new
//! children turn up. A category read with zero children is a leaf.

use crate::crawler::coordinator::Harvester;
use crate::crawler::fetcher::FetchResult;
use crate::crawler::parser::{parse_main_categories, parse_sub_categories};
use crate::storage::{CategoryRecord, NewCategory, Storage};
use crate::{CrawlError, Result};
use std::collections::VecDeque;
use url::Url;

/// Counters for one tree walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Top-level categories found on the home page
    pub main_categories: usize,
    /// Categories inserted below the top level
    pub sub_categories: usize,
    /// Category pages read successfully
    pub parents_read: usize,
    /// Category pages that failed twice and were skipped
    pub parents_failed: usize,
}

impl<S: Storage> Harvester<S> {
    /// Discovers and walks the whole category tree
    pub async fn crawl_categories(&mut self) -> Result<WalkSummary> {
        let roots = self.discover_main_categories().await?;
        let main_categories = roots.len();

        let mut summary = self.walk_categories(roots).await;
        summary.main_categories = main_categories;

        tracing::info!(
            "Category walk finished: {} top-level, {} below, {} pages failed",
            summary.main_categories,
            summary.sub_categories,
            summary.parents_failed
        );
        Ok(summary)
    }

    /// Reads the home page menu and stores each entry as a level 1 category
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Fetch`] when the home page cannot be fetched
    /// after the retry. A category that cannot be stored is logged and left
    /// out of the result.
    pub async fn discover_main_categories(&mut self) -> Result<Vec<CategoryRecord>> {
        let home = self.base_url.to_string();
        tracing::info!("Reading top-level categories from {}", home);

        let (body, page_url) = match self.fetcher.fetch_with_retry(&home).await {
            FetchResult::Success {
                body, final_url, ..
            } => (body, final_url),
            failure => {
                return Err(CrawlError::Fetch {
                    url: home,
                    reason: failure.to_string(),
                })
            }
        };
        self.pacer.after_category().await;

        let base = Url::parse(&page_url).unwrap_or_else(|_| self.base_url.clone());
        let links = parse_main_categories(&body, &base, &self.selectors);
        if links.is_empty() {
            tracing::warn!("No top-level categories found on {}", home);
        }

        let mut roots = Vec::with_capacity(links.len());
        for link in links {
            match self
                .storage
                .insert_category(&NewCategory::root(link.name.as_str(), link.url.as_str()))
                .and_then(|id| self.storage.get_category(id))
            {
                Ok(record) => roots.push(record),
                Err(e) => tracing::error!("Failed to store category {}: {}", link.url, e),
            }
        }

        Ok(roots)
    }

    /// Walks the tree below `parents`, breadth first
    ///
    /// For every category taken off the queue its page is fetched, each child
    /// found is inserted one level deeper, the parent's `total_sub_category`
    /// is set to the number of children found and the children are queued.
    ///
    /// A parent whose page cannot be fetched after the retry is skipped and
    /// keeps `total_sub_category = NULL`, so it is never taken for a leaf.
    pub async fn walk_categories(&mut self, parents: Vec<CategoryRecord>) -> WalkSummary {
        let mut queue: VecDeque<CategoryRecord> = parents.into();
        let mut summary = WalkSummary::default();

        while let Some(parent) = queue.pop_front() {
            tracing::debug!("Reading sub-categories of {} ({})", parent.name, parent.url);

            match self.fetcher.fetch_with_retry(&parent.url).await {
                FetchResult::Success {
                    body, final_url, ..
                } => {
                    summary.parents_read += 1;
                    let children = self.store_children(&parent, &body, &final_url);
                    summary.sub_categories += children.len();
                    queue.extend(children);
                }
                failure => {
                    summary.parents_failed += 1;
                    tracing::warn!(
                        "Skipping category {} ({}): {}",
                        parent.id,
                        parent.url,
                        failure
                    );
                }
            }

            self.pacer.after_category().await;
        }

        summary
    }

    /// Inserts the children found on a parent's page and records their count
    fn store_children(
        &mut self,
        parent: &CategoryRecord,
        body: &str,
        page_url: &str,
    ) -> Vec<CategoryRecord> {
        let base = Url::parse(page_url).unwrap_or_else(|_| self.base_url.clone());
        let links = parse_sub_categories(body, &base, &self.selectors);

        let mut children = Vec::with_capacity(links.len());
        for link in &links {
            let child = NewCategory::child_of(parent, link.name.as_str(), link.url.as_str());
            match self
                .storage
                .insert_category(&child)
                .and_then(|id| self.storage.get_category(id))
            {
                Ok(record) => children.push(record),
                Err(e) => tracing::error!("Failed to store category {}: {}", link.url, e),
            }
        }

        let total = u32::try_from(links.len()).unwrap_or(u32::MAX);
        if let Err(e) = self.storage.update_total_sub_category(parent.id, total) {
            tracing::error!(
                "Failed to record sub-category count of category {}: {}",
                parent.id,
                e
            );
        }

        if total == 0 {
            tracing::debug!("Category {} is a leaf", parent.id);
        }

        children
    }
}
