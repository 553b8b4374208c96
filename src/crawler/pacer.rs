//! Politeness delays between requests
//!
//! The crawler never runs requests in parallel; the only pacing it needs is a
//! pause after each category page during the tree walk and a randomized pause
//! between listing pages.

use crate::config::CrawlerConfig;
use crate::ConfigError;
use std::time::Duration;

/// Produces the pauses inserted between fetches
#[derive(Debug, Clone)]
pub struct Pacer {
    page_delay_min_ms: u64,
    page_delay_max_ms: u64,
    category_delay: Duration,
}

impl Pacer {
    /// Creates a pacer from the crawler configuration
    ///
    /// # Errors
    ///
    /// A reversed page delay range is rejected, with the same message as
    /// config validation.
    pub fn new(config: &CrawlerConfig) -> Result<Self, ConfigError> {
        if config.page_delay_min_ms > config.page_delay_max_ms {
            return Err(ConfigError::Validation(format!(
                "page-delay-min-ms ({}) must not exceed page-delay-max-ms ({})",
                config.page_delay_min_ms, config.page_delay_max_ms
            )));
        }

        Ok(Self {
            page_delay_min_ms: config.page_delay_min_ms,
            page_delay_max_ms: config.page_delay_max_ms,
            category_delay: Duration::from_millis(config.category_delay_ms),
        })
    }

    /// Picks a random delay in `[page-delay-min-ms, page-delay-max-ms]`
    pub fn next_page_delay(&self) -> Duration {
        Duration::from_millis(fastrand::u64(
            self.page_delay_min_ms..=self.page_delay_max_ms,
        ))
    }

    /// Fixed delay after a category page
    pub fn category_delay(&self) -> Duration {
        self.category_delay
    }

    /// Sleeps between two listing pages
    pub async fn after_page(&self) {
        let delay = self.next_page_delay();
        tracing::trace!("Sleeping {:?} before next listing page", delay);
        tokio::time::sleep(delay).await;
    }

    /// Sleeps after reading a category page
    pub async fn after_category(&self) {
        tokio::time::sleep(self.category_delay).await;
    }
}
