use serde::Deserialize;

/// Main configuration structure for tiki-harvest
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// working configuration aimed at tiki.vn.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub selectors: SelectorConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Home page of the shop; top-level categories are read from here and
    /// relative links are resolved against it
    #[serde(rename = "base-url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://tiki.vn".to_string(),
        }
    }
}

/// Crawler pacing and failure tolerance
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Lower bound of the random pause between listing pages (milliseconds)
    #[serde(rename = "page-delay-min-ms")]
    pub page_delay_min_ms: u64,

    /// Upper bound of the random pause between listing pages (milliseconds)
    #[serde(rename = "page-delay-max-ms")]
    pub page_delay_max_ms: u64,

    /// Fixed pause after each category page during the tree walk (milliseconds)
    #[serde(rename = "category-delay-ms")]
    pub category_delay_ms: u64,

    /// Pause before the single retry of a failed fetch (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Pages per category that may be skipped after a failed retry
    #[serde(rename = "max-skipped-pages")]
    pub max_skipped_pages: u32,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_delay_min_ms: 1000,
            page_delay_max_ms: 5000,
            category_delay_ms: 3000,
            retry_delay_ms: 5000,
            max_skipped_pages: 20,
            request_timeout_secs: 30,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version` or `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "tiki.db".to_string(),
        }
    }
}

/// CSS selectors describing the shop's markup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Top-level category links on the home page
    #[serde(rename = "main-category-link")]
    pub main_category_link: String,

    /// Name element inside a top-level category link
    #[serde(rename = "main-category-name")]
    pub main_category_name: String,

    /// Child category entries on a category page (each wraps an `<a>`)
    #[serde(rename = "sub-category")]
    pub sub_category: String,

    /// One product card on a listing page
    #[serde(rename = "product-item")]
    pub product_item: String,

    /// Product link inside a card
    #[serde(rename = "product-link")]
    pub product_link: String,

    pub image: String,

    #[serde(rename = "original-price")]
    pub original_price: String,

    pub discount: String,

    /// Rating bar; its `style` carries `width: NN%`
    pub rating: String,

    pub reviews: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            main_category_link: "a.MenuItem__MenuLink-sc-181aa19-1.fKvTQu".to_string(),
            main_category_name: "span.text".to_string(),
            sub_category: "div.list-group-item.is-child".to_string(),
            product_item: "div.product-item".to_string(),
            product_link: "a[href]".to_string(),
            image: "img".to_string(),
            original_price: ".price-discount__original".to_string(),
            discount: ".price-discount__percent".to_string(),
            rating: ".rating__average".to_string(),
            reviews: ".review".to_string(),
        }
    }
}
