//! HTML parsing for category pages
//!
//! This module handles:
//! - Compiling the configured CSS selectors once per run
//! - Reading top-level category links from the home page
//! - Reading child category links from a category page
//! - Building listing page URLs

use crate::config::SelectorConfig;
use crate::CrawlError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use url::Url;

/// Selectors compiled from [`SelectorConfig`]
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub main_category_link: Selector,
    pub main_category_name: Selector,
    pub sub_category: Selector,
    pub anchor: Selector,
    pub product_item: Selector,
    pub product_link: Selector,
    pub image: Selector,
    pub original_price: Selector,
    pub discount: Selector,
    pub rating: Selector,
    pub reviews: Selector,
}

impl CompiledSelectors {
    /// Compiles every configured selector
    pub fn new(config: &SelectorConfig) -> Result<Self, CrawlError> {
        Ok(Self {
            main_category_link: compile(&config.main_category_link)?,
            main_category_name: compile(&config.main_category_name)?,
            sub_category: compile(&config.sub_category)?,
            anchor: compile("a[href]")?,
            product_item: compile(&config.product_item)?,
            product_link: compile(&config.product_link)?,
            image: compile(&config.image)?,
            original_price: compile(&config.original_price)?,
            discount: compile(&config.discount)?,
            rating: compile(&config.rating)?,
            reviews: compile(&config.reviews)?,
        })
    }
}

fn compile(selector: &str) -> Result<Selector, CrawlError> {
    Selector::parse(selector).map_err(|e| CrawlError::Selector(format!("'{}': {}", selector, e)))
}

/// A category link read from a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLink {
    pub name: String,
    pub url: String,
}

/// Extracts the top-level categories from the home page
///
/// The name comes from the `main-category-name` element inside the link,
/// falling back to the link text.
pub fn parse_main_categories(
    html: &str,
    base_url: &Url,
    selectors: &CompiledSelectors,
) -> Vec<CategoryLink> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for element in document.select(&selectors.main_category_link) {
        let Some(url) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, base_url))
        else {
            continue;
        };

        let name = element
            .select(&selectors.main_category_name)
            .next()
            .map(element_text)
            .unwrap_or_else(|| element_text(element));

        links.push(CategoryLink {
            name: clean_category_name(&name),
            url,
        });
    }

    links
}

/// Extracts the direct child categories from a category page
///
/// Each `sub-category` element contributes its first link. Elements without a
/// resolvable link are ignored and not counted.
pub fn parse_sub_categories(
    html: &str,
    base_url: &Url,
    selectors: &CompiledSelectors,
) -> Vec<CategoryLink> {
    let document = Html::parse_document(html);

    document
        .select(&selectors.sub_category)
        .filter_map(|entry| {
            let anchor = entry.select(&selectors.anchor).next()?;
            let url = resolve_link(anchor.value().attr("href")?, base_url)?;
            Some(CategoryLink {
                name: clean_category_name(&element_text(anchor)),
                url,
            })
        })
        .collect()
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Strips layout noise from a category name
///
/// Removes runs of two or more whitespace characters, newlines and
/// parenthesised counts such as `(1234)`, then trims.
pub fn clean_category_name(name: &str) -> String {
    static NOISE: OnceLock<Regex> = OnceLock::new();
    let noise = NOISE.get_or_init(|| {
        Regex::new(r"(\s{2,}|\n+|\(\d+\))").expect("category name pattern is valid")
    });

    noise.replace_all(name, "").trim().to_string()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}

/// Builds the URL of one listing page of a category
///
/// Sets the `page` query parameter, replacing an existing one. On a URL that
/// already has a query this is the same as appending `&page=<n>`.
pub fn page_url(category_url: &str, page: u32) -> Result<String, url::ParseError> {
    let mut url = Url::parse(category_url)?;

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair("page", &page.to_string());

    Ok(url.to_string())
}
