//! Product extraction from listing pages
//!
//! A listing page is a list of product cards. Each card carries its
//! identifiers as attributes (`data-title`, `data-price`, ...) and optional
//! badges (discount, rating, review count) as child elements.

use crate::crawler::parser::{element_text, resolve_link, CompiledSelectors};
use crate::storage::ProductDetails;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Outcome of extracting one product card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// A product not yet stored for this category
    New(ProductDetails),
    /// The product link is already stored (or appeared earlier on the page)
    AlreadyKnown,
}

/// Reasons a product card cannot be turned into a product
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("product card has no link")]
    MissingLink,

    #[error("product card is missing {0}")]
    MissingField(&'static str),

    #[error("unparseable price '{0}'")]
    InvalidPrice(String),
}

/// Extracts every product card of a listing page
///
/// The result has one entry per card, in page order. An empty result means
/// the page had no product cards at all, which marks the end of the listing.
///
/// Links are checked against `known_links` and against cards seen earlier on
/// the same page, so a card repeated on one page is inserted only once.
pub fn extract_listing(
    html: &str,
    base_url: &Url,
    known_links: &HashSet<String>,
    selectors: &CompiledSelectors,
) -> Vec<Result<Extraction, ExtractError>> {
    let document = Html::parse_document(html);
    let mut seen_on_page = HashSet::new();

    document
        .select(&selectors.product_item)
        .map(|item| {
            let extraction = extract_product(item, base_url, known_links, selectors)?;
            if let Extraction::New(details) = &extraction {
                if !seen_on_page.insert(details.product_link.clone()) {
                    return Ok(Extraction::AlreadyKnown);
                }
            }
            Ok(extraction)
        })
        .collect()
}

/// Extracts one product card
///
/// Returns [`Extraction::AlreadyKnown`] before reading any other field when the
/// card's link is in `known_links`.
///
/// # Defaults
///
/// | Field | When missing or unparseable |
/// |-------|-----------------------------|
/// | original price | current price |
/// | discount | 0 |
/// | rating | 0 (only the bar's `style` width is read) |
/// | review count | 0 |
/// | ids, brand, image | None |
pub fn extract_product(
    item: ElementRef<'_>,
    base_url: &Url,
    known_links: &HashSet<String>,
    selectors: &CompiledSelectors,
) -> Result<Extraction, ExtractError> {
    let product_link = product_link(item, base_url, selectors).ok_or(ExtractError::MissingLink)?;

    if known_links.contains(&product_link) {
        return Ok(Extraction::AlreadyKnown);
    }

    let attrs = item.value();

    let product_name = attrs
        .attr("data-title")
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(ExtractError::MissingField("data-title"))?
        .to_string();

    let raw_price = attrs
        .attr("data-price")
        .ok_or(ExtractError::MissingField("data-price"))?;
    let current_price =
        parse_digits(raw_price).ok_or_else(|| ExtractError::InvalidPrice(raw_price.to_string()))?;

    let original_price = first_text(item, &selectors.original_price)
        .and_then(|text| parse_digits(&text))
        .unwrap_or(current_price);

    let discount_p = first_text(item, &selectors.discount)
        .and_then(|text| parse_percent(&text))
        .unwrap_or(0);

    let rating_p = item
        .select(&selectors.rating)
        .next()
        .and_then(|rating| rating.value().attr("style"))
        .and_then(parse_percent)
        .unwrap_or(0);

    let number_of_reviews = first_text(item, &selectors.reviews)
        .and_then(|text| parse_digits(&text))
        .and_then(|count| u32::try_from(count).ok())
        .unwrap_or(0);

    let product_image_link = item.select(&selectors.image).next().and_then(|img| {
        img.value()
            .attr("src")
            .or_else(|| img.value().attr("data-src"))
            .and_then(|src| resolve_link(src, base_url))
    });

    Ok(Extraction::New(ProductDetails {
        product_id: non_empty_attr(item, "data-seller-product-id"),
        product_sku: non_empty_attr(item, "product-sku"),
        product_name,
        data_id: non_empty_attr(item, "data-id"),
        current_price,
        product_brand: non_empty_attr(item, "data-brand"),
        product_link,
        product_image_link,
        original_price,
        discount_p,
        rating_p,
        number_of_reviews,
    }))
}

/// The card's own `href`, or the first matching link inside it
fn product_link(
    item: ElementRef<'_>,
    base_url: &Url,
    selectors: &CompiledSelectors,
) -> Option<String> {
    let href = item.value().attr("href").or_else(|| {
        item.select(&selectors.product_link)
            .next()
            .and_then(|a| a.value().attr("href"))
    })?;
    resolve_link(href, base_url)
}

fn first_text(item: ElementRef<'_>, selector: &scraper::Selector) -> Option<String> {
    item.select(selector).next().map(element_text)
}

fn non_empty_attr(item: ElementRef<'_>, name: &str) -> Option<String> {
    item.value()
        .attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Reads an integer by keeping only its digits
///
/// Thousands separators and currency signs are dropped, so `1.290.000 ₫`
/// reads as 1290000.
pub fn parse_digits(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Reads a percentage such as `-23%` or `width: 80.5%`, clamped to 0..=100
///
/// The number read is the one directly before the first `%`, so any prefix
/// (`Giảm`, a Unicode minus, a non-breaking space) is ignored. Without a `%`
/// sign the first number in the text is used.
pub fn parse_percent(text: &str) -> Option<u32> {
    let number: String = match text.split_once('%') {
        // The number closest to the sign, e.g. "width: 80" -> "80"
        Some((head, _)) => {
            let mut tail: Vec<char> = head
                .chars()
                .rev()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            tail.reverse();
            tail.into_iter().collect()
        }
        None => text
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect(),
    };

    let value: f64 = number.trim_matches('.').parse().ok()?;
    Some(value.round().clamp(0.0, 100.0) as u32)
}
