//! CSS selector functions over markup
//!
//! Uses the scraper crate. Every function takes the elements of the
//! current markup and returns one entry per match, in document order.

use scraper::{ElementRef, Selector};

use crate::context::Markup;
use crate::error::EvalError;

/// Every element matching `selector` at or beneath the current elements
pub fn select_css(markup: &Markup, selector_str: &str) -> Result<Markup, EvalError> {
    let selector = Selector::parse(selector_str)
        .map_err(|_| EvalError::InvalidSelector(selector_str.to_string()))?;
    Ok(markup.select(&selector))
}

/// Trimmed text content of each element
pub fn texts(markup: &Markup) -> Vec<String> {
    markup
        .elements()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .collect()
}

/// Inner HTML of each element
pub fn inner_html(markup: &Markup) -> Vec<String> {
    markup.elements().map(|el| el.inner_html()).collect()
}

/// Attribute value of each element, skipping elements without it
pub fn attrs(markup: &Markup, attr_name: &str) -> Vec<String> {
    markup
        .elements()
        .filter_map(|el| el.value().attr(attr_name).map(String::from))
        .collect()
}

/// Absolute http(s) URLs of the links at or beneath the current elements
pub fn links(markup: &Markup, base_url: &str) -> Vec<String> {
    // Relative links need a base; without one only absolute links survive
    let base = url::Url::parse(base_url).ok();
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    markup
        .select(&selector)
        .elements()
        .filter_map(|anchor| anchor_url(anchor, base.as_ref()))
        .collect()
}

fn anchor_url(anchor: ElementRef<'_>, base: Option<&url::Url>) -> Option<String> {
    let href = anchor.value().attr("href")?.trim();

    // Skip empty, javascript:, mailto:, tel:, and anchor links
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let absolute = match base {
        Some(base) => base.join(href).ok()?,
        None => url::Url::parse(href).ok()?,
    };

    // Only include http/https URLs
    if absolute.scheme() == "http" || absolute.scheme() == "https" {
        Some(absolute.to_string())
    } else {
        None
    }
}
