//! Price extraction from retailer page markup

use scraper::{ElementRef, Html, Selector};

/// Wayfair's price display element
const WAYFAIR_PRICE_SELECTOR: &str = r#"[data-name-id="PriceDisplay"]"#;

/// Amazon's desktop price block
const AMAZON_PRICE_SELECTOR: &str = "#corePriceDisplay_desktop_feature_div";

/// Extracts the price from a Wayfair product page
///
/// The price display holds text such as `$1,299.99`; the leading currency
/// symbol and thousands separators are dropped before parsing.
///
/// # Example
///
/// ```
/// use price_watch::extract::extract_wayfair_price;
///
/// let html = r#"<div data-name-id="PriceDisplay">$123.45</div>"#;
/// assert_eq!(extract_wayfair_price(html), Some(123.45));
/// ```
pub fn extract_wayfair_price(markup: &str) -> Option<f64> {
    let text = select_text(markup, WAYFAIR_PRICE_SELECTOR)?;
    parse_amount(strip_currency(&text))
}

/// Extracts the price from an Amazon product page
///
/// The price block repeats the price several times (screen-reader copy,
/// split whole/fraction spans, per-unit prices). Only the first amount is
/// kept: the first whitespace-separated token, without its currency symbol,
/// cut at the next `$`.
pub fn extract_amazon_price(markup: &str) -> Option<f64> {
    let text = select_text(markup, AMAZON_PRICE_SELECTOR)?;
    let first_token = text.split_whitespace().next()?;
    let amount = strip_currency(first_token).split('$').next()?;
    parse_amount(amount)
}

/// Flattened text of the first element matching `selector`
fn select_text(markup: &str, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let document = Html::parse_document(markup);
    let element = document.select(&selector).next()?;
    Some(flatten_text(element))
}

/// Joins the element's text nodes, each trimmed, with no separator
fn flatten_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Drops a single leading currency symbol
fn strip_currency(text: &str) -> &str {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if !c.is_ascii_digit() => chars.as_str(),
        _ => text,
    }
}

fn parse_amount(text: &str) -> Option<f64> {
    let cleaned = text.trim().replace(',', "");
    cleaned.parse::<f64>().ok().filter(|p| p.is_finite())
}
