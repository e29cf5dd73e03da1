//! Platform price extraction
//!
//! This module turns a classified product URL into a price:
//! - Wayfair pages are scraped through the provider rotation
//! - Amazon prices come from the pricing API, falling back to scraping the
//!   product page when the API fails or is not configured

mod markup;
mod platform;
mod pricing;

pub use markup::{extract_amazon_price, extract_wayfair_price};
pub use platform::{Platform, ProductUrl};
pub use pricing::{PricingClient, PricingError, DEFAULT_PRICING_ENDPOINT};

use crate::provider::{PageSource, ProviderId};
use crate::rotation::{Rotation, RotationError};
use async_trait::async_trait;

/// Outcome of one extraction attempt
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Parsed price, `None` when nothing usable was found
    pub price: Option<f64>,
    /// Provider that served the markup, if a page was scraped
    pub provider: Option<ProviderId>,
}

impl Extraction {
    pub fn new(price: Option<f64>, provider: Option<ProviderId>) -> Self {
        Self {
            price: price.filter(|p| *p > 0.0),
            provider,
        }
    }
}

/// Anything that can attempt to price a product once
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Makes a single attempt; retrying is the caller's business
    async fn extract(&self, product: &ProductUrl) -> Result<Extraction, RotationError>;
}

/// The production price source: pricing API and scraping providers
pub struct PlatformExtractor {
    pages: PageSource,
    pricing: Option<PricingClient>,
}

impl PlatformExtractor {
    pub fn new(pages: PageSource, pricing: Option<PricingClient>) -> Self {
        Self { pages, pricing }
    }

    pub fn rotation(&self) -> &Rotation {
        self.pages.rotation()
    }

    async fn scrape(
        &self,
        url: &str,
        parse: fn(&str) -> Option<f64>,
    ) -> Result<Extraction, RotationError> {
        let page = self.pages.fetch(url).await?;
        let price = parse(&page.markup);

        tracing::debug!(
            url = %url,
            provider = %page.kind,
            found = price.is_some(),
            "Scraped product page"
        );

        Ok(Extraction::new(price, Some(page.provider)))
    }
}

#[async_trait]
impl PriceSource for PlatformExtractor {
    async fn extract(&self, product: &ProductUrl) -> Result<Extraction, RotationError> {
        match product {
            ProductUrl::Wayfair { url } => self.scrape(url, extract_wayfair_price).await,
            ProductUrl::Amazon { url, asin } => {
                if let Some(pricing) = &self.pricing {
                    match pricing.price(asin).await {
                        Ok(price) => return Ok(Extraction::new(Some(price), None)),
                        Err(e) => {
                            tracing::info!(
                                asin = %asin,
                                error = %e,
                                "Pricing API failed, falling back to page scrape"
                            );
                        }
                    }
                }
                self.scrape(url, extract_amazon_price).await
            }
        }
    }
}
