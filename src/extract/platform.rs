//! Product URL classification
//!
//! Only two retailers are understood. Amazon URLs additionally carry the
//! ASIN needed by the pricing API, validated here once so that a bad URL is
//! rejected before any provider is spent on it.

use crate::ProductUrlError;
use std::fmt;
use url::Url;

const WAYFAIR_HOST: &str = "www.wayfair.com";
const AMAZON_HOST_PREFIX: &str = "www.amazon.";
const ASIN_LEN: usize = 10;

/// Supported retail platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Wayfair,
    Amazon,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wayfair => "wayfair",
            Self::Amazon => "amazon",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product URL on a supported platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductUrl {
    Wayfair { url: String },
    Amazon { url: String, asin: String },
}

impl ProductUrl {
    /// Classifies a URL string
    ///
    /// # Returns
    ///
    /// * `Ok(ProductUrl)` - A Wayfair page, or an Amazon page with a valid ASIN
    /// * `Err(ProductUrlError::UnsupportedPlatform)` - Any other URL
    /// * `Err(ProductUrlError::MissingAsin | MalformedAsin)` - An Amazon URL
    ///   without a usable `/dp/<ASIN>` segment
    ///
    /// # Example
    ///
    /// ```
    /// use price_watch::extract::ProductUrl;
    ///
    /// let product = ProductUrl::parse("https://www.amazon.com/Desk-Lamp/dp/B08N5WRWNW/ref=sr_1").unwrap();
    /// assert_eq!(product.asin(), Some("B08N5WRWNW"));
    /// ```
    pub fn parse(raw: &str) -> Result<Self, ProductUrlError> {
        let trimmed = raw.trim();
        let unsupported = || ProductUrlError::UnsupportedPlatform(trimmed.to_string());

        let url = Url::parse(trimmed).map_err(|_| unsupported())?;
        if url.scheme() != "https" {
            return Err(unsupported());
        }

        match url.host_str() {
            Some(WAYFAIR_HOST) => Ok(Self::Wayfair {
                url: trimmed.to_string(),
            }),
            Some(host) if host.starts_with(AMAZON_HOST_PREFIX) => {
                let asin = parse_asin(&url, trimmed)?;
                Ok(Self::Amazon {
                    url: trimmed.to_string(),
                    asin,
                })
            }
            _ => Err(unsupported()),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Wayfair { url } | Self::Amazon { url, .. } => url,
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            Self::Wayfair { .. } => Platform::Wayfair,
            Self::Amazon { .. } => Platform::Amazon,
        }
    }

    pub fn asin(&self) -> Option<&str> {
        match self {
            Self::Amazon { asin, .. } => Some(asin),
            Self::Wayfair { .. } => None,
        }
    }
}

/// Finds the path segment after `dp` and checks it is a 10-character ASIN
fn parse_asin(url: &Url, raw: &str) -> Result<String, ProductUrlError> {
    let segments: Vec<&str> = url.path_segments().map(|s| s.collect()).unwrap_or_default();

    let candidate = segments
        .iter()
        .position(|segment| *segment == "dp")
        .and_then(|pos| segments.get(pos + 1))
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| ProductUrlError::MissingAsin(raw.to_string()))?;

    if candidate.len() != ASIN_LEN || !candidate.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ProductUrlError::MalformedAsin {
            url: raw.to_string(),
            asin: candidate.to_string(),
        });
    }

    Ok(candidate.to_string())
}
