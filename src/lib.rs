//! Price-Watch: a spreadsheet-driven price monitor
//!
//! This crate reads product URLs from a workbook, fetches the current price of
//! each product through a rotating pool of scraping providers, and appends
//! timestamped results to a log sheet.

pub mod config;
pub mod extract;
pub mod fetch;
pub mod job;
pub mod provider;
pub mod rotation;
pub mod workbook;

use thiserror::Error;

/// Main error type for Price-Watch operations
#[derive(Debug, Error)]
pub enum PriceWatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Workbook error: {0}")]
    Workbook(#[from] workbook::WorkbookError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Product URL error: {0}")]
    ProductUrl(#[from] ProductUrlError),

    #[error("Provider rotation error: {0}")]
    Rotation(#[from] rotation::RotationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Environment variable '{0}' referenced by config is not set")]
    MissingSecret(String),
}

/// Errors produced while interpreting a product URL
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductUrlError {
    #[error("Platform not supported: {0}")]
    UnsupportedPlatform(String),

    #[error("No /dp/ product identifier in {0}")]
    MissingAsin(String),

    #[error("Malformed product identifier '{asin}' in {url}")]
    MalformedAsin { url: String, asin: String },
}

impl ProductUrlError {
    /// Unsupported platforms are a terminal "no price", not a URL error
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedPlatform(_))
    }
}

/// Result type alias for Price-Watch operations
pub type Result<T> = std::result::Result<T, PriceWatchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{Platform, ProductUrl};
pub use fetch::{fetch_with_retry, FetchReport, FetchState, RetryPolicy};
pub use job::{JobReport, JobRunner, LogRow};
pub use rotation::{Rotation, RotationState};
