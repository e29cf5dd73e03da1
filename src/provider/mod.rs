//! Scraping providers
//!
//! This module contains everything needed to turn a product URL into page
//! markup through a third-party scraping backend:
//! - One adapter per backend, each a single HTTP call
//! - The fatal-error classifier that disables misbehaving providers
//! - The page source tying rotation, adapters and classification together

mod classifier;
mod direct;
mod hasdata;
mod page_source;
mod scrapingant;
mod scrapingrobot;
mod webscrapingai;

pub use classifier::{FatalErrorClassifier, FatalRule};
pub use direct::DirectAdapter;
pub use hasdata::HasDataAdapter;
pub use page_source::{Page, PageSource};
pub use scrapingant::ScrapingAntAdapter;
pub use scrapingrobot::ScrapingRobotAdapter;
pub use webscrapingai::WebScrapingAiAdapter;

use crate::config::ProviderEntry;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Position of a provider in the configured rotation
pub type ProviderId = usize;

/// The scraping backends Price-Watch can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    ScrapingAnt,
    ScrapingRobot,
    HasData,
    WebScrapingAi,
    /// Plain GET against the retailer with a browser User-Agent
    Direct,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScrapingAnt => "scrapingant",
            Self::ScrapingRobot => "scrapingrobot",
            Self::HasData => "hasdata",
            Self::WebScrapingAi => "webscrapingai",
            Self::Direct => "direct",
        }
    }

    /// Quota a provider starts the run with
    pub fn default_initial_quota(&self) -> u32 {
        match self {
            Self::ScrapingAnt | Self::ScrapingRobot => 10,
            Self::HasData | Self::WebScrapingAi => 5,
            Self::Direct => 3,
        }
    }

    /// Quota a healthy provider is refilled to once every quota is spent
    pub fn default_reset_quota(&self) -> u32 {
        match self {
            Self::ScrapingAnt | Self::ScrapingRobot => 15,
            Self::HasData => 3,
            Self::WebScrapingAi => 4,
            Self::Direct => 3,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::ScrapingAnt => "https://api.scrapingant.com",
            Self::ScrapingRobot => "https://api.scrapingrobot.com",
            Self::HasData => "https://api.hasdata.com",
            Self::WebScrapingAi => "https://api.webscraping.ai",
            Self::Direct => "",
        }
    }

    /// HTTP statuses after which the provider is unusable for the run
    pub fn default_fatal_statuses(&self) -> &'static [u16] {
        match self {
            Self::ScrapingAnt => &[400, 403, 500],
            Self::HasData => &[401, 403, 500],
            Self::WebScrapingAi => &[400, 402, 403],
            Self::ScrapingRobot | Self::Direct => &[],
        }
    }

    /// Embedded error messages after which the provider is unusable for the run
    pub fn default_fatal_messages(&self) -> &'static [&'static str] {
        match self {
            Self::ScrapingRobot => &[
                "Token query parameter not found",
                "Invalid client token",
                "You do not have enough credits",
                "Request-body is not a valid JSON",
                "Internal server error",
            ],
            _ => &[],
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a provider call reported besides the markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSignal {
    /// HTTP status of the provider response
    Status(u16),
    /// Error message embedded in a provider's JSON envelope
    Message(String),
    /// The call never produced a response (timeout, connection failure, bad body)
    Transport(String),
}

/// Result of a single provider call
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Page markup; empty when the provider returned nothing usable
    pub markup: String,
    pub signal: ProviderSignal,
}

impl ProviderResponse {
    pub fn transport(error: impl fmt::Display) -> Self {
        Self {
            markup: String::new(),
            signal: ProviderSignal::Transport(error.to_string()),
        }
    }
}

/// One scraping backend
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Fetches the rendered markup of `target`
    ///
    /// Failures are reported through the returned signal, never as an error:
    /// the caller decides whether the provider is still usable.
    async fn fetch(&self, target: &str) -> ProviderResponse;
}

/// Builds the HTTP client shared by all providers
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("price-watch/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Instantiates the adapter for a configured provider entry
pub fn build_adapter(entry: &ProviderEntry, client: Client) -> Box<dyn ProviderAdapter> {
    let base_url = entry.base_url().trim_end_matches('/').to_string();
    let api_key = entry.api_key().to_string();

    match entry.kind {
        ProviderKind::ScrapingAnt => Box::new(ScrapingAntAdapter::new(client, base_url, api_key)),
        ProviderKind::ScrapingRobot => {
            Box::new(ScrapingRobotAdapter::new(client, base_url, api_key))
        }
        ProviderKind::HasData => Box::new(HasDataAdapter::new(client, base_url, api_key)),
        ProviderKind::WebScrapingAi => {
            Box::new(WebScrapingAiAdapter::new(client, base_url, api_key))
        }
        ProviderKind::Direct => Box::new(DirectAdapter::new(client)),
    }
}

/// Turns a plain markup response into a `ProviderResponse`
async fn markup_response(result: Result<reqwest::Response, reqwest::Error>) -> ProviderResponse {
    let response = match result {
        Ok(response) => response,
        Err(e) => return ProviderResponse::transport(describe_error(&e)),
    };

    let status = response.status().as_u16();
    match response.text().await {
        Ok(markup) => ProviderResponse {
            markup,
            signal: ProviderSignal::Status(status),
        },
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read provider response body");
            ProviderResponse {
                markup: String::new(),
                signal: ProviderSignal::Status(status),
            }
        }
    }
}

fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else {
        error.to_string()
    }
}
