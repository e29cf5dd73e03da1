//! ScrapingAnt adapter

use crate::provider::{markup_response, ProviderAdapter, ProviderKind, ProviderResponse};
use async_trait::async_trait;
use reqwest::Client;

/// ScrapingAnt general endpoint, returning the raw page source
pub struct ScrapingAntAdapter {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ScrapingAntAdapter {
    pub fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl ProviderAdapter for ScrapingAntAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ScrapingAnt
    }

    async fn fetch(&self, target: &str) -> ProviderResponse {
        tracing::debug!(provider = "scrapingant", url = %target, "Fetching page");

        let result = self
            .client
            .get(format!("{}/v2/general", self.base_url))
            .query(&[
                ("url", target),
                ("x-api-key", self.api_key.as_str()),
                ("proxy_country", "US"),
                ("return_page_source", "true"),
            ])
            .send()
            .await;

        markup_response(result).await
    }
}
