//! WebScraping.AI adapter

use crate::provider::{markup_response, ProviderAdapter, ProviderKind, ProviderResponse};
use async_trait::async_trait;
use reqwest::Client;

/// WebScraping.AI HTML endpoint without JavaScript rendering
pub struct WebScrapingAiAdapter {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WebScrapingAiAdapter {
    pub fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl ProviderAdapter for WebScrapingAiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::WebScrapingAi
    }

    async fn fetch(&self, target: &str) -> ProviderResponse {
        tracing::debug!(provider = "webscrapingai", url = %target, "Fetching page");

        let result = self
            .client
            .get(format!("{}/html", self.base_url))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("url", target),
                ("timeout", "20000"),
                ("js", "false"),
            ])
            .send()
            .await;

        markup_response(result).await
    }
}
