//! HasData adapter

use crate::provider::{describe_error, ProviderAdapter, ProviderKind, ProviderResponse, ProviderSignal};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// HasData web scraping endpoint (datacenter proxies, no JS rendering)
pub struct HasDataAdapter {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HasDataAdapter {
    pub fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn payload(target: &str) -> Value {
        json!({
            "url": target,
            "proxyType": "datacenter",
            "proxyCountry": "US",
            "blockResources": true,
            "blockAds": false,
            "blockUrls": [],
            "jsScenario": [],
            "screenshot": false,
            "jsRendering": false,
            "extractEmails": false,
            "includeOnlyTags": [],
            "excludeTags": [],
            "outputFormat": ["html"],
        })
    }
}

/// Pulls the page out of a `{"content": "..."}` envelope, or keeps the body as is
fn unwrap_content(body: String) -> String {
    match serde_json::from_str::<Value>(&body) {
        Ok(Value::Object(map)) => match map.get("content") {
            Some(Value::String(content)) => content.clone(),
            _ => body,
        },
        _ => body,
    }
}

#[async_trait]
impl ProviderAdapter for HasDataAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::HasData
    }

    async fn fetch(&self, target: &str) -> ProviderResponse {
        tracing::debug!(provider = "hasdata", url = %target, "Fetching page");

        let response = match self
            .client
            .post(format!("{}/scrape/web", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&Self::payload(target))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return ProviderResponse::transport(describe_error(&e)),
        };

        let status = response.status().as_u16();
        let markup = match response.text().await {
            Ok(body) => unwrap_content(body),
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read HasData response body");
                String::new()
            }
        };

        ProviderResponse {
            markup,
            signal: ProviderSignal::Status(status),
        }
    }
}
