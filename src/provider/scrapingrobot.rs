//! ScrapingRobot adapter
//!
//! Unwraps the JSON envelope and reports the envelope's error message when
//! the request did not succeed.

use crate::provider::{describe_error, ProviderAdapter, ProviderKind, ProviderResponse, ProviderSignal};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// ScrapingRobot API, which wraps the page in a JSON envelope
pub struct ScrapingRobotAdapter {
    client: Client,
    base_url: String,
    api_key: String,
}

/// `{"result": "<html>..."}` on success, `{"error": "..."}` on failure
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ScrapingRobotAdapter {
    pub fn new(client: Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

#[async_trait]
impl ProviderAdapter for ScrapingRobotAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ScrapingRobot
    }

    async fn fetch(&self, target: &str) -> ProviderResponse {
        tracing::debug!(provider = "scrapingrobot", url = %target, "Fetching page");

        let response = match self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[("token", self.api_key.as_str()), ("url", target)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return ProviderResponse::transport(describe_error(&e)),
        };

        let status = response.status().as_u16();
        match response.json::<Envelope>().await {
            Ok(Envelope {
                result: Some(markup),
                ..
            }) => ProviderResponse {
                markup,
                signal: ProviderSignal::Status(status),
            },
            Ok(Envelope {
                error: Some(message),
                ..
            }) => ProviderResponse {
                markup: String::new(),
                signal: ProviderSignal::Message(message),
            },
            Ok(_) => ProviderResponse {
                markup: String::new(),
                signal: ProviderSignal::Status(status),
            },
            Err(e) => ProviderResponse::transport(format!("Invalid response envelope: {}", e)),
        }
    }
}
