//! Direct fetching without a scraping service
//!
//! Requests go straight to the product page with a randomly chosen browser
//! User-Agent.

use crate::provider::{markup_response, ProviderAdapter, ProviderKind, ProviderResponse};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::USER_AGENT;
use reqwest::Client;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
];

/// Fetches the retailer page itself, posing as a desktop browser
pub struct DirectAdapter {
    client: Client,
}

impl DirectAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn pick_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

#[async_trait]
impl ProviderAdapter for DirectAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Direct
    }

    async fn fetch(&self, target: &str) -> ProviderResponse {
        let user_agent = pick_user_agent();
        tracing::debug!(provider = "direct", url = %target, "Fetching page");

        let result = self
            .client
            .get(target)
            .header(USER_AGENT, user_agent)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await;

        markup_response(result).await
    }
}
