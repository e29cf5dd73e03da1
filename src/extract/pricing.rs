//! Client for the structured Amazon pricing API
//!
//! The API is keyed by ASIN and answers with parsed offer data, which avoids
//! scraping the product page when it works. Any failure here is recoverable:
//! the caller falls back to scraping.

use crate::config::PricingConfig;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PRICING_ENDPOINT: &str = "https://realtime.oxylabs.io/v1/queries";

/// Errors from the pricing API
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("Pricing request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Pricing API returned HTTP {0}")]
    Status(u16),

    #[error("No price in pricing response for {0}")]
    MissingPrice(String),
}

/// Authenticated pricing API client
#[derive(Debug, Clone)]
pub struct PricingClient {
    client: Client,
    endpoint: String,
    username: String,
    password: String,
    geo_location: String,
    timeout: Duration,
}

impl PricingClient {
    pub fn new(client: Client, config: &PricingConfig) -> Self {
        Self {
            client,
            endpoint: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_PRICING_ENDPOINT.to_string()),
            username: config.username.clone(),
            password: config.password.clone(),
            geo_location: config.geo_location.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Looks up the current price of `asin`
    pub async fn price(&self, asin: &str) -> Result<f64, PricingError> {
        let payload = json!({
            "source": "amazon_pricing",
            "domain": "com",
            "geo_location": self.geo_location,
            "query": asin,
            "parse": true,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PricingError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        first_price(&body).ok_or_else(|| PricingError::MissingPrice(asin.to_string()))
    }
}

/// Reads `results[0].content.pricing[0].price`, as a number or numeric string
///
/// Zero and negative prices count as no price.
fn first_price(body: &Value) -> Option<f64> {
    let price = &body["results"][0]["content"]["pricing"][0]["price"];
    let price = match price {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    };
    price.filter(|p| *p > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: String) -> PricingConfig {
        PricingConfig {
            username: "user".to_string(),
            password: "pass".to_string(),
            geo_location: "10001".to_string(),
            base_url: Some(endpoint),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_first_price() {
        let body = json!({"results": [{"content": {"pricing": [{"price": 24.99}, {"price": 30.0}]}}]});
        assert_eq!(first_price(&body), Some(24.99));

        let body = json!({"results": [{"content": {"pricing": [{"price": "1,024.50"}]}}]});
        assert_eq!(first_price(&body), Some(1024.5));

        assert_eq!(first_price(&json!({"results": []})), None);
        assert_eq!(first_price(&json!({})), None);
        assert_eq!(
            first_price(&json!({"results": [{"content": {"pricing": [{}]}}]})),
            None
        );
    }

    #[test]
    fn test_first_price_rejects_non_positive() {
        let zero = json!({"results": [{"content": {"pricing": [{"price": 0}]}}]});
        assert_eq!(first_price(&zero), None);

        let negative = json!({"results": [{"content": {"pricing": [{"price": "-3.50"}]}}]});
        assert_eq!(first_price(&negative), None);
    }

    #[tokio::test]
    async fn test_price_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/queries"))
            .and(header_exists("authorization"))
            .and(body_partial_json(json!({
                "source": "amazon_pricing",
                "query": "B08N5WRWNW",
                "geo_location": "10001",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"content": {"pricing": [{"price": 49.5}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = PricingClient::new(Client::new(), &config(format!("{}/v1/queries", server.uri())));
        assert_eq!(client.price("B08N5WRWNW").await.unwrap(), 49.5);
    }

    #[tokio::test]
    async fn test_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = PricingClient::new(Client::new(), &config(server.uri()));
        let result = client.price("B08N5WRWNW").await;

        assert!(matches!(result, Err(PricingError::Status(401))));
    }

    #[tokio::test]
    async fn test_missing_price() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&server)
            .await;

        let client = PricingClient::new(Client::new(), &config(server.uri()));
        let result = client.price("B08N5WRWNW").await;

        assert!(matches!(result, Err(PricingError::MissingPrice(_))));
    }

    #[tokio::test]
    async fn test_zero_price_is_missing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"content": {"pricing": [{"price": 0.0}]}}]
            })))
            .mount(&server)
            .await;

        let client = PricingClient::new(Client::new(), &config(server.uri()));
        let result = client.price("B08N5WRWNW").await;

        assert!(matches!(result, Err(PricingError::MissingPrice(_))));
    }
}
