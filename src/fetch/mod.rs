//! Fetch-with-retry for a single product URL
//!
//! The URL is classified once up front. Unsupported platforms and malformed
//! product identifiers end the fetch before any provider is used. Otherwise
//! each attempt asks the price source for a price; a miss is charged to the
//! provider that served the page and the next attempt follows after a fixed
//! delay.
//!
//! | Outcome of an attempt | Transition |
//! |-----------------------|------------|
//! | price found | `Success(price)` |
//! | no price, attempts left | charge provider, sleep, retry |
//! | no price, budget spent | `Exhausted` |
//! | every provider disabled | `NoProviders` |

mod state;

pub use state::FetchState;

use crate::config::JobConfig;
use crate::extract::{PriceSource, ProductUrl};
use crate::rotation::Rotation;
use std::time::Duration;

/// Attempt budget and spacing for one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    /// Pause between consecutive attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    pub fn from_config(job: &JobConfig) -> Self {
        Self::new(job.attempts, job.retry_delay())
    }
}

/// Final result of fetching one URL
#[derive(Debug, Clone, PartialEq)]
pub struct FetchReport {
    pub url: String,
    pub state: FetchState,
    /// Attempts consumed; zero when the URL was rejected up front
    pub attempts: u32,
}

impl FetchReport {
    pub fn price(&self) -> Option<f64> {
        self.state.price()
    }
}

/// Fetches the price of `url`, retrying misses within the policy's budget
pub async fn fetch_with_retry(
    source: &dyn PriceSource,
    rotation: &Rotation,
    url: &str,
    policy: &RetryPolicy,
) -> FetchReport {
    let report = |state, attempts| FetchReport {
        url: url.to_string(),
        state,
        attempts,
    };

    let product = match ProductUrl::parse(url) {
        Ok(product) => product,
        Err(e) if e.is_unsupported() => {
            tracing::info!(url = %url, "Platform not supported");
            return report(FetchState::UnsupportedPlatform, 0);
        }
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "URL error");
            return report(FetchState::UrlError, 0);
        }
    };

    let mut state = FetchState::Pending;
    let mut attempts = 0;

    while !state.is_terminal() {
        attempts += 1;

        state = match source.extract(&product).await {
            Ok(extraction) => match extraction.price {
                Some(price) => FetchState::Success(price),
                None => {
                    if let Some(provider) = extraction.provider {
                        rotation.record_miss(provider);
                    }

                    let remaining = policy.attempts.saturating_sub(attempts);
                    tracing::info!(
                        url = %url,
                        platform = %product.platform(),
                        remaining,
                        "Extracting failed"
                    );

                    if remaining == 0 {
                        FetchState::Exhausted
                    } else {
                        tokio::time::sleep(policy.delay).await;
                        FetchState::Pending
                    }
                }
            },
            Err(e) => {
                tracing::error!(url = %url, error = %e, "No provider available");
                FetchState::NoProviders
            }
        };
    }

    report(state, attempts)
}
