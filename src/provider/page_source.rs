//! Page fetching through the provider rotation
//!
//! Each call selects a provider, asks its adapter for the page, and feeds
//! the outcome back: fatal responses disable the provider for the run.

use crate::config::ProviderEntry;
use crate::provider::{
    build_adapter, FatalErrorClassifier, ProviderAdapter, ProviderId, ProviderKind,
    ProviderSignal,
};
use crate::rotation::{Rotation, RotationError};
use reqwest::Client;

/// Markup fetched through the rotation, tagged with the provider that served it
#[derive(Debug, Clone)]
pub struct Page {
    pub provider: ProviderId,
    pub kind: ProviderKind,
    pub markup: String,
}

/// Fetches pages through whichever provider the rotation picks next
pub struct PageSource {
    adapters: Vec<Box<dyn ProviderAdapter>>,
    rotation: Rotation,
    classifier: FatalErrorClassifier,
}

impl PageSource {
    /// Assembles a page source from already-built parts
    ///
    /// `adapters`, the rotation slots and the classifier rules are all indexed
    /// by provider id and must have the same length.
    pub fn new(
        adapters: Vec<Box<dyn ProviderAdapter>>,
        rotation: Rotation,
        classifier: FatalErrorClassifier,
    ) -> Self {
        Self {
            adapters,
            rotation,
            classifier,
        }
    }

    /// Builds adapters, rotation and classifier from the configured providers
    pub fn from_entries(entries: &[ProviderEntry], client: Client) -> Self {
        let adapters = entries
            .iter()
            .map(|entry| build_adapter(entry, client.clone()))
            .collect();

        Self::new(
            adapters,
            Rotation::from_entries(entries),
            FatalErrorClassifier::from_entries(entries),
        )
    }

    pub fn rotation(&self) -> &Rotation {
        &self.rotation
    }

    /// Selects a provider, fetches `target` through it and classifies the outcome
    pub async fn fetch(&self, target: &str) -> Result<Page, RotationError> {
        let id = self.rotation.select()?;
        let adapter = self
            .adapters
            .get(id)
            .ok_or(RotationError::NoProviders)?;
        let kind = adapter.kind();

        let response = adapter.fetch(target).await;

        match &response.signal {
            ProviderSignal::Transport(error) => {
                tracing::warn!(provider = %kind, url = %target, error = %error, "Provider call failed");
            }
            signal => {
                if self.classifier.is_fatal(id, signal) && self.rotation.mark_fatal(id) {
                    tracing::warn!(
                        provider = %kind,
                        id,
                        signal = ?signal,
                        "Fatal provider response, disabling provider for this run"
                    );
                }
            }
        }

        Ok(Page {
            provider: id,
            kind,
            markup: response.markup,
        })
    }
}
