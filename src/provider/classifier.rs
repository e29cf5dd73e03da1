//! Fatal-error classification for provider responses
//!
//! Every provider has its own notion of a non-retryable failure: some report
//! it through HTTP status codes, others through an error string inside a JSON
//! envelope. A match disables the provider for the rest of the run.

use crate::config::ProviderEntry;
use crate::provider::{ProviderId, ProviderSignal};

/// Non-retryable statuses and messages of one provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FatalRule {
    pub statuses: Vec<u16>,
    pub messages: Vec<String>,
}

impl FatalRule {
    /// Builds the rule for a configured provider, honoring overrides
    pub fn for_entry(entry: &ProviderEntry) -> Self {
        let statuses = entry
            .fatal_statuses
            .clone()
            .unwrap_or_else(|| entry.kind.default_fatal_statuses().to_vec());

        let messages = entry.fatal_messages.clone().unwrap_or_else(|| {
            entry
                .kind
                .default_fatal_messages()
                .iter()
                .map(|m| m.to_string())
                .collect()
        });

        Self { statuses, messages }
    }

    /// Returns true if the signal is one of this rule's non-retryable outcomes
    ///
    /// Transport failures never match.
    pub fn matches(&self, signal: &ProviderSignal) -> bool {
        match signal {
            ProviderSignal::Status(status) => self.statuses.contains(status),
            ProviderSignal::Message(message) => {
                let message = message.trim();
                self.messages.iter().any(|m| m == message)
            }
            ProviderSignal::Transport(_) => false,
        }
    }
}

/// Decides, per provider, whether a response disables that provider
#[derive(Debug, Clone)]
pub struct FatalErrorClassifier {
    rules: Vec<FatalRule>,
}

impl FatalErrorClassifier {
    pub fn new(rules: Vec<FatalRule>) -> Self {
        Self { rules }
    }

    pub fn from_entries(entries: &[ProviderEntry]) -> Self {
        Self::new(entries.iter().map(FatalRule::for_entry).collect())
    }

    /// Classifies the outcome of a call to provider `id`
    pub fn is_fatal(&self, id: ProviderId, signal: &ProviderSignal) -> bool {
        self.rules
            .get(id)
            .map(|rule| rule.matches(signal))
            .unwrap_or(false)
    }
}
