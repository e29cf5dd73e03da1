/// Fetch state definitions for tracking a single URL
///
/// This module defines all states a URL can be in while its price is fetched.
use std::fmt;

/// Represents the current state of a price fetch
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FetchState {
    // ===== Active States =====
    /// Attempts remain and no price has been found yet
    Pending,

    // ===== Terminal Success States =====
    /// A price was extracted
    Success(f64),

    // ===== Terminal Error States =====
    /// The URL names a supported platform but no usable product identifier
    UrlError,

    /// The URL belongs to no supported platform
    UnsupportedPlatform,

    /// Every attempt ran without finding a price
    Exhausted,

    /// Every provider has been disabled for this run
    NoProviders,

    /// The fetch task died before reporting
    Aborted,
}

impl FetchState {
    /// Returns true if this is a terminal state (no further attempts)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::UrlError
                | Self::UnsupportedPlatform
                | Self::Exhausted
                | Self::NoProviders
                | Self::Aborted
        )
    }

    /// The price, for successful fetches
    pub fn price(&self) -> Option<f64> {
        match self {
            Self::Success(price) => Some(*price),
            _ => None,
        }
    }

    /// Stable, price-independent name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success(_) => "success",
            Self::UrlError => "url_error",
            Self::UnsupportedPlatform => "unsupported_platform",
            Self::Exhausted => "exhausted",
            Self::NoProviders => "no_providers",
            Self::Aborted => "aborted",
        }
    }

    /// Returns the names of all terminal states, in report order
    pub fn terminal_names() -> [&'static str; 6] {
        [
            "success",
            "exhausted",
            "url_error",
            "unsupported_platform",
            "no_providers",
            "aborted",
        ]
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(price) => write!(f, "success ({})", price),
            other => f.write_str(other.as_str()),
        }
    }
}
