//! Error types for the voyage-search crate.
//!
//! [`SearchError`] describes why a single provider call (or a configuration
//! step) failed. The orchestrator never propagates it to callers: failures are
//! folded into [`crate::types::ResponseError`] entries on the response.

/// Errors that can occur while talking to a search provider.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// An HTTP request to a provider failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A provider call or health probe exceeded its time budget.
    #[error("timed out: {0}")]
    Timeout(String),

    /// Failed to decode a provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The provider asked us to back off.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The provider reported itself as unavailable.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

impl SearchError {
    /// Whether retrying the same call later could plausibly succeed.
    ///
    /// Only configuration errors are permanent.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

/// Convenience type alias for voyage-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
