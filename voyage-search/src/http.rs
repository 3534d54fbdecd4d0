//! Shared HTTP client for provider adapters.
//!
//! One [`reqwest::Client`] is built per configuration and cloned into each
//! HTTP-backed provider so they share a connection pool.

use crate::error::SearchError;
use std::time::Duration;

/// User-Agent sent when the caller does not supply one.
pub const DEFAULT_USER_AGENT: &str = concat!("voyage-search/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] for provider calls.
///
/// The client has:
/// - A per-request timeout (the orchestrator races its own timeout on top)
/// - The given User-Agent, or [`DEFAULT_USER_AGENT`]
/// - Gzip decompression
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(
    timeout: Duration,
    user_agent: Option<&str>,
) -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// Map a transport-level [`reqwest::Error`] to a [`SearchError`].
pub(crate) fn map_transport_error(err: reqwest::Error) -> SearchError {
    if err.is_timeout() {
        SearchError::Timeout(err.to_string())
    } else if err.is_decode() {
        SearchError::Parse(err.to_string())
    } else {
        SearchError::Http(err.to_string())
    }
}
