//! Trait definition for pluggable search providers.
//!
//! Every external search backend is reached through [`SearchProvider`]. The
//! orchestrator owns timeouts: implementations need not cancel internally,
//! they are raced against the orchestrator's clock and late answers are
//! discarded.

use async_trait::async_trait;

use crate::error::SearchError;
use crate::types::{HealthReport, SearchRequest, SearchResponse};

/// A pluggable search backend.
///
/// Implementors turn a [`SearchRequest`] into a [`SearchResponse`]. A
/// response may carry its own partial `errors`; the orchestrator merges
/// them. Returning `Err` means the whole call failed.
///
/// All implementations must be `Send + Sync` so they can be shared across
/// concurrently running provider tasks.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Stable provider name, used for routing hints, error codes and health.
    fn name(&self) -> &str;

    /// Perform a search.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the provider could not be reached or its
    /// answer could not be understood.
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError>;

    /// Lightweight liveness probe.
    ///
    /// Providers without a dedicated probe report healthy.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the probe itself failed.
    async fn health(&self) -> Result<HealthReport, SearchError> {
        Ok(HealthReport::healthy())
    }
}
