//! # voyage-search
//!
//! Multi-provider search orchestration for voyage.
//!
//! A caller hands the [`SearchOrchestrator`] one [`SearchRequest`]; the
//! orchestrator picks providers by query content, calls them under the
//! configured [`ExecutionStrategy`], and returns a single merged
//! [`SearchResponse`]. Provider failures never surface as `Err`: they are
//! attached to the response next to whatever partial results came back.
//!
//! ## Design
//!
//! - Providers implement [`SearchProvider`] and are registered with a
//!   [`Specialty`] (primary, secondary, cruise, neural)
//! - Routing prefers a cruise specialist, then a neural one, then the
//!   primary and secondary general-web providers
//! - Every provider call runs in its own task raced against a timeout
//! - Results are deduplicated by normalised URL and ranked by relevance,
//!   recency or source diversity
//! - A [`HealthMonitor`] samples providers off the request path
//!
//! ## Security
//!
//! - Query text is logged only at trace level
//! - API keys are read by the caller and passed in; nothing is persisted

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod orchestrator;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod types;

pub use config::{ExecutionStrategy, RankingMode, SearchConfig};
pub use error::{Result, SearchError};
pub use health::HealthMonitor;
pub use orchestrator::SearchOrchestrator;
pub use provider::SearchProvider;
pub use providers::HttpProvider;
pub use registry::{ProviderRegistry, RegisteredProvider, Specialty};
pub use types::{
    ErrorCode, Freshness, HealthReport, HealthState, ProviderStatus, ResponseError,
    ResponseMetadata, ResultType, SearchOptions, SearchRequest, SearchResponse, SearchResultItem,
    SourceType,
};

/// Run one search over `registry` with `config`.
///
/// Convenience wrapper that builds a throwaway [`SearchOrchestrator`].
///
/// # Errors
///
/// Returns [`SearchError::Config`] if `config` fails validation. Provider
/// failures are reported inside the returned response.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> voyage_search::Result<()> {
/// use std::sync::Arc;
/// use voyage_search::{ProviderRegistry, SearchConfig, SearchRequest};
///
/// let registry = Arc::new(ProviderRegistry::new());
/// let response = voyage_search::search(
///     registry,
///     SearchConfig::default(),
///     &SearchRequest::new("alaska cruise in june"),
/// )
/// .await?;
/// for item in &response.results {
///     println!("{}: {}", item.title, item.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(
    registry: std::sync::Arc<ProviderRegistry>,
    config: SearchConfig,
    request: &SearchRequest,
) -> Result<SearchResponse> {
    let orchestrator = SearchOrchestrator::new(registry, config)?;
    Ok(orchestrator.search(request).await)
}
