//! Core search orchestrator: route, fan out, merge, dedup, rank.
//!
//! Picks providers for a request by content, runs them under the configured
//! execution strategy with a per-call timeout, then deduplicates, ranks and
//! truncates the merged results. It never fails: every problem ends up in
//! the response's `errors` list.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::config::{RankingMode, SearchConfig};
use crate::error::SearchError;
use crate::registry::ProviderRegistry;
use crate::types::{ResponseError, ResponseMetadata, SearchRequest, SearchResponse, SearchResultItem};

use super::dedup::deduplicate;
use super::execution::execute;
use super::ranking::rank;
use super::selection::{prefer_healthy, select_providers};

/// Multi-provider search front door.
///
/// Cheap to share: the registry sits behind an `Arc` and the orchestrator
/// holds no per-call state.
#[derive(Debug, Clone)]
pub struct SearchOrchestrator {
    registry: Arc<ProviderRegistry>,
    config: SearchConfig,
}

impl SearchOrchestrator {
    /// Create an orchestrator over `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` fails validation.
    pub fn new(registry: Arc<ProviderRegistry>, config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self { registry, config })
    }

    /// The provider registry this orchestrator routes over.
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Active configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run one orchestrated search.
    ///
    /// # Pipeline
    ///
    /// 1. Select providers by content (hint, cruise, neural, general web)
    /// 2. Optionally skip providers marked unhealthy, never down to zero
    /// 3. Bail out with `NO_PROVIDERS_AVAILABLE` if nothing was selected
    /// 4. Execute under the configured strategy, each call raced against the timeout
    /// 5. Deduplicate by normalised URL (when enabled)
    /// 6. Rank by the configured mode and truncate to `max_results`
    pub async fn search(&self, request: &SearchRequest) -> SearchResponse {
        let started = Instant::now();
        tracing::trace!(query = %request.query_text, "orchestrating search");

        let selection = select_providers(request, &self.registry);
        let route = selection.route;
        let providers = if self.config.skip_unhealthy {
            prefer_healthy(selection.providers, &self.registry)
        } else {
            selection.providers
        };

        if providers.is_empty() {
            tracing::warn!(%route, "no search providers available");
            let mut response = self.response_for(request, started);
            response.errors.push(ResponseError::no_providers(&request.query_text));
            return response;
        }

        let outcome = execute(
            self.config.strategy,
            &providers,
            request,
            self.config.provider_timeout(),
        )
        .await;

        let (results, total_results) = post_process(
            outcome.results,
            self.config.deduplicate,
            self.config.ranking,
            request.options.max_results,
        );

        let mut response = self.response_for(request, started);
        response.results = results;
        response.errors = outcome.errors;
        response.metadata.total_results = total_results;
        response.metadata.providers = outcome.called;

        tracing::info!(
            %route,
            strategy = %self.config.strategy,
            results = response.results.len(),
            errors = response.errors.len(),
            elapsed_ms = response.metadata.search_time_ms,
            "search completed"
        );
        response
    }

    fn response_for(&self, request: &SearchRequest, started: Instant) -> SearchResponse {
        SearchResponse {
            query: request.query_text.clone(),
            source_id: self.config.orchestrator_id.clone(),
            results: Vec::new(),
            metadata: ResponseMetadata {
                total_results: 0,
                search_time_ms: started.elapsed().as_millis() as u64,
                timestamp: Utc::now(),
                providers: Vec::new(),
                strategy: Some(self.config.strategy.name().to_owned()),
            },
            errors: Vec::new(),
        }
    }
}

/// Dedup (optionally), rank and truncate.
///
/// Returns the final list and the number of distinct results available
/// before truncation.
pub fn post_process(
    results: Vec<SearchResultItem>,
    deduplicate_urls: bool,
    mode: RankingMode,
    max_results: usize,
) -> (Vec<SearchResultItem>, usize) {
    let distinct = if deduplicate_urls {
        deduplicate(results)
    } else {
        results
    };
    let total = distinct.len();
    (rank(distinct, mode, max_results), total)
}
