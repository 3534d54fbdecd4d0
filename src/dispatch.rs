//! Rate-limited dispatch of queries to the search orchestrator.
//!
//! Queries are sent in small batches. Within a batch every query runs
//! concurrently (and each fans out to its providers); between batches the
//! dispatcher pauses so upstream providers are not flooded.

use std::time::Duration;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use voyage_search::{SearchOrchestrator, SearchResponse};

use crate::distribution::Assignment;
use crate::error::{Result, VoyageError};
use crate::query::Query;

/// Batch shape for [`dispatch_queries`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Queries in flight at once.
    pub batch_size: usize,
    /// Pause between consecutive batches.
    pub batch_pause_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            batch_pause_ms: 250,
        }
    }
}

impl DispatchConfig {
    /// # Errors
    ///
    /// Returns [`VoyageError::Config`] if `batch_size` is 0.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(VoyageError::Config(
                "batch_size must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }
}

/// One query and the orchestrator's answer to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOutcome {
    pub query: Query,
    pub response: SearchResponse,
}

/// Search every query, `batch_size` at a time.
///
/// Outcomes come back in input order. A `batch_size` of 0 is treated as 1.
pub async fn dispatch_queries(
    orchestrator: &SearchOrchestrator,
    queries: &[Query],
    config: &DispatchConfig,
) -> Vec<QueryOutcome> {
    let batch_size = config.batch_size.max(1);
    let batches = queries.len().div_ceil(batch_size);
    let mut outcomes = Vec::with_capacity(queries.len());

    for (n, batch) in queries.chunks(batch_size).enumerate() {
        if n > 0 && config.batch_pause_ms > 0 {
            tokio::time::sleep(config.batch_pause()).await;
        }
        tracing::debug!(batch = n + 1, of = batches, size = batch.len(), "dispatching batch");

        let responses = join_all(batch.iter().map(|query| {
            let request = query.to_search_request();
            async move { orchestrator.search(&request).await }
        }))
        .await;

        outcomes.extend(
            batch
                .iter()
                .cloned()
                .zip(responses)
                .map(|(query, response)| QueryOutcome { query, response }),
        );
    }

    let failed = outcomes.iter().filter(|o| !o.response.is_success()).count();
    tracing::info!(queries = outcomes.len(), batches, failed, "dispatch finished");
    outcomes
}

/// [`dispatch_queries`] over one assignment's queue.
pub async fn dispatch_assignment(
    orchestrator: &SearchOrchestrator,
    assignment: &Assignment,
    config: &DispatchConfig,
) -> Vec<QueryOutcome> {
    tracing::debug!(
        worker_class = %assignment.worker_class,
        queries = assignment.len(),
        "dispatching assignment"
    );
    dispatch_queries(orchestrator, &assignment.queries, config).await
}
