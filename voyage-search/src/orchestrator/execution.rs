//! Provider execution strategies.
//!
//! Every provider call runs as its own Tokio task raced against the
//! configured timeout. A call produces either a response or a
//! [`ResponseError`]; nothing is shared between calls while they run, and
//! merging happens only after the calls have settled.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::config::ExecutionStrategy;
use crate::error::SearchError;
use crate::registry::RegisteredProvider;
use crate::types::{ResponseError, SearchRequest, SearchResponse, SearchResultItem};

/// What came back from running a strategy over a provider list.
#[derive(Debug, Default)]
pub struct ExecutionOutcome {
    /// Raw results in merge order.
    pub results: Vec<SearchResultItem>,
    /// Errors from failed calls and provider-reported partial errors.
    pub errors: Vec<ResponseError>,
    /// Providers that were actually called, in call order.
    pub called: Vec<String>,
}

impl ExecutionOutcome {
    /// Fold one settled call into the outcome; returns how many results it added.
    fn absorb(&mut self, name: &str, settled: Result<SearchResponse, ResponseError>) -> usize {
        match settled {
            Ok(response) => {
                let added = response.results.len();
                tracing::debug!(provider = %name, count = added, "provider returned results");
                self.results.extend(response.results);
                self.errors.extend(response.errors);
                added
            }
            Err(err) => {
                tracing::warn!(provider = %name, code = %err.code, error = %err.message, "provider call failed");
                self.errors.push(err);
                0
            }
        }
    }
}

/// Run `strategy` over `providers`.
///
/// The request's `max_results` only matters for
/// [`ExecutionStrategy::Sequential`], which stops once half of it has been
/// collected.
pub async fn execute(
    strategy: ExecutionStrategy,
    providers: &[RegisteredProvider],
    request: &SearchRequest,
    timeout: Duration,
) -> ExecutionOutcome {
    let request = Arc::new(request.clone());
    match strategy {
        ExecutionStrategy::Parallel => run_parallel(providers, request, timeout).await,
        ExecutionStrategy::Sequential => run_sequential(providers, request, timeout).await,
        ExecutionStrategy::Fallback => run_fallback(providers, request, timeout).await,
    }
}

/// Launch every call at once and wait for all of them to settle.
async fn run_parallel(
    providers: &[RegisteredProvider],
    request: Arc<SearchRequest>,
    timeout: Duration,
) -> ExecutionOutcome {
    let in_flight: Vec<(String, JoinHandle<CallResult>)> = providers
        .iter()
        .map(|p| (p.name.clone(), spawn_call(p, Arc::clone(&request), timeout)))
        .collect();

    let mut outcome = ExecutionOutcome {
        called: in_flight.iter().map(|(name, _)| name.clone()).collect(),
        ..Default::default()
    };

    let settled = futures::future::join_all(in_flight.into_iter().map(
        |(name, handle)| async move {
            let result = settle(&name, handle, timeout).await;
            (name, result)
        },
    ))
    .await;

    for (name, result) in settled {
        outcome.absorb(&name, result);
    }
    outcome
}

/// Call providers in order until half of `max_results` has been collected.
async fn run_sequential(
    providers: &[RegisteredProvider],
    request: Arc<SearchRequest>,
    timeout: Duration,
) -> ExecutionOutcome {
    let max_results = request.options.max_results;
    let mut outcome = ExecutionOutcome::default();

    for provider in providers {
        outcome.called.push(provider.name.clone());
        let handle = spawn_call(provider, Arc::clone(&request), timeout);
        let result = settle(&provider.name, handle, timeout).await;
        outcome.absorb(&provider.name, result);

        if outcome.results.len() * 2 >= max_results {
            tracing::debug!(
                collected = outcome.results.len(),
                max_results,
                "sequential search reached half of max_results"
            );
            break;
        }
    }
    outcome
}

/// Call providers in order and stop at the first non-empty answer.
async fn run_fallback(
    providers: &[RegisteredProvider],
    request: Arc<SearchRequest>,
    timeout: Duration,
) -> ExecutionOutcome {
    let mut outcome = ExecutionOutcome::default();

    for provider in providers {
        outcome.called.push(provider.name.clone());
        let handle = spawn_call(provider, Arc::clone(&request), timeout);
        let result = settle(&provider.name, handle, timeout).await;
        if outcome.absorb(&provider.name, result) > 0 {
            tracing::debug!(provider = %provider.name, "fallback search satisfied");
            break;
        }
    }
    outcome
}

/// `Ok` response, or `Err` carrying either the provider error or `None` on timeout.
type CallResult = Result<SearchResponse, Option<SearchError>>;

/// Spawn one provider call raced against `timeout`.
fn spawn_call(
    provider: &RegisteredProvider,
    request: Arc<SearchRequest>,
    timeout: Duration,
) -> JoinHandle<CallResult> {
    let handle = Arc::clone(&provider.handle);
    tokio::spawn(async move {
        let started = Instant::now();
        let result = match tokio::time::timeout(timeout, handle.search(&request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(err)) => Err(Some(err)),
            Err(_) => Err(None),
        };
        tracing::trace!(
            provider = handle.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "provider call settled"
        );
        result
    })
}

/// Await a spawned call and translate its failure modes into a [`ResponseError`].
async fn settle(
    name: &str,
    handle: JoinHandle<CallResult>,
    timeout: Duration,
) -> Result<SearchResponse, ResponseError> {
    match handle.await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(Some(err))) => Err(ResponseError::provider(name, &err)),
        Ok(Err(None)) => Err(ResponseError::timeout(name, timeout.as_millis() as u64)),
        Err(join_err) => Err(ResponseError::orchestrator(format!(
            "{name}: provider task failed: {join_err}"
        ))),
    }
}
