//! Integration tests for the search orchestrator pipeline.
//!
//! These tests drive routing, execution strategies, timeouts and
//! post-processing through scripted in-process providers (no network calls).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use voyage_search::orchestrator::execution::execute;
use voyage_search::orchestrator::url_normalize::normalize_url;
use voyage_search::{
    ErrorCode, ExecutionStrategy, ProviderRegistry, RankingMode, RegisteredProvider,
    ResponseError, SearchConfig, SearchError, SearchOrchestrator, SearchProvider, SearchRequest,
    SearchResponse, SearchResultItem, Specialty,
};

#[derive(Clone)]
enum Script {
    /// Return these URLs with descending relevance.
    Results(Vec<String>),
    /// No results, one provider-reported error carrying this code.
    Reported(&'static str),
    Fail,
    Panic,
    Sleep(Duration),
}

struct Scripted {
    name: String,
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl Scripted {
    fn new(name: &str, script: Script) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Arc::new(Self {
            name: name.to_owned(),
            script,
            calls: Arc::clone(&calls),
        });
        (provider, calls)
    }
}

#[async_trait]
impl SearchProvider for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Results(urls) => {
                let count = urls.len().max(1) as f64;
                let results = urls
                    .iter()
                    .enumerate()
                    .map(|(i, url)| {
                        SearchResultItem::new(url.as_str(), format!("{} #{i}", self.name))
                            .with_relevance(1.0 - i as f64 / count)
                    })
                    .collect();
                Ok(SearchResponse::with_results(
                    &request.query_text,
                    &self.name,
                    results,
                ))
            }
            Script::Reported(code) => {
                let mut response = SearchResponse::empty(&request.query_text, &self.name);
                response.errors.push(ResponseError {
                    code: ErrorCode::from((*code).to_owned()),
                    message: format!("{} reported {code}", self.name),
                    retryable: false,
                });
                Ok(response)
            }
            Script::Fail => Err(SearchError::Http("upstream returned 500".into())),
            Script::Panic => panic!("provider bug"),
            Script::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(SearchResponse::empty(&request.query_text, &self.name))
            }
        }
    }
}

fn urls(host: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("https://{host}/page/{i}")).collect()
}

fn registered(provider: Arc<Scripted>, specialty: Specialty) -> RegisteredProvider {
    RegisteredProvider {
        name: provider.name.clone(),
        specialty,
        handle: provider,
    }
}

fn orchestrator(
    providers: Vec<(Arc<Scripted>, Specialty)>,
    config: SearchConfig,
) -> SearchOrchestrator {
    let mut registry = ProviderRegistry::new();
    for (provider, specialty) in providers {
        registry.register(provider, specialty).unwrap();
    }
    SearchOrchestrator::new(Arc::new(registry), config).unwrap()
}

#[tokio::test]
async fn fallback_stops_at_first_non_empty_provider() {
    let (a, a_calls) = Scripted::new("a", Script::Results(vec![]));
    let (b, b_calls) = Scripted::new("b", Script::Results(urls("b.com", 3)));
    let (c, c_calls) = Scripted::new("c", Script::Results(urls("c.com", 5)));
    let providers = vec![
        registered(a, Specialty::Primary),
        registered(b, Specialty::Secondary),
        registered(c, Specialty::Secondary),
    ];

    let outcome = execute(
        ExecutionStrategy::Fallback,
        &providers,
        &SearchRequest::new("hotels"),
        Duration::from_secs(1),
    )
    .await;

    assert_eq!(outcome.results.len(), 3);
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.called, vec!["a", "b"]);
    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    assert_eq!(c_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fallback_moves_past_failures() {
    let (a, _) = Scripted::new("a", Script::Fail);
    let (b, _) = Scripted::new("b", Script::Results(urls("b.com", 2)));
    let providers = vec![registered(a, Specialty::Primary), registered(b, Specialty::Secondary)];

    let outcome = execute(
        ExecutionStrategy::Fallback,
        &providers,
        &SearchRequest::new("hotels"),
        Duration::from_secs(1),
    )
    .await;

    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].code, ErrorCode::provider("a"));
}

#[tokio::test]
async fn fallback_all_empty_or_failed_returns_all_errors() {
    let (a, a_calls) = Scripted::new("a", Script::Fail);
    let (b, b_calls) = Scripted::new("b", Script::Reported("QUOTA_EXCEEDED"));
    let (c, c_calls) = Scripted::new("c", Script::Results(vec![]));
    let providers = vec![
        registered(a, Specialty::Primary),
        registered(b, Specialty::Secondary),
        registered(c, Specialty::Secondary),
    ];

    let outcome = execute(
        ExecutionStrategy::Fallback,
        &providers,
        &SearchRequest::new("hotels"),
        Duration::from_secs(1),
    )
    .await;

    assert!(outcome.results.is_empty());
    assert_eq!(outcome.called, vec!["a", "b", "c"]);
    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    assert_eq!(c_calls.load(Ordering::SeqCst), 1);

    let codes: Vec<String> = outcome.errors.iter().map(|e| e.code.to_string()).collect();
    assert_eq!(codes, vec!["PROVIDER_A_ERROR", "QUOTA_EXCEEDED"]);
}

#[tokio::test]
async fn parallel_keeps_partial_results_next_to_errors() {
    let (a, _) = Scripted::new("a", Script::Fail);
    let (b, _) = Scripted::new("b", Script::Results(urls("b.com", 2)));
    let orchestrator = orchestrator(
        vec![(a, Specialty::Primary), (b, Specialty::Secondary)],
        SearchConfig::default(),
    );

    let response = orchestrator.search(&SearchRequest::new("best hotels in lisbon")).await;

    assert_eq!(response.results.len(), 2);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].code.to_string(), "PROVIDER_A_ERROR");
    assert!(response.errors[0].retryable);
    assert!(response.is_partial());
    assert!(response.is_success());
    assert_eq!(response.metadata.providers, vec!["a", "b"]);
    assert_eq!(response.metadata.strategy.as_deref(), Some("parallel"));
}

#[tokio::test]
async fn slow_provider_becomes_timeout_error() {
    let (slow, _) = Scripted::new("slow", Script::Sleep(Duration::from_secs(30)));
    let (fast, _) = Scripted::new("fast", Script::Results(urls("fast.com", 1)));
    let config = SearchConfig {
        provider_timeout_ms: 50,
        ..Default::default()
    };
    let orchestrator = orchestrator(
        vec![(slow, Specialty::Primary), (fast, Specialty::Secondary)],
        config,
    );

    let started = Instant::now();
    let response = orchestrator.search(&SearchRequest::new("weather")).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].code, ErrorCode::Timeout);
    assert!(response.errors[0].retryable);
}

#[tokio::test]
async fn panicking_provider_becomes_orchestrator_error() {
    let (bad, _) = Scripted::new("bad", Script::Panic);
    let (good, _) = Scripted::new("good", Script::Results(urls("good.com", 2)));
    let orchestrator = orchestrator(
        vec![(bad, Specialty::Primary), (good, Specialty::Secondary)],
        SearchConfig::default(),
    );

    let response = orchestrator.search(&SearchRequest::new("museums")).await;

    assert_eq!(response.results.len(), 2);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].code.to_string(), "ORCHESTRATOR_ERROR");
}

#[tokio::test]
async fn sequential_stops_once_half_of_max_results_collected() {
    let (a, a_calls) = Scripted::new("a", Script::Results(urls("a.com", 5)));
    let (b, b_calls) = Scripted::new("b", Script::Results(urls("b.com", 5)));
    let config = SearchConfig {
        strategy: ExecutionStrategy::Sequential,
        ..Default::default()
    };
    let orchestrator = orchestrator(
        vec![(a, Specialty::Primary), (b, Specialty::Secondary)],
        config,
    );

    let response = orchestrator
        .search(&SearchRequest::new("restaurants").with_max_results(10))
        .await;

    assert_eq!(response.results.len(), 5);
    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    assert_eq!(response.metadata.strategy.as_deref(), Some("sequential"));
}

#[tokio::test]
async fn sequential_continues_while_below_half() {
    let (a, _) = Scripted::new("a", Script::Results(urls("a.com", 2)));
    let (b, b_calls) = Scripted::new("b", Script::Results(urls("b.com", 4)));
    let config = SearchConfig {
        strategy: ExecutionStrategy::Sequential,
        ..Default::default()
    };
    let orchestrator = orchestrator(
        vec![(a, Specialty::Primary), (b, Specialty::Secondary)],
        config,
    );

    let response = orchestrator
        .search(&SearchRequest::new("restaurants").with_max_results(10))
        .await;

    assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    assert_eq!(response.results.len(), 6);
}

#[tokio::test]
async fn sequential_continues_past_failed_provider() {
    let (a, a_calls) = Scripted::new("a", Script::Fail);
    let (b, b_calls) = Scripted::new("b", Script::Results(urls("b.com", 3)));
    let config = SearchConfig {
        strategy: ExecutionStrategy::Sequential,
        ..Default::default()
    };
    let orchestrator = orchestrator(
        vec![(a, Specialty::Primary), (b, Specialty::Secondary)],
        config,
    );

    let response = orchestrator
        .search(&SearchRequest::new("restaurants").with_max_results(10))
        .await;

    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    assert_eq!(response.results.len(), 3);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].code, ErrorCode::provider("a"));
    assert_eq!(response.metadata.providers, vec!["a", "b"]);
}

#[tokio::test]
async fn cruise_queries_route_to_cruise_specialist_only() {
    let (general, general_calls) = Scripted::new("general", Script::Results(urls("g.com", 3)));
    let (cruise, cruise_calls) = Scripted::new("cruise", Script::Results(urls("c.com", 3)));
    let orchestrator = orchestrator(
        vec![(general, Specialty::Primary), (cruise, Specialty::Cruise)],
        SearchConfig::default(),
    );

    let response = orchestrator
        .search(&SearchRequest::new("Alaska cruise ports of call in June"))
        .await;

    assert_eq!(response.metadata.providers, vec!["cruise"]);
    assert_eq!(cruise_calls.load(Ordering::SeqCst), 1);
    assert_eq!(general_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn provider_hint_overrides_content_routing() {
    let (general, _) = Scripted::new("general", Script::Results(urls("g.com", 1)));
    let (cruise, cruise_calls) = Scripted::new("cruise", Script::Results(urls("c.com", 1)));
    let orchestrator = orchestrator(
        vec![(general, Specialty::Primary), (cruise, Specialty::Cruise)],
        SearchConfig::default(),
    );

    let request = SearchRequest::new("cruise cabins").with_provider_hint("general");
    let response = orchestrator.search(&request).await;

    assert_eq!(response.metadata.providers, vec!["general"]);
    assert_eq!(cruise_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn no_matching_provider_reports_non_retryable_error() {
    let (cruise, _) = Scripted::new("cruise", Script::Results(urls("c.com", 1)));
    let orchestrator = orchestrator(vec![(cruise, Specialty::Cruise)], SearchConfig::default());

    let response = orchestrator.search(&SearchRequest::new("tax forms")).await;

    assert!(response.results.is_empty());
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].code, ErrorCode::NoProvidersAvailable);
    assert!(!response.errors[0].retryable);
}

#[tokio::test]
async fn merged_results_have_distinct_normalised_urls() {
    let overlapping = vec![
        "https://shared.com/a".to_owned(),
        "https://shared.com/b?utm_source=x".to_owned(),
        "https://a-only.com/1".to_owned(),
    ];
    let others = vec![
        "https://shared.com/a#top".to_owned(),
        "https://shared.com/b".to_owned(),
        "https://b-only.com/1".to_owned(),
    ];
    let (a, _) = Scripted::new("a", Script::Results(overlapping));
    let (b, _) = Scripted::new("b", Script::Results(others));
    let orchestrator = orchestrator(
        vec![(a, Specialty::Primary), (b, Specialty::Secondary)],
        SearchConfig::default(),
    );

    let response = orchestrator.search(&SearchRequest::new("overlap")).await;

    let keys: Vec<String> = response.results.iter().map(|r| normalize_url(&r.url)).collect();
    let distinct: HashSet<&String> = keys.iter().collect();
    assert_eq!(keys.len(), distinct.len());
    assert_eq!(response.results.len(), 4);
    assert_eq!(response.metadata.total_results, 4);
}

#[tokio::test]
async fn diversity_ranking_spreads_domains() {
    let (a, _) = Scripted::new("a", Script::Results(urls("a.com", 6)));
    let (b, _) = Scripted::new("b", Script::Results(urls("b.com", 6)));
    let config = SearchConfig {
        ranking: RankingMode::Diversity,
        ..Default::default()
    };
    let orchestrator = orchestrator(
        vec![(a, Specialty::Primary), (b, Specialty::Secondary)],
        config,
    );

    let response = orchestrator
        .search(&SearchRequest::new("mix").with_max_results(4))
        .await;

    assert_eq!(response.results.len(), 4);
    let from_a = response
        .results
        .iter()
        .filter(|r| r.source_domain == "a.com")
        .count();
    assert_eq!(from_a, 2);
}

#[tokio::test]
async fn unhealthy_provider_is_skipped_after_health_sweep() {
    struct Down;

    #[async_trait]
    impl SearchProvider for Down {
        fn name(&self) -> &str {
            "down"
        }

        async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
            Ok(SearchResponse::with_results(
                &request.query_text,
                "down",
                vec![SearchResultItem::new("https://down.com/", "down")],
            ))
        }

        async fn health(&self) -> Result<voyage_search::HealthReport, SearchError> {
            Err(SearchError::Unavailable("maintenance".into()))
        }
    }

    let (up, _) = Scripted::new("up", Script::Results(urls("up.com", 2)));
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(Down), Specialty::Primary).unwrap();
    registry.register(up, Specialty::Secondary).unwrap();
    let registry = Arc::new(registry);

    voyage_search::HealthMonitor::new(Arc::clone(&registry), Duration::from_millis(200))
        .check_all()
        .await;

    let orchestrator =
        SearchOrchestrator::new(Arc::clone(&registry), SearchConfig::default()).unwrap();
    let response = orchestrator.search(&SearchRequest::new("anything")).await;

    assert_eq!(response.metadata.providers, vec!["up"]);
    assert!(response.results.iter().all(|r| r.source_domain == "up.com"));
}
