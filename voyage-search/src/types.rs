//! Core types for search requests, responses, and provider health.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::SearchError;

/// Kind of result a request asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    /// Ordinary web pages.
    #[default]
    Text,
    /// Image results.
    Image,
    /// Video results.
    Video,
    /// News articles.
    News,
}

/// How recent results must be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    /// Published within the last day.
    Day,
    /// Published within the last week.
    Week,
    /// Published within the last month.
    Month,
    /// Published within the last year.
    Year,
}

/// Per-request search options forwarded to providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchOptions {
    /// Maximum number of results in the final, ranked response.
    pub max_results: usize,
    /// Preferred result language (ISO 639-1).
    pub language: String,
    /// Preferred result region (ISO 3166-1 alpha-2, lowercase).
    pub region: String,
    /// Whether providers should filter explicit content.
    pub safe_search: bool,
    /// Optional recency restriction.
    pub freshness: Option<Freshness>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: 10,
            language: "en".to_owned(),
            region: "us".to_owned(),
            safe_search: true,
            freshness: None,
        }
    }
}

/// A single search request handed to the orchestrator and, from there, to
/// each selected provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Free-text query.
    pub query_text: String,
    /// Kind of result wanted.
    #[serde(default)]
    pub result_type: ResultType,
    /// Optional routing hint: a registered provider name, or `neural`/`semantic`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_hint: Option<String>,
    /// Result shaping options.
    #[serde(default)]
    pub options: SearchOptions,
}

impl SearchRequest {
    /// Create a text request with default options.
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            result_type: ResultType::default(),
            provider_hint: None,
            options: SearchOptions::default(),
        }
    }

    /// Set the result type.
    pub fn with_result_type(mut self, result_type: ResultType) -> Self {
        self.result_type = result_type;
        self
    }

    /// Set the routing hint.
    pub fn with_provider_hint(mut self, hint: impl Into<String>) -> Self {
        self.provider_hint = Some(hint.into());
        self
    }

    /// Set the maximum number of results.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.options.max_results = max_results;
        self
    }

    /// Replace all options at once.
    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }
}

/// Credibility classification of a result's origin.
///
/// Produced upstream (by providers) and carried through ranking untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// First-party or official site.
    Official,
    /// News outlet.
    News,
    /// Review site.
    Review,
    /// Academic or reference publication.
    Academic,
    /// Social network post.
    Social,
    /// Personal or company blog.
    Blog,
    /// Not classified.
    #[default]
    Unknown,
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    /// Target URL. After normalisation this is the dedup key.
    pub url: String,
    /// Page title.
    pub title: String,
    /// Text snippet summarising the page.
    #[serde(default)]
    pub snippet: String,
    /// Host the result came from; the grouping key for diversity ranking.
    #[serde(default)]
    pub source_domain: String,
    /// Publication time, if the provider knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<DateTime<Utc>>,
    /// Relevance to the originating query in `[0, 1]`.
    #[serde(default, deserialize_with = "deserialize_unit_score")]
    pub relevance_score: f64,
    /// Credibility classification.
    #[serde(default)]
    pub source_type: SourceType,
}

impl SearchResultItem {
    /// Create a result, deriving `source_domain` from the URL host.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        let url = url.into();
        let source_domain = domain_of(&url);
        Self {
            url,
            title: title.into(),
            snippet: String::new(),
            source_domain,
            published_date: None,
            relevance_score: 0.0,
            source_type: SourceType::Unknown,
        }
    }

    /// Set the snippet.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    /// Set the relevance score, clamped into `[0, 1]`.
    pub fn with_relevance(mut self, score: f64) -> Self {
        self.relevance_score = clamp_unit(score);
        self
    }

    /// Set the publication date.
    pub fn with_published_date(mut self, date: DateTime<Utc>) -> Self {
        self.published_date = Some(date);
        self
    }

    /// Override the source domain.
    pub fn with_source_domain(mut self, domain: impl Into<String>) -> Self {
        self.source_domain = domain.into();
        self
    }

    /// Set the source type.
    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }
}

/// Clamp into `[0, 1]`; NaN becomes 0.
fn clamp_unit(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

fn deserialize_unit_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_unit)
}

/// Lowercased host of `url`, without a leading `www.`. Empty if unparseable.
pub fn domain_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_owned()))
        .unwrap_or_default()
}

/// Machine-readable category of a [`ResponseError`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ErrorCode {
    /// No provider could serve the request. Terminal for that call.
    NoProvidersAvailable,
    /// A named provider's call failed. Holds the upper-cased code segment
    /// built by [`ErrorCode::provider`].
    Provider(String),
    /// A provider call exceeded its time budget.
    Timeout,
    /// Unexpected internal failure in the orchestrator itself.
    Orchestrator,
    /// A code reported by a provider that this crate does not define. Kept verbatim.
    Other(String),
}

impl ErrorCode {
    /// Provider failure code for `name`, e.g. `cruise-db` gives `PROVIDER_CRUISE_DB_ERROR`.
    pub fn provider(name: &str) -> Self {
        Self::Provider(code_segment(name))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoProvidersAvailable => f.write_str("NO_PROVIDERS_AVAILABLE"),
            Self::Provider(name) => write!(f, "PROVIDER_{}_ERROR", code_segment(name)),
            Self::Timeout => f.write_str("TIMEOUT"),
            Self::Orchestrator => f.write_str("ORCHESTRATOR_ERROR"),
            Self::Other(code) => f.write_str(code),
        }
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.to_string()
    }
}

impl From<String> for ErrorCode {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "NO_PROVIDERS_AVAILABLE" => return Self::NoProvidersAvailable,
            "TIMEOUT" => return Self::Timeout,
            "ORCHESTRATOR_ERROR" => return Self::Orchestrator,
            _ => {}
        }
        let segment = raw
            .strip_prefix("PROVIDER_")
            .and_then(|s| s.strip_suffix("_ERROR"))
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        match segment {
            Some(segment) => Self::Provider(segment),
            None => Self::Other(raw),
        }
    }
}

/// Upper-case a provider name and replace anything that is not `[A-Z0-9]` with `_`.
fn code_segment(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// A non-fatal error attached to a [`SearchResponse`] alongside whatever
/// partial results were obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Error category.
    pub code: ErrorCode,
    /// Human-readable explanation.
    pub message: String,
    /// Whether the caller may retry.
    pub retryable: bool,
}

impl ResponseError {
    /// No provider matched the request.
    pub fn no_providers(query: &str) -> Self {
        Self {
            code: ErrorCode::NoProvidersAvailable,
            message: format!("no search provider available for query ({} chars)", query.len()),
            retryable: false,
        }
    }

    /// A provider call failed.
    pub fn provider(name: &str, err: &SearchError) -> Self {
        if let SearchError::Timeout(detail) = err {
            return Self {
                code: ErrorCode::Timeout,
                message: format!("{name}: {detail}"),
                retryable: true,
            };
        }
        Self {
            code: ErrorCode::provider(name),
            message: format!("{name}: {err}"),
            retryable: err.is_retryable(),
        }
    }

    /// A provider call exceeded the orchestrator's timeout.
    pub fn timeout(name: &str, timeout_ms: u64) -> Self {
        Self {
            code: ErrorCode::Timeout,
            message: format!("{name}: no response within {timeout_ms}ms"),
            retryable: true,
        }
    }

    /// Internal orchestrator failure.
    pub fn orchestrator(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Orchestrator,
            message: message.into(),
            retryable: true,
        }
    }
}

/// Bookkeeping attached to every response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Distinct results available after dedup, before truncation.
    pub total_results: usize,
    /// Wall-clock time spent on the call.
    pub search_time_ms: u64,
    /// When the response was produced.
    pub timestamp: DateTime<Utc>,
    /// Providers actually called, in call order.
    pub providers: Vec<String>,
    /// Execution strategy used, when produced by the orchestrator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

impl Default for ResponseMetadata {
    fn default() -> Self {
        Self {
            total_results: 0,
            search_time_ms: 0,
            timestamp: Utc::now(),
            providers: Vec::new(),
            strategy: None,
        }
    }
}

/// Result of a search call, from a single provider or from the orchestrator.
///
/// A non-empty `errors` list next to non-empty `results` is a partial
/// success, not a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// The query text this response answers.
    pub query: String,
    /// Provider name or orchestrator id that produced the response.
    #[serde(default)]
    pub source_id: String,
    /// Ranked results.
    #[serde(default)]
    pub results: Vec<SearchResultItem>,
    /// Timing and bookkeeping.
    #[serde(default)]
    pub metadata: ResponseMetadata,
    /// Non-fatal errors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ResponseError>,
}

impl SearchResponse {
    /// An empty response with no errors.
    pub fn empty(query: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            source_id: source_id.into(),
            results: Vec::new(),
            metadata: ResponseMetadata::default(),
            errors: Vec::new(),
        }
    }

    /// A response carrying `results`, with `total_results` filled in.
    pub fn with_results(
        query: impl Into<String>,
        source_id: impl Into<String>,
        results: Vec<SearchResultItem>,
    ) -> Self {
        let mut response = Self::empty(query, source_id);
        response.metadata.total_results = results.len();
        response.results = results;
        response
    }

    /// `true` when there is something to show, or nothing went wrong.
    pub fn is_success(&self) -> bool {
        !self.results.is_empty() || self.errors.is_empty()
    }

    /// `true` when results came back alongside errors.
    pub fn is_partial(&self) -> bool {
        !self.results.is_empty() && !self.errors.is_empty()
    }
}

/// Coarse health reported by a provider's probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// Operating normally.
    Healthy,
    /// Reachable but impaired. Still eligible for selection.
    Degraded,
    /// Not usable.
    Unhealthy,
}

/// What a provider's health probe returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Coarse status.
    pub status: HealthState,
    /// Provider-measured latency.
    #[serde(default)]
    pub latency_ms: u64,
    /// Recent error rate in `[0, 1]`.
    #[serde(default)]
    pub error_rate: f64,
}

impl HealthReport {
    /// A healthy report with zero latency and error rate.
    pub fn healthy() -> Self {
        Self {
            status: HealthState::Healthy,
            latency_ms: 0,
            error_rate: 0.0,
        }
    }
}

/// Latest health sample for one provider, as kept in the registry's status table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    /// Provider name.
    pub name: String,
    /// Whether selection should consider the provider usable.
    pub healthy: bool,
    /// Probe latency.
    pub latency_ms: u64,
    /// Error rate in `[0, 1]`.
    pub error_rate: f64,
    /// When this sample was taken.
    pub last_checked: DateTime<Utc>,
}
