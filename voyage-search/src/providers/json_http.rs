//! JSON-over-HTTP provider adapter.
//!
//! Talks to any backend exposing two endpoints under a base URL:
//!
//! - `POST {base}/search` with a [`SearchRequest`] body, answering a [`SearchResponse`]
//! - `GET {base}/health`, answering a [`HealthReport`]

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use crate::error::SearchError;
use crate::http::map_transport_error;
use crate::provider::SearchProvider;
use crate::types::{HealthReport, SearchRequest, SearchResponse};

/// A provider reached over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpProvider {
    name: String,
    base: Url,
    client: reqwest::Client,
    api_key: Option<String>,
}

impl HttpProvider {
    /// Create an adapter for the service rooted at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `endpoint` is not an absolute
    /// http(s) URL.
    pub fn new(
        name: impl Into<String>,
        endpoint: &str,
        client: reqwest::Client,
    ) -> Result<Self, SearchError> {
        let mut base = Url::parse(endpoint)
            .map_err(|e| SearchError::Config(format!("invalid provider endpoint {endpoint}: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(SearchError::Config(format!(
                "provider endpoint must be http(s), got {}",
                base.scheme()
            )));
        }
        // Url::join replaces the last segment unless the path ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            name: name.into(),
            base,
            client,
            api_key: None,
        })
    }

    /// Send `Authorization: Bearer <key>` on every request.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, SearchError> {
        self.base
            .join(path)
            .map_err(|e| SearchError::Config(format!("invalid provider path {path}: {e}")))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key {
            Some(ref key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

/// Turn a non-success status into the matching [`SearchError`].
fn check_status(name: &str, status: StatusCode) -> Result<(), SearchError> {
    if status.is_success() {
        return Ok(());
    }
    Err(match status {
        StatusCode::TOO_MANY_REQUESTS => SearchError::RateLimited(format!("{name} returned HTTP 429")),
        StatusCode::SERVICE_UNAVAILABLE => {
            SearchError::Unavailable(format!("{name} returned HTTP 503"))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SearchError::Config(format!("{name} rejected credentials (HTTP {})", status.as_u16()))
        }
        other => SearchError::Http(format!("{name} returned HTTP {}", other.as_u16())),
    })
}

#[async_trait]
impl SearchProvider for HttpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        let url = self.endpoint("search")?;
        let response = self
            .authorize(self.client.post(url).json(request))
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(&self.name, response.status())?;

        let mut body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(format!("{}: {e}", self.name)))?;
        if body.source_id.is_empty() {
            body.source_id.clone_from(&self.name);
        }
        Ok(body)
    }

    async fn health(&self) -> Result<HealthReport, SearchError> {
        let url = self.endpoint("health")?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(&self.name, response.status())?;
        response
            .json()
            .await
            .map_err(|e| SearchError::Parse(format!("{}: {e}", self.name)))
    }
}
