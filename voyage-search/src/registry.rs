//! Provider registry: configured provider handles plus their health table.
//!
//! Provider entries are fixed once the registry is built and shared behind an
//! `Arc`. The status table is the only runtime-mutable state; it is written by
//! the [`crate::health::HealthMonitor`] and read (possibly stale) by provider
//! selection.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::provider::SearchProvider;
use crate::types::ProviderStatus;

/// What a provider is declared to be good at. Drives content-based routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Specialty {
    /// Preferred general-web provider.
    Primary,
    /// Additional general-web provider, queried alongside the primary.
    Secondary,
    /// Cruise and sailing vertical.
    Cruise,
    /// Neural / semantic search.
    Neural,
}

impl Specialty {
    /// Stable lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Cruise => "cruise",
            Self::Neural => "neural",
        }
    }
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A provider handle with its declared specialty.
#[derive(Clone)]
pub struct RegisteredProvider {
    /// Provider name (copied from [`SearchProvider::name`]).
    pub name: String,
    /// Declared specialty.
    pub specialty: Specialty,
    /// Shared handle to the implementation.
    pub handle: Arc<dyn SearchProvider>,
}

impl fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("name", &self.name)
            .field("specialty", &self.specialty)
            .finish_non_exhaustive()
    }
}

/// Registry of search providers in registration order.
///
/// Registration order is selection order: when several providers share a
/// specialty, the first one registered wins.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<RegisteredProvider>,
    status: RwLock<HashMap<String, ProviderStatus>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the name is blank or already taken.
    pub fn register(
        &mut self,
        provider: Arc<dyn SearchProvider>,
        specialty: Specialty,
    ) -> Result<(), SearchError> {
        let name = provider.name().to_owned();
        if name.trim().is_empty() {
            return Err(SearchError::Config("provider name must not be empty".into()));
        }
        if self.get(&name).is_some() {
            return Err(SearchError::Config(format!(
                "provider {name} registered twice"
            )));
        }
        tracing::debug!(provider = %name, %specialty, "registered search provider");
        self.providers.push(RegisteredProvider {
            name,
            specialty,
            handle: provider,
        });
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn with_provider(
        mut self,
        provider: Arc<dyn SearchProvider>,
        specialty: Specialty,
    ) -> Result<Self, SearchError> {
        self.register(provider, specialty)?;
        Ok(self)
    }

    /// All providers in registration order.
    pub fn providers(&self) -> &[RegisteredProvider] {
        &self.providers
    }

    /// Look up a provider by exact name.
    pub fn get(&self, name: &str) -> Option<&RegisteredProvider> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// First registered provider with `specialty`.
    pub fn first_with(&self, specialty: Specialty) -> Option<&RegisteredProvider> {
        self.providers.iter().find(|p| p.specialty == specialty)
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Latest health sample for `name`, if one has been taken.
    pub fn status(&self, name: &str) -> Option<ProviderStatus> {
        self.status
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Latest health samples in registration order. Unsampled providers are omitted.
    pub fn status_snapshot(&self) -> Vec<ProviderStatus> {
        let table = self.status.read().unwrap_or_else(|e| e.into_inner());
        self.providers
            .iter()
            .filter_map(|p| table.get(&p.name).cloned())
            .collect()
    }

    /// Whether selection should treat `name` as usable.
    ///
    /// Providers that have never been sampled count as healthy.
    pub fn is_healthy(&self, name: &str) -> bool {
        self.status(name).is_none_or(|s| s.healthy)
    }

    /// Overwrite the health sample for a provider.
    pub(crate) fn update_status(&self, status: ProviderStatus) {
        self.status
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(status.name.clone(), status);
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::types::{SearchRequest, SearchResponse};
    use async_trait::async_trait;
    use chrono::Utc;

    struct Named(&'static str);

    #[async_trait]
    impl SearchProvider for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
            Ok(SearchResponse::empty(&request.query_text, self.0))
        }
    }

    fn sample(name: &str, healthy: bool) -> ProviderStatus {
        ProviderStatus {
            name: name.into(),
            healthy,
            latency_ms: 10,
            error_rate: if healthy { 0.0 } else { 1.0 },
            last_checked: Utc::now(),
        }
    }

    #[test]
    fn registration_order_is_preserved() {
        let registry = ProviderRegistry::new()
            .with_provider(Arc::new(Named("b")), Specialty::Secondary)
            .unwrap()
            .with_provider(Arc::new(Named("a")), Specialty::Primary)
            .unwrap();
        let names: Vec<_> = registry.providers().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(Named("a")), Specialty::Primary).unwrap();
        let err = registry
            .register(Arc::new(Named("a")), Specialty::Secondary)
            .unwrap_err();
        assert!(err.to_string().contains("twice"));
    }

    #[test]
    fn blank_name_rejected() {
        let mut registry = ProviderRegistry::new();
        assert!(registry.register(Arc::new(Named(" ")), Specialty::Primary).is_err());
    }

    #[test]
    fn first_with_returns_earliest_match() {
        let registry = ProviderRegistry::new()
            .with_provider(Arc::new(Named("c1")), Specialty::Cruise)
            .unwrap()
            .with_provider(Arc::new(Named("c2")), Specialty::Cruise)
            .unwrap();
        assert_eq!(registry.first_with(Specialty::Cruise).unwrap().name, "c1");
        assert!(registry.first_with(Specialty::Neural).is_none());
    }

    #[test]
    fn unsampled_provider_counts_as_healthy() {
        let registry = ProviderRegistry::new()
            .with_provider(Arc::new(Named("a")), Specialty::Primary)
            .unwrap();
        assert!(registry.is_healthy("a"));
        assert!(registry.status("a").is_none());
        assert!(registry.status_snapshot().is_empty());
    }

    #[test]
    fn status_updates_overwrite() {
        let registry = ProviderRegistry::new()
            .with_provider(Arc::new(Named("a")), Specialty::Primary)
            .unwrap();
        registry.update_status(sample("a", false));
        assert!(!registry.is_healthy("a"));
        registry.update_status(sample("a", true));
        assert!(registry.is_healthy("a"));
        assert_eq!(registry.status_snapshot().len(), 1);
    }
}
