//! Configuration types for the voyage planner.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use voyage_search::http::build_client;
use voyage_search::{HttpProvider, ProviderRegistry, SearchConfig, SearchOrchestrator, Specialty};

use crate::capability::{CapabilityRegistry, WorkerCapability};
use crate::dispatch::DispatchConfig;
use crate::distribution::{DistributionConfig, Distributor};
use crate::error::{Result, VoyageError};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoyageConfig {
    /// Worker classes in declaration order.
    pub workers: Vec<WorkerCapability>,
    /// Strategy thresholds and class roles.
    pub distribution: DistributionConfig,
    /// Search orchestrator settings.
    pub search: SearchConfig,
    /// Batch dispatch settings.
    pub dispatch: DispatchConfig,
    /// HTTP search providers.
    pub providers: Vec<ProviderConfig>,
}

impl Default for VoyageConfig {
    fn default() -> Self {
        Self {
            workers: WorkerCapability::defaults(),
            distribution: DistributionConfig::default(),
            search: SearchConfig::default(),
            dispatch: DispatchConfig::default(),
            providers: Vec::new(),
        }
    }
}

/// One JSON-over-HTTP search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique provider name.
    pub name: String,
    /// Routing role.
    pub specialty: Specialty,
    /// Base URL; `/search` and `/health` are appended.
    pub endpoint: String,
    /// Environment variable holding the provider's API key, if it needs one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl VoyageConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first configuration problem found.
    pub fn validate(&self) -> Result<()> {
        let registry = CapabilityRegistry::new(self.workers.clone())?;
        self.distribution.validate(&registry)?;
        self.search.validate()?;
        self.dispatch.validate()?;
        Ok(())
    }

    /// Build the capability registry from `workers`.
    ///
    /// # Errors
    ///
    /// Returns [`VoyageError::Config`] for empty, duplicate or zero-capacity classes.
    pub fn build_capability_registry(&self) -> Result<CapabilityRegistry> {
        CapabilityRegistry::new(self.workers.clone())
    }

    /// Build a distributor over the configured worker classes.
    ///
    /// # Errors
    ///
    /// Returns [`VoyageError::Config`] if the classes or class roles are invalid.
    pub fn build_distributor(&self) -> Result<Distributor> {
        let registry = Arc::new(self.build_capability_registry()?);
        Distributor::new(registry, self.distribution.clone())
    }

    /// Build HTTP providers sharing one client.
    ///
    /// A provider whose `api_key_env` variable is unset is registered
    /// without a key.
    ///
    /// # Errors
    ///
    /// Returns [`VoyageError::Search`] for bad endpoints or duplicate names.
    pub fn build_provider_registry(&self) -> Result<ProviderRegistry> {
        let client = build_client(self.search.provider_timeout(), None)?;
        let mut registry = ProviderRegistry::new();
        for provider in &self.providers {
            let mut http = HttpProvider::new(provider.name.clone(), &provider.endpoint, client.clone())?;
            if let Some(ref var) = provider.api_key_env {
                match std::env::var(var) {
                    Ok(key) if !key.trim().is_empty() => http = http.with_api_key(key),
                    _ => tracing::warn!(provider = %provider.name, env = %var, "API key variable not set"),
                }
            }
            registry.register(Arc::new(http), provider.specialty)?;
        }
        Ok(registry)
    }

    /// Build an orchestrator over the configured providers.
    ///
    /// # Errors
    ///
    /// Same as [`build_provider_registry`](Self::build_provider_registry), plus
    /// invalid search settings.
    pub fn build_orchestrator(&self) -> Result<SearchOrchestrator> {
        let registry = Arc::new(self.build_provider_registry()?);
        Ok(SearchOrchestrator::new(registry, self.search.clone())?)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| VoyageError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| VoyageError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/voyage/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("voyage").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("voyage")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/voyage-config/config.toml")
        }
    }
}
