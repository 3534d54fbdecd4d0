//! Orchestrator configuration with sensible defaults.
//!
//! [`SearchConfig`] controls how providers are executed, how long each call
//! may take, how results are post-processed, and how the health monitor
//! samples providers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::SearchError;

/// How the orchestrator drives the selected providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStrategy {
    /// All providers concurrently; wait for every call to settle.
    #[default]
    Parallel,
    /// One at a time; stop once half of `max_results` is collected.
    Sequential,
    /// One at a time; stop at the first provider that returns anything.
    Fallback,
}

impl ExecutionStrategy {
    /// Stable lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Parallel => "parallel",
            Self::Sequential => "sequential",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ranking discipline applied after dedup. Exactly one is active per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingMode {
    /// Descending relevance score.
    #[default]
    Relevance,
    /// Newest first; undated results last.
    Recency,
    /// Round-robin across source domains with a per-domain cap.
    Diversity,
}

/// Configuration for a [`crate::SearchOrchestrator`] and its health monitor.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Provider execution strategy.
    pub strategy: ExecutionStrategy,
    /// Per-provider call timeout in milliseconds.
    pub provider_timeout_ms: u64,
    /// Per-provider health probe timeout in milliseconds.
    pub health_probe_timeout_ms: u64,
    /// Seconds between health sweeps.
    pub health_interval_secs: u64,
    /// Drop results whose normalised URL was already seen.
    pub deduplicate: bool,
    /// Ranking discipline.
    pub ranking: RankingMode,
    /// Skip providers currently marked unhealthy, unless that leaves none.
    pub skip_unhealthy: bool,
    /// Identifier stamped on orchestrated responses.
    pub orchestrator_id: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategy::Parallel,
            provider_timeout_ms: 10_000,
            health_probe_timeout_ms: 3_000,
            health_interval_secs: 60,
            deduplicate: true,
            ranking: RankingMode::Relevance,
            skip_unhealthy: true,
            orchestrator_id: "voyage-orchestrator".to_owned(),
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `provider_timeout_ms` must be greater than 0
    /// - `health_probe_timeout_ms` must be greater than 0
    /// - `health_interval_secs` must be greater than 0
    /// - `orchestrator_id` must not be blank
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.provider_timeout_ms == 0 {
            return Err(SearchError::Config(
                "provider_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.health_probe_timeout_ms == 0 {
            return Err(SearchError::Config(
                "health_probe_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.health_interval_secs == 0 {
            return Err(SearchError::Config(
                "health_interval_secs must be greater than 0".into(),
            ));
        }
        if self.orchestrator_id.trim().is_empty() {
            return Err(SearchError::Config("orchestrator_id must not be empty".into()));
        }
        Ok(())
    }

    /// Provider call timeout as a [`Duration`].
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Health probe timeout as a [`Duration`].
    pub fn health_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.health_probe_timeout_ms)
    }

    /// Interval between health sweeps as a [`Duration`].
    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs)
    }
}
