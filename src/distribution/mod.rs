//! Query distribution: assign a batch of queries to worker classes.
//!
//! The [`Distributor`] looks at the shape of a batch, picks one of four
//! assignment strategies, runs it against the [`CapabilityRegistry`], and
//! estimates how long the resulting plan will take. Every strategy
//! conserves the batch: each query lands in exactly one assignment.
//!
//! Strategies degrade instead of failing. A plan may leave a class above its
//! nominal capacity when no other class can take the overflow; [`validate`]
//! reports that as a warning.

pub mod selector;
pub mod strategies;
pub mod validate;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::capability::CapabilityRegistry;
use crate::error::{Result, VoyageError};
use crate::query::{Priority, Query, QueryContext};

pub use selector::select_strategy;
pub use validate::{ValidationReport, ValidationWarning, validate};

/// Assignment algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Group by target class, spill overflow onto the fallback class.
    Simple,
    /// High priority to immediate classes, the rest to deferred classes.
    PriorityBased,
    /// Urgent first, greedy least-loaded placement.
    LoadBalanced,
    /// Group by target class, then rebalance overflow query by query.
    Balanced,
}

impl Strategy {
    /// Stable kebab-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::PriorityBased => "priority-based",
            Self::LoadBalanced => "load-balanced",
            Self::Balanced => "balanced",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = VoyageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "priority-based" | "priority" => Ok(Self::PriorityBased),
            "load-balanced" | "load" => Ok(Self::LoadBalanced),
            "balanced" => Ok(Self::Balanced),
            other => Err(VoyageError::Config(format!(
                "unknown distribution strategy: {other}"
            ))),
        }
    }
}

/// Queries placed on one worker class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub worker_class: String,
    pub queries: Vec<Query>,
    pub effective_priority: Priority,
}

impl Assignment {
    /// Create an assignment, deriving its effective priority.
    pub fn new(worker_class: impl Into<String>, queries: Vec<Query>) -> Self {
        let effective_priority = effective_priority(&queries);
        Self {
            worker_class: worker_class.into(),
            queries,
            effective_priority,
        }
    }

    /// Create an assignment with a fixed priority tier.
    pub fn with_tier(worker_class: impl Into<String>, queries: Vec<Query>, tier: Priority) -> Self {
        Self {
            worker_class: worker_class.into(),
            queries,
            effective_priority: tier,
        }
    }

    /// Number of queries.
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// `true` if no query was placed here.
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

/// `High` if more than half the queries are high, else `Medium` if more
/// than half are medium, else `Low`.
pub fn effective_priority(queries: &[Query]) -> Priority {
    let count = |p: Priority| queries.iter().filter(|q| q.priority == p).count();
    if count(Priority::High) * 2 > queries.len() {
        Priority::High
    } else if count(Priority::Medium) * 2 > queries.len() {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// A batch mapped onto worker classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub original_queries: Vec<Query>,
    pub assignments: Vec<Assignment>,
    pub strategy: Strategy,
    /// Classes work in parallel; each works its queue in waves of
    /// `max_concurrent_queries`.
    pub estimated_total_processing_time_ms: u64,
}

impl Distribution {
    /// Total queries across assignments.
    pub fn assigned_count(&self) -> usize {
        self.assignments.iter().map(Assignment::len).sum()
    }

    /// Estimated wall-clock time to work the whole plan.
    pub fn estimated_total_processing_time(&self) -> Duration {
        Duration::from_millis(self.estimated_total_processing_time_ms)
    }
}

/// Tuning for strategy selection and the strategies themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// General-purpose class that absorbs overflow and unknown targets.
    pub fallback_class: String,
    /// Classes able to start work at once; high-priority queries go here.
    pub immediate_classes: Vec<String>,
    /// Classes that take medium and low priority work under priority-based
    /// distribution.
    pub deferred_classes: Vec<String>,
    /// Batches of at most this many queries use the simple strategy.
    pub simple_max_queries: usize,
    /// Share of high-priority queries above which priority-based wins.
    pub priority_dominance: f64,
    /// Batches larger than this use the load-balanced strategy.
    pub load_balance_min_queries: usize,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            fallback_class: "retrieval".to_owned(),
            immediate_classes: vec!["retrieval".to_owned(), "analysis".to_owned()],
            deferred_classes: vec!["planning".to_owned(), "finishing".to_owned()],
            simple_max_queries: 3,
            priority_dominance: 0.6,
            load_balance_min_queries: 10,
        }
    }
}

impl DistributionConfig {
    /// Check every named class exists in `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`VoyageError::Config`] naming the first unknown class, or if
    /// `priority_dominance` is outside `[0, 1]`.
    pub fn validate(&self, registry: &CapabilityRegistry) -> Result<()> {
        if registry.get(&self.fallback_class).is_none() {
            return Err(VoyageError::Config(format!(
                "fallback_class {} is not a configured worker class",
                self.fallback_class
            )));
        }
        for class in self.immediate_classes.iter().chain(&self.deferred_classes) {
            if registry.get(class).is_none() {
                return Err(VoyageError::Config(format!(
                    "worker class {class} is not configured"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.priority_dominance) {
            return Err(VoyageError::Config(
                "priority_dominance must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }
}

/// Distribution front door.
#[derive(Debug, Clone)]
pub struct Distributor {
    registry: Arc<CapabilityRegistry>,
    config: DistributionConfig,
}

impl Distributor {
    /// Create a distributor over `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`VoyageError::Config`] if `config` names unknown classes.
    pub fn new(registry: Arc<CapabilityRegistry>, config: DistributionConfig) -> Result<Self> {
        config.validate(&registry)?;
        Ok(Self { registry, config })
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DistributionConfig {
        &self.config
    }

    /// Strategy the batch shape calls for.
    pub fn select(&self, queries: &[Query], context: &QueryContext) -> Strategy {
        select_strategy(queries, context, &self.config)
    }

    /// Select a strategy for `queries` and run it.
    pub fn distribute(&self, queries: Vec<Query>, context: &QueryContext) -> Distribution {
        let strategy = self.select(&queries, context);
        self.distribute_with(strategy, queries, context)
    }

    /// Run `strategy` regardless of batch shape.
    pub fn distribute_with(
        &self,
        strategy: Strategy,
        queries: Vec<Query>,
        _context: &QueryContext,
    ) -> Distribution {
        let assignments = strategies::assign(strategy, &queries, &self.registry, &self.config);
        let estimated_total_processing_time_ms = self.estimate_ms(&assignments);

        tracing::info!(
            %strategy,
            queries = queries.len(),
            assignments = assignments.len(),
            estimated_ms = estimated_total_processing_time_ms,
            "distributed query batch"
        );
        for assignment in &assignments {
            tracing::debug!(
                worker_class = %assignment.worker_class,
                count = assignment.len(),
                priority = %assignment.effective_priority,
                "assignment"
            );
        }

        Distribution {
            original_queries: queries,
            assignments,
            strategy,
            estimated_total_processing_time_ms,
        }
    }

    /// Check conservation and capacity of a plan made by this distributor.
    pub fn validate(&self, distribution: &Distribution) -> ValidationReport {
        validate(distribution, &self.registry)
    }

    fn estimate_ms(&self, assignments: &[Assignment]) -> u64 {
        let mut per_class: Vec<usize> = vec![0; self.registry.len()];
        for assignment in assignments {
            if let Some(i) = self.registry.position(&assignment.worker_class) {
                per_class[i] += assignment.len();
            }
        }
        self.registry
            .classes()
            .iter()
            .zip(per_class)
            .map(|(class, n)| {
                let waves = n.div_ceil(class.max_concurrent_queries) as u64;
                waves * class.est_processing_time_ms
            })
            .max()
            .unwrap_or(0)
    }
}
