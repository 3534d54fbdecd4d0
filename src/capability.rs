//! Worker class capabilities.
//!
//! The [`CapabilityRegistry`] is built once from configuration and shared
//! read-only. Declaration order matters: strategies break load ties in
//! favour of the class declared first.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VoyageError};

/// Category wildcard: a class declaring it accepts every category.
pub const ANY_CATEGORY: &str = "*";

/// Static description of one worker class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerCapability {
    /// Class name queries target (e.g. `retrieval`).
    pub worker_class: String,
    /// How many queries the class can hold at once.
    pub max_concurrent_queries: usize,
    /// Query categories the class accepts.
    #[serde(default)]
    pub supported_categories: BTreeSet<String>,
    /// Expected time to work one query.
    #[serde(default)]
    pub est_processing_time_ms: u64,
}

impl WorkerCapability {
    /// Create a capability.
    pub fn new(
        worker_class: impl Into<String>,
        max_concurrent_queries: usize,
        supported_categories: &[&str],
        est_processing_time_ms: u64,
    ) -> Self {
        Self {
            worker_class: worker_class.into(),
            max_concurrent_queries,
            supported_categories: supported_categories.iter().map(|c| (*c).to_owned()).collect(),
            est_processing_time_ms,
        }
    }

    /// Whether this class accepts queries of `category`.
    pub fn supports(&self, category: &str) -> bool {
        self.supported_categories.contains(category)
            || self.supported_categories.contains(ANY_CATEGORY)
    }

    /// Expected per-query processing time.
    pub fn est_processing_time(&self) -> Duration {
        Duration::from_millis(self.est_processing_time_ms)
    }

    /// Default worker classes: planning, retrieval, analysis, finishing.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("planning", 3, &["planning", "general"], 800),
            Self::new("retrieval", 5, &["search", "factual", "news", "general"], 1_500),
            Self::new("analysis", 3, &["analysis", "comparison", "general"], 2_000),
            Self::new("finishing", 2, &["synthesis", "formatting", "general"], 1_000),
        ]
    }
}

/// Worker classes in declaration order.
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    classes: Vec<WorkerCapability>,
    index: HashMap<String, usize>,
}

impl CapabilityRegistry {
    /// Build a registry.
    ///
    /// # Errors
    ///
    /// Returns [`VoyageError::Config`] if there are no classes, a class name
    /// is blank or repeated, or a class has zero capacity.
    pub fn new(classes: Vec<WorkerCapability>) -> Result<Self> {
        if classes.is_empty() {
            return Err(VoyageError::Config(
                "at least one worker class must be configured".into(),
            ));
        }
        let mut index = HashMap::with_capacity(classes.len());
        for (i, class) in classes.iter().enumerate() {
            if class.worker_class.trim().is_empty() {
                return Err(VoyageError::Config("worker_class must not be empty".into()));
            }
            if class.max_concurrent_queries == 0 {
                return Err(VoyageError::Config(format!(
                    "worker class {} must have max_concurrent_queries greater than 0",
                    class.worker_class
                )));
            }
            if index.insert(class.worker_class.clone(), i).is_some() {
                return Err(VoyageError::Config(format!(
                    "worker class {} declared twice",
                    class.worker_class
                )));
            }
        }
        Ok(Self { classes, index })
    }

    /// All classes in declaration order.
    pub fn classes(&self) -> &[WorkerCapability] {
        &self.classes
    }

    /// Look up a class by name.
    pub fn get(&self, worker_class: &str) -> Option<&WorkerCapability> {
        self.position(worker_class).map(|i| &self.classes[i])
    }

    /// Declaration index of a class.
    pub fn position(&self, worker_class: &str) -> Option<usize> {
        self.index.get(worker_class).copied()
    }

    /// Capacity of a class; unknown classes have none.
    pub fn capacity_of(&self, worker_class: &str) -> usize {
        self.get(worker_class).map_or(0, |c| c.max_concurrent_queries)
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Always `false` for a constructed registry.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        let classes = WorkerCapability::defaults();
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.worker_class.clone(), i))
            .collect();
        Self { classes, index }
    }
}
