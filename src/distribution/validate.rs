//! Post-hoc checks on a [`Distribution`].
//!
//! Validation never fails. Capacity problems and idle classes are reported
//! as warnings; only a broken conservation check indicates a bug.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capability::CapabilityRegistry;
use crate::query::Query;

use super::Distribution;

/// A non-fatal finding about a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValidationWarning {
    /// A class holds more queries than its declared capacity.
    #[serde(rename_all = "camelCase")]
    OverCapacity {
        worker_class: String,
        assigned: usize,
        capacity: usize,
    },
    /// A registered class received no queries.
    #[serde(rename_all = "camelCase")]
    IdleWorkerClass { worker_class: String },
    /// An assignment names a class the registry does not know.
    #[serde(rename_all = "camelCase")]
    UnknownWorkerClass { worker_class: String },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverCapacity {
                worker_class,
                assigned,
                capacity,
            } => write!(f, "{worker_class} holds {assigned} queries, capacity {capacity}"),
            Self::IdleWorkerClass { worker_class } => write!(f, "{worker_class} has no queries"),
            Self::UnknownWorkerClass { worker_class } => {
                write!(f, "{worker_class} is not a registered worker class")
            }
        }
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Every original query appears in exactly one assignment.
    pub conserved: bool,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// Conserved and without warnings.
    pub fn is_clean(&self) -> bool {
        self.conserved && self.warnings.is_empty()
    }

    /// Warnings about capacity only.
    pub fn over_capacity(&self) -> impl Iterator<Item = &ValidationWarning> {
        self.warnings
            .iter()
            .filter(|w| matches!(w, ValidationWarning::OverCapacity { .. }))
    }
}

/// Check conservation, capacity and class usage.
pub fn validate(distribution: &Distribution, registry: &CapabilityRegistry) -> ValidationReport {
    let conserved = conserves(distribution);
    if !conserved {
        tracing::error!(
            original = distribution.original_queries.len(),
            assigned = distribution.assigned_count(),
            strategy = %distribution.strategy,
            "distribution does not conserve its queries"
        );
    }

    let mut per_class: HashMap<&str, usize> = HashMap::new();
    for assignment in &distribution.assignments {
        *per_class.entry(assignment.worker_class.as_str()).or_default() += assignment.len();
    }

    let mut warnings = Vec::new();
    for class in registry.classes() {
        match per_class.get(class.worker_class.as_str()).copied() {
            None | Some(0) => warnings.push(ValidationWarning::IdleWorkerClass {
                worker_class: class.worker_class.clone(),
            }),
            Some(assigned) if assigned > class.max_concurrent_queries => {
                warnings.push(ValidationWarning::OverCapacity {
                    worker_class: class.worker_class.clone(),
                    assigned,
                    capacity: class.max_concurrent_queries,
                });
            }
            Some(_) => {}
        }
    }

    let mut unknown: Vec<&str> = per_class
        .keys()
        .copied()
        .filter(|name| registry.get(name).is_none())
        .collect();
    unknown.sort_unstable();
    warnings.extend(unknown.into_iter().map(|name| ValidationWarning::UnknownWorkerClass {
        worker_class: name.to_owned(),
    }));

    for warning in &warnings {
        tracing::debug!(%warning, "distribution warning");
    }
    ValidationReport {
        conserved,
        warnings,
    }
}

/// Same count and the same multiset of queries.
fn conserves(distribution: &Distribution) -> bool {
    if distribution.assigned_count() != distribution.original_queries.len() {
        return false;
    }
    let mut balance: HashMap<&Query, isize> = HashMap::new();
    for query in &distribution.original_queries {
        *balance.entry(query).or_default() += 1;
    }
    for query in distribution.assignments.iter().flat_map(|a| &a.queries) {
        *balance.entry(query).or_default() -= 1;
    }
    balance.values().all(|&n| n == 0)
}
