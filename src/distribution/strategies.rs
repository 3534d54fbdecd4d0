//! The four assignment strategies.
//!
//! Each is a pure function `(queries, registry, config) -> assignments`.
//! Output assignments follow worker class declaration order and omit
//! classes that received nothing. A query whose target class is not
//! registered is treated as targeting a class with no capacity.

use tracing::{debug, warn};

use crate::capability::CapabilityRegistry;
use crate::query::{Priority, Query};

use super::{Assignment, DistributionConfig, Strategy};

/// Run `strategy`.
pub fn assign(
    strategy: Strategy,
    queries: &[Query],
    registry: &CapabilityRegistry,
    config: &DistributionConfig,
) -> Vec<Assignment> {
    match strategy {
        Strategy::Simple => simple(queries, registry, config),
        Strategy::PriorityBased => priority_based(queries, registry, config),
        Strategy::LoadBalanced => load_balanced(queries, registry, config),
        Strategy::Balanced => balanced(queries, registry, config),
    }
}

/// Group by target class. Anything a class cannot hold goes to the
/// fallback class, with no further rebalancing.
pub fn simple(
    queries: &[Query],
    registry: &CapabilityRegistry,
    config: &DistributionConfig,
) -> Vec<Assignment> {
    let fallback = fallback_index(registry, config);
    let mut placement = Placement::new(registry);
    let mut spilled = 0usize;

    for query in queries {
        match registry.position(&query.target_worker_class) {
            Some(i) if placement.has_room(i) => placement.push(i, query.clone()),
            _ => {
                spilled += 1;
                placement.push(fallback, query.clone());
            }
        }
    }
    if spilled > 0 {
        debug!(spilled, fallback_class = %config.fallback_class, "overflow moved to fallback class");
    }
    placement.into_assignments()
}

/// High-priority queries go to the immediate classes first; medium then low
/// go to the deferred classes. Produces two tiers: `High` and `Medium`.
pub fn priority_based(
    queries: &[Query],
    registry: &CapabilityRegistry,
    config: &DistributionConfig,
) -> Vec<Assignment> {
    let fallback = fallback_index(registry, config);
    let immediate = resolve(&config.immediate_classes, registry, fallback);
    let deferred = resolve(&config.deferred_classes, registry, fallback);

    let (high, mut rest): (Vec<&Query>, Vec<&Query>) =
        queries.iter().partition(|q| q.priority == Priority::High);
    rest.sort_by_key(|q| q.priority);

    let mut first = Placement::new(registry);
    for query in high {
        let i = first.choose_within(query, &immediate, fallback);
        first.push(i, query.clone());
    }

    let mut second = Placement::continuing(registry, first.load.clone());
    for query in rest {
        let i = second.choose_within(query, &deferred, fallback);
        second.push(i, query.clone());
    }

    let mut assignments = first.into_tier(Priority::High);
    assignments.extend(second.into_tier(Priority::Medium));
    assignments
}

/// Most urgent first. Each query goes to its target class while it has
/// room, else to the least-loaded class with room that supports its
/// category (ties to the earlier-declared class).
pub fn load_balanced(
    queries: &[Query],
    registry: &CapabilityRegistry,
    config: &DistributionConfig,
) -> Vec<Assignment> {
    let fallback = fallback_index(registry, config);
    let all: Vec<usize> = (0..registry.len()).collect();
    let mut ordered: Vec<&Query> = queries.iter().collect();
    ordered.sort_by_key(|q| q.priority);

    let mut placement = Placement::new(registry);
    let mut over = 0usize;
    for query in ordered {
        let target = registry.position(&query.target_worker_class);
        let i = match target {
            Some(i) if placement.has_room(i) => i,
            _ => match placement.least_loaded(&all, &query.category) {
                Some(j) => j,
                None => {
                    over += 1;
                    target.unwrap_or(fallback)
                }
            },
        };
        placement.push(i, query.clone());
    }
    if over > 0 {
        warn!(over, "no worker class had room; some queries exceed capacity");
    }
    placement.into_assignments()
}

/// Group by target class, then move each class's overflow one query at a
/// time to the least-loaded class with room that supports its category.
/// Overflow with nowhere to go stays on its original class.
pub fn balanced(
    queries: &[Query],
    registry: &CapabilityRegistry,
    config: &DistributionConfig,
) -> Vec<Assignment> {
    let fallback = fallback_index(registry, config);
    let all: Vec<usize> = (0..registry.len()).collect();
    let mut placement = Placement::new(registry);
    let mut homeless = Vec::new();

    for query in queries {
        match registry.position(&query.target_worker_class) {
            Some(i) => placement.push(i, query.clone()),
            None => homeless.push(query),
        }
    }

    let mut moved = 0usize;
    let mut stuck = 0usize;
    for i in 0..registry.len() {
        let capacity = placement.capacity(i);
        if placement.queues[i].len() <= capacity {
            continue;
        }
        let overflow = placement.queues[i].split_off(capacity);
        placement.load[i] = capacity;
        for query in overflow {
            match placement.least_loaded(&all, &query.category) {
                Some(j) => {
                    moved += 1;
                    placement.push(j, query);
                }
                None => {
                    stuck += 1;
                    placement.push(i, query);
                }
            }
        }
    }

    for query in homeless {
        let i = placement
            .least_loaded(&all, &query.category)
            .unwrap_or(fallback);
        placement.push(i, query.clone());
    }

    debug!(moved, "rebalanced overflow");
    if stuck > 0 {
        warn!(stuck, "overflow left on overloaded classes");
    }
    placement.into_assignments()
}

fn fallback_index(registry: &CapabilityRegistry, config: &DistributionConfig) -> usize {
    registry.position(&config.fallback_class).unwrap_or(0)
}

/// Indices of the named classes; the fallback class alone if none resolve.
fn resolve(names: &[String], registry: &CapabilityRegistry, fallback: usize) -> Vec<usize> {
    let indices: Vec<usize> = names.iter().filter_map(|n| registry.position(n)).collect();
    if indices.is_empty() {
        vec![fallback]
    } else {
        indices
    }
}

/// Per-class queues in declaration order, with load counters.
struct Placement<'a> {
    registry: &'a CapabilityRegistry,
    queues: Vec<Vec<Query>>,
    load: Vec<usize>,
}

impl<'a> Placement<'a> {
    fn new(registry: &'a CapabilityRegistry) -> Self {
        Self::continuing(registry, vec![0; registry.len()])
    }

    /// Empty queues over an existing load, so a second tier shares capacity
    /// with the first.
    fn continuing(registry: &'a CapabilityRegistry, load: Vec<usize>) -> Self {
        Self {
            registry,
            queues: vec![Vec::new(); registry.len()],
            load,
        }
    }

    fn capacity(&self, i: usize) -> usize {
        self.registry.classes()[i].max_concurrent_queries
    }

    fn has_room(&self, i: usize) -> bool {
        self.load[i] < self.capacity(i)
    }

    fn push(&mut self, i: usize, query: Query) {
        self.queues[i].push(query);
        self.load[i] += 1;
    }

    /// Least-loaded candidate with room that supports `category`.
    fn least_loaded(&self, candidates: &[usize], category: &str) -> Option<usize> {
        candidates
            .iter()
            .copied()
            .filter(|&i| self.has_room(i) && self.registry.classes()[i].supports(category))
            .min_by_key(|&i| (self.load[i], i))
    }

    /// Target if it is in `set` with room, else the least-loaded eligible
    /// member, else the target if in `set`, else the least-loaded member.
    fn choose_within(&self, query: &Query, set: &[usize], fallback: usize) -> usize {
        let target = self
            .registry
            .position(&query.target_worker_class)
            .filter(|i| set.contains(i));
        if let Some(i) = target.filter(|&i| self.has_room(i)) {
            return i;
        }
        if let Some(i) = self.least_loaded(set, &query.category) {
            return i;
        }
        target.unwrap_or_else(|| {
            set.iter()
                .copied()
                .min_by_key(|&i| (self.load[i], i))
                .unwrap_or(fallback)
        })
    }

    fn into_assignments(self) -> Vec<Assignment> {
        self.registry
            .classes()
            .iter()
            .zip(self.queues)
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(class, queue)| Assignment::new(class.worker_class.clone(), queue))
            .collect()
    }

    fn into_tier(self, tier: Priority) -> Vec<Assignment> {
        self.registry
            .classes()
            .iter()
            .zip(self.queues)
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(class, queue)| Assignment::with_tier(class.worker_class.clone(), queue, tier))
            .collect()
    }
}
