//! Strategy selection from batch shape.

use crate::query::{Priority, Query, QueryContext};

use super::{DistributionConfig, Strategy};

/// Pick the assignment strategy for a batch.
///
/// Rules, first match wins:
///
/// 1. At most `simple_max_queries` queries: [`Strategy::Simple`]
/// 2. High-priority share above `priority_dominance`: [`Strategy::PriorityBased`]
/// 3. More than `load_balance_min_queries` queries: [`Strategy::LoadBalanced`]
/// 4. Otherwise [`Strategy::Balanced`]
///
/// Pure and deterministic. The context is accepted for callers that carry
/// one but does not influence the choice.
pub fn select_strategy(
    queries: &[Query],
    _context: &QueryContext,
    config: &DistributionConfig,
) -> Strategy {
    let total = queries.len();
    if total <= config.simple_max_queries {
        return Strategy::Simple;
    }

    let high = queries.iter().filter(|q| q.priority == Priority::High).count();
    if high as f64 / total as f64 > config.priority_dominance {
        return Strategy::PriorityBased;
    }

    if total > config.load_balance_min_queries {
        return Strategy::LoadBalanced;
    }
    Strategy::Balanced
}
