//! Ranking disciplines applied after deduplication.
//!
//! - Relevance: stable sort by `relevance_score`, highest first.
//! - Recency: stable sort by `published_date`, newest first, undated last.
//! - Diversity: round-robin across source domains, capping each domain at
//!   `ceil(max_results / domains)` before backfilling from whatever is left.
//!
//! Every function here is pure: identical input gives identical output.

use std::collections::{HashMap, VecDeque};

use crate::config::RankingMode;
use crate::types::SearchResultItem;

/// Rank `results` with `mode` and truncate to `max_results`.
pub fn rank(
    results: Vec<SearchResultItem>,
    mode: RankingMode,
    max_results: usize,
) -> Vec<SearchResultItem> {
    let mut ranked = match mode {
        RankingMode::Relevance => by_relevance(results),
        RankingMode::Recency => by_recency(results),
        RankingMode::Diversity => diversify(results, max_results),
    };
    ranked.truncate(max_results);
    ranked
}

/// Stable descending sort by relevance score.
pub fn by_relevance(mut results: Vec<SearchResultItem>) -> Vec<SearchResultItem> {
    results.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    results
}

/// Stable descending sort by publication date. `None` sorts as oldest.
pub fn by_recency(mut results: Vec<SearchResultItem>) -> Vec<SearchResultItem> {
    results.sort_by(|a, b| b.published_date.cmp(&a.published_date));
    results
}

/// Interleave results across source domains.
///
/// Domains are visited in order of first appearance; within a domain, input
/// order is kept. Each round takes one item from every domain that still has
/// items and has not reached the cap `ceil(max_results / domains)`. When every
/// domain is capped or empty and `max_results` is still not reached, a second
/// uncapped round-robin backfills from domains that have items left.
pub fn diversify(results: Vec<SearchResultItem>, max_results: usize) -> Vec<SearchResultItem> {
    if max_results == 0 || results.is_empty() {
        return Vec::new();
    }

    let mut groups: Vec<VecDeque<SearchResultItem>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for item in results {
        let slot = *index.entry(item.source_domain.clone()).or_insert_with(|| {
            groups.push(VecDeque::new());
            groups.len() - 1
        });
        groups[slot].push_back(item);
    }

    let cap = max_results.div_ceil(groups.len());
    let mut taken = vec![0usize; groups.len()];
    let mut out = Vec::with_capacity(max_results);

    round_robin(&mut groups, &mut taken, Some(cap), max_results, &mut out);
    if out.len() < max_results {
        round_robin(&mut groups, &mut taken, None, max_results, &mut out);
    }
    out
}

/// Take one item per eligible group per round until `limit` is hit or no
/// group can contribute.
fn round_robin(
    groups: &mut [VecDeque<SearchResultItem>],
    taken: &mut [usize],
    cap: Option<usize>,
    limit: usize,
    out: &mut Vec<SearchResultItem>,
) {
    loop {
        let mut progressed = false;
        for (group, count) in groups.iter_mut().zip(taken.iter_mut()) {
            if out.len() >= limit {
                return;
            }
            if cap.is_some_and(|c| *count >= c) {
                continue;
            }
            if let Some(item) = group.pop_front() {
                out.push(item);
                *count += 1;
                progressed = true;
            }
        }
        if !progressed {
            return;
        }
    }
}
