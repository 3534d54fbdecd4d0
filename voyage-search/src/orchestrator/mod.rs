//! Search orchestrator: routing, concurrent execution, dedup, ranking.
//!
//! This module selects providers by query content, runs them under a
//! parallel, sequential or fallback strategy with per-call timeouts,
//! deduplicates results by normalised URL, and ranks the survivors by
//! relevance, recency or source diversity.

pub mod dedup;
pub mod execution;
pub mod ranking;
pub mod search;
pub mod selection;
pub mod url_normalize;

pub use search::SearchOrchestrator;
