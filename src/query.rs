//! Query model produced by the upstream query generator.

use std::fmt;

use serde::{Deserialize, Serialize};
use voyage_search::SearchRequest;

/// Query urgency. Orders `High < Medium < Low`, so an ascending sort puts
/// urgent work first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Stable lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One information need, tagged with where it should be worked on.
///
/// Immutable once created: strategies move queries between worker classes
/// but never alter them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// Free-text query.
    pub text: String,
    /// Query category, matched against worker `supported_categories`.
    pub category: String,
    /// Urgency.
    pub priority: Priority,
    /// Worker class the generator would like this query to land on.
    pub target_worker_class: String,
    /// Optional preferred search provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hint: Option<String>,
}

impl Query {
    /// Create a query without a source hint.
    pub fn new(
        text: impl Into<String>,
        category: impl Into<String>,
        priority: Priority,
        target_worker_class: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
            priority,
            target_worker_class: target_worker_class.into(),
            source_hint: None,
        }
    }

    /// Attach a preferred search provider.
    pub fn with_source_hint(mut self, hint: impl Into<String>) -> Self {
        self.source_hint = Some(hint.into());
        self
    }

    /// Build the search request sent to the orchestrator for this query.
    ///
    /// The source hint becomes the provider hint.
    pub fn to_search_request(&self) -> SearchRequest {
        let request = SearchRequest::new(self.text.clone());
        match self.source_hint {
            Some(ref hint) => request.with_provider_hint(hint.clone()),
            None => request,
        }
    }
}

/// Opaque user-intent data that informed query generation.
///
/// Carried alongside a batch; only the batch shape influences distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryContext {
    /// Short statement of what the user is after.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_intent: Option<String>,
    /// Free-form generator attributes.
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

/// A batch of queries plus the context they were generated under, as read
/// from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryBatch {
    pub queries: Vec<Query>,
    #[serde(default)]
    pub context: QueryContext,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn priority_orders_high_first() {
        let mut priorities = vec![Priority::Low, Priority::High, Priority::Medium];
        priorities.sort();
        assert_eq!(priorities, vec![Priority::High, Priority::Medium, Priority::Low]);
    }

    #[test]
    fn source_hint_becomes_provider_hint() {
        let query = Query::new("alaska cruise deals", "search", Priority::High, "retrieval")
            .with_source_hint("cruise-db");
        let request = query.to_search_request();
        assert_eq!(request.query_text, "alaska cruise deals");
        assert_eq!(request.provider_hint.as_deref(), Some("cruise-db"));
    }

    #[test]
    fn query_without_hint_has_no_provider_hint() {
        let request = Query::new("q", "search", Priority::Low, "retrieval").to_search_request();
        assert!(request.provider_hint.is_none());
    }

    #[test]
    fn batch_parses_camel_case_json() {
        let batch: QueryBatch = serde_json::from_str(
            r#"{
                "queries": [
                    {"text": "visa rules", "category": "factual", "priority": "high", "targetWorkerClass": "retrieval"},
                    {"text": "itinerary", "category": "planning", "priority": "low", "targetWorkerClass": "planning", "sourceHint": "web"}
                ],
                "context": {"userIntent": "two weeks in japan", "attributes": {"budget": "mid"}}
            }"#,
        )
        .unwrap();
        assert_eq!(batch.queries.len(), 2);
        assert_eq!(batch.queries[1].source_hint.as_deref(), Some("web"));
        assert_eq!(batch.context.user_intent.as_deref(), Some("two weeks in japan"));
        assert_eq!(batch.context.attributes["budget"], "mid");
    }

    #[test]
    fn batch_context_is_optional() {
        let batch: QueryBatch = serde_json::from_str(r#"{"queries": []}"#).unwrap();
        assert!(batch.queries.is_empty());
        assert_eq!(batch.context, QueryContext::default());
    }
}
