//! Content-based provider routing.
//!
//! Rules are tried in order and the first match wins:
//!
//! 0. `provider_hint` names a registered provider: that provider alone.
//! 1. The query uses cruise vocabulary and a cruise provider exists: it alone.
//! 2. Neural search is asked for explicitly (hint `neural`/`semantic`), or the
//!    query reads like a semantic lookup, and a neural provider exists: it alone.
//! 3. The general-web set: primary first, then secondary (both when present).
//!
//! An empty selection means no provider can serve the request.

use std::fmt;

use crate::registry::{ProviderRegistry, RegisteredProvider, Specialty};
use crate::types::SearchRequest;

/// Single words that only ever mean cruising.
const CRUISE_WORDS: &[&str] = &[
    "cruise",
    "cruises",
    "cruising",
    "stateroom",
    "staterooms",
    "embarkation",
    "disembarkation",
];

/// Multi-word cruise phrases. General nautical words (`ship`, `cabin`,
/// `tender`, `sailing`) only count inside one of these.
const CRUISE_PHRASES: &[&str] = &[
    "port of call",
    "ports of call",
    "shore excursion",
    "shore excursions",
    "sea day",
    "sea days",
    "ship cabin",
    "ship cabins",
    "tender boat",
    "tender boats",
    "sailing itinerary",
    "sailing itineraries",
];

/// Words suggesting the caller wants meaning-based rather than keyword matching.
const SEMANTIC_WORDS: &[&str] = &[
    "similar",
    "alternatives",
    "comparable",
    "recommend",
    "recommendations",
    "ideas",
    "inspiration",
    "vibe",
];

/// Multi-word semantic phrases.
const SEMANTIC_PHRASES: &[&str] = &["related to", "alternative to", "something like", "places like"];

/// Provider hints that explicitly request neural search.
const NEURAL_HINTS: &[&str] = &["neural", "semantic"];

/// Which routing rule produced a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `provider_hint` named a registered provider.
    Hinted,
    /// Cruise vertical.
    Cruise,
    /// Neural / semantic provider.
    Neural,
    /// Primary and secondary general-web providers.
    General,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hinted => "hinted",
            Self::Cruise => "cruise",
            Self::Neural => "neural",
            Self::General => "general",
        })
    }
}

/// Providers chosen for one request, in call order.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Rule that matched.
    pub route: Route,
    /// Providers to call.
    pub providers: Vec<RegisteredProvider>,
}

/// Pick providers for `request`.
pub fn select_providers(request: &SearchRequest, registry: &ProviderRegistry) -> Selection {
    let hint = request
        .provider_hint
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty());

    if let Some(provider) = hint.and_then(|h| registry.get(h)) {
        return single(Route::Hinted, provider);
    }

    let text = normalise_text(&request.query_text);

    if mentions_any(&text, CRUISE_WORDS, CRUISE_PHRASES) {
        if let Some(provider) = registry.first_with(Specialty::Cruise) {
            return single(Route::Cruise, provider);
        }
    }

    let explicit_neural =
        hint.is_some_and(|h| NEURAL_HINTS.iter().any(|n| h.eq_ignore_ascii_case(n)));
    if explicit_neural || mentions_any(&text, SEMANTIC_WORDS, SEMANTIC_PHRASES) {
        if let Some(provider) = registry.first_with(Specialty::Neural) {
            return single(Route::Neural, provider);
        }
    }

    let providers = [Specialty::Primary, Specialty::Secondary]
        .iter()
        .filter_map(|s| registry.first_with(*s).cloned())
        .collect();
    Selection {
        route: Route::General,
        providers,
    }
}

/// Drop providers the health table marks unhealthy, unless that would leave none.
pub fn prefer_healthy(
    providers: Vec<RegisteredProvider>,
    registry: &ProviderRegistry,
) -> Vec<RegisteredProvider> {
    let (healthy, unhealthy): (Vec<_>, Vec<_>) = providers
        .into_iter()
        .partition(|p| registry.is_healthy(&p.name));

    if healthy.is_empty() {
        if !unhealthy.is_empty() {
            tracing::warn!(
                count = unhealthy.len(),
                "all selected providers are unhealthy, using them anyway"
            );
        }
        return unhealthy;
    }
    for skipped in &unhealthy {
        tracing::info!(provider = %skipped.name, "skipping unhealthy provider");
    }
    healthy
}

fn single(route: Route, provider: &RegisteredProvider) -> Selection {
    Selection {
        route,
        providers: vec![provider.clone()],
    }
}

/// Lowercase and collapse the query into single-space-separated tokens,
/// padded with spaces so whole-word matching is a plain substring test.
fn normalise_text(raw: &str) -> String {
    let tokens: Vec<String> = raw
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();
    format!(" {} ", tokens.join(" "))
}

fn mentions_any(padded: &str, words: &[&str], phrases: &[&str]) -> bool {
    words
        .iter()
        .chain(phrases.iter())
        .any(|term| padded.contains(&format!(" {term} ")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::error::SearchError;
    use crate::provider::SearchProvider;
    use crate::types::{ProviderStatus, SearchResponse};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Arc;

    struct Named(&'static str);

    #[async_trait]
    impl SearchProvider for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
            Ok(SearchResponse::empty(&request.query_text, self.0))
        }
    }

    fn full_registry() -> ProviderRegistry {
        ProviderRegistry::new()
            .with_provider(Arc::new(Named("secondary")), Specialty::Secondary)
            .unwrap()
            .with_provider(Arc::new(Named("primary")), Specialty::Primary)
            .unwrap()
            .with_provider(Arc::new(Named("cruise-db")), Specialty::Cruise)
            .unwrap()
            .with_provider(Arc::new(Named("exa")), Specialty::Neural)
            .unwrap()
    }

    fn names(selection: &Selection) -> Vec<&str> {
        selection.providers.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn cruise_vocabulary_routes_to_cruise_provider() {
        let sel = select_providers(&SearchRequest::new("Best Alaska cruises in June"), &full_registry());
        assert_eq!(sel.route, Route::Cruise);
        assert_eq!(names(&sel), vec!["cruise-db"]);
    }

    #[test]
    fn cruise_phrase_matches() {
        let sel = select_providers(&SearchRequest::new("top ports of call in Greece"), &full_registry());
        assert_eq!(sel.route, Route::Cruise);
    }

    #[test]
    fn cruise_words_match_whole_words_only() {
        let sel = select_providers(
            &SearchRequest::new("shipping relationship advice"),
            &full_registry(),
        );
        assert_eq!(sel.route, Route::General);
    }

    #[test]
    fn general_nautical_words_stay_on_the_web_providers() {
        for query in [
            "how to ship a parcel to spain",
            "mountain cabin rentals colorado",
            "tender beef stew recipe",
            "sailing lessons for beginners",
            "voyage of the beagle summary",
        ] {
            let sel = select_providers(&SearchRequest::new(query), &full_registry());
            assert_eq!(sel.route, Route::General, "{query}");
            assert_eq!(names(&sel), vec!["primary", "secondary"], "{query}");
        }
    }

    #[test]
    fn nautical_words_in_cruise_phrases_still_route_to_cruise() {
        for query in ["best ship cabin for seasickness", "tender boat to Santorini"] {
            let sel = select_providers(&SearchRequest::new(query), &full_registry());
            assert_eq!(sel.route, Route::Cruise, "{query}");
        }
    }

    #[test]
    fn cruise_without_cruise_provider_falls_through() {
        let registry = ProviderRegistry::new()
            .with_provider(Arc::new(Named("primary")), Specialty::Primary)
            .unwrap();
        let sel = select_providers(&SearchRequest::new("cruise deals"), &registry);
        assert_eq!(sel.route, Route::General);
        assert_eq!(names(&sel), vec!["primary"]);
    }

    #[test]
    fn explicit_neural_hint_routes_to_neural() {
        let req = SearchRequest::new("weather in Oslo").with_provider_hint("semantic");
        let sel = select_providers(&req, &full_registry());
        assert_eq!(sel.route, Route::Neural);
        assert_eq!(names(&sel), vec!["exa"]);
    }

    #[test]
    fn semantic_query_routes_to_neural() {
        let sel = select_providers(
            &SearchRequest::new("destinations similar to Lisbon"),
            &full_registry(),
        );
        assert_eq!(sel.route, Route::Neural);
    }

    #[test]
    fn cruise_rule_beats_neural_rule() {
        let sel = select_providers(
            &SearchRequest::new("cruises similar to Viking").with_provider_hint("neural"),
            &full_registry(),
        );
        assert_eq!(sel.route, Route::Cruise);
    }

    #[test]
    fn hint_naming_provider_wins() {
        let req = SearchRequest::new("alaska cruise").with_provider_hint("secondary");
        let sel = select_providers(&req, &full_registry());
        assert_eq!(sel.route, Route::Hinted);
        assert_eq!(names(&sel), vec!["secondary"]);
    }

    #[test]
    fn general_set_is_primary_then_secondary() {
        let sel = select_providers(&SearchRequest::new("weather in Oslo"), &full_registry());
        assert_eq!(sel.route, Route::General);
        assert_eq!(names(&sel), vec!["primary", "secondary"]);
    }

    #[test]
    fn only_secondary_registered() {
        let registry = ProviderRegistry::new()
            .with_provider(Arc::new(Named("secondary")), Specialty::Secondary)
            .unwrap();
        let sel = select_providers(&SearchRequest::new("anything"), &registry);
        assert_eq!(names(&sel), vec!["secondary"]);
    }

    #[test]
    fn no_general_providers_means_empty_selection() {
        let registry = ProviderRegistry::new()
            .with_provider(Arc::new(Named("cruise-db")), Specialty::Cruise)
            .unwrap();
        let sel = select_providers(&SearchRequest::new("weather in Oslo"), &registry);
        assert!(sel.providers.is_empty());
    }

    #[test]
    fn unhealthy_providers_are_skipped() {
        let registry = full_registry();
        registry.update_status(ProviderStatus {
            name: "primary".into(),
            healthy: false,
            latency_ms: 0,
            error_rate: 1.0,
            last_checked: Utc::now(),
        });
        let sel = select_providers(&SearchRequest::new("weather"), &registry);
        let kept = prefer_healthy(sel.providers, &registry);
        let kept: Vec<_> = kept.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(kept, vec!["secondary"]);
    }

    #[test]
    fn unhealthy_provider_used_when_it_is_the_only_one() {
        let registry = full_registry();
        registry.update_status(ProviderStatus {
            name: "cruise-db".into(),
            healthy: false,
            latency_ms: 0,
            error_rate: 1.0,
            last_checked: Utc::now(),
        });
        let sel = select_providers(&SearchRequest::new("river cruise"), &registry);
        let kept = prefer_healthy(sel.providers, &registry);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "cruise-db");
    }
}
