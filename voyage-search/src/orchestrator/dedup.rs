//! Result deduplication by normalised URL.
//!
//! Keeps the first occurrence of each normalised URL in input order and
//! drops the rest. Applying it to an already-deduplicated list is a no-op.

use std::collections::HashSet;

use crate::types::SearchResultItem;

use super::url_normalize::normalize_url;

/// Deduplicate results by normalised URL, keeping the first-seen entry.
///
/// Title, snippet and score of later duplicates are discarded; relative
/// order of survivors is unchanged.
pub fn deduplicate(results: Vec<SearchResultItem>) -> Vec<SearchResultItem> {
    let mut seen: HashSet<String> = HashSet::with_capacity(results.len());
    let before = results.len();

    let kept: Vec<SearchResultItem> = results
        .into_iter()
        .filter(|item| seen.insert(normalize_url(&item.url)))
        .collect();

    if kept.len() < before {
        tracing::debug!(dropped = before - kept.len(), kept = kept.len(), "deduplicated results");
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(url: &str, title: &str) -> SearchResultItem {
        SearchResultItem::new(url, title).with_snippet(format!("Snippet for {title}"))
    }

    #[test]
    fn unique_urls_pass_through() {
        let deduped = deduplicate(vec![item("https://a.com", "A"), item("https://b.com", "B")]);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn first_seen_entry_wins() {
        let deduped = deduplicate(vec![
            item("https://x.com/a?utm=1#frag", "First"),
            item("https://x.com/a", "Second"),
        ]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].title, "First");
        assert_eq!(deduped[0].snippet, "Snippet for First");
    }

    #[test]
    fn first_seen_wins_even_with_lower_score() {
        let deduped = deduplicate(vec![
            item("https://x.com/a", "Low").with_relevance(0.1),
            item("https://x.com/a", "High").with_relevance(0.9),
        ]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].title, "Low");
    }

    #[test]
    fn order_of_survivors_is_preserved() {
        let deduped = deduplicate(vec![
            item("https://c.com", "C"),
            item("https://a.com", "A"),
            item("https://c.com/", "C again"),
            item("https://b.com", "B"),
        ]);
        let titles: Vec<_> = deduped.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "A", "B"]);
    }

    #[test]
    fn deduplication_is_idempotent() {
        let input = vec![
            item("https://x.com/a?b=1", "A"),
            item("https://X.com/a", "A2"),
            item("https://y.com/", "Y"),
            item("https://y.com/#top", "Y2"),
            item("not a url", "N"),
            item("not a url#x", "N2"),
        ];
        let once = deduplicate(input);
        let twice = deduplicate(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn empty_input_returns_empty() {
        assert!(deduplicate(vec![]).is_empty());
    }
}
