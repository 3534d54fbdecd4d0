//! URL normalisation for search result deduplication.
//!
//! Two results refer to the same page when they agree on scheme, host,
//! explicit port and path. Query strings (tracking parameters included) and fragments never
//! distinguish results.

use url::Url;

/// Normalise a URL to `scheme://host[:port]/path` for deduplication.
///
/// 1. Scheme and host are lowercased (the `url` crate does this on parse).
/// 2. A port is kept only when it is not the scheme's default.
/// 3. Userinfo, query string and fragment are dropped.
/// 4. The path is kept as-is, including case and any trailing slash.
///
/// If the input cannot be parsed as an absolute URL with a host, the query
/// string and fragment are cut off textually and the rest is returned trimmed.
///
/// # Examples
///
/// ```
/// use voyage_search::orchestrator::url_normalize::normalize_url;
///
/// let a = normalize_url("https://X.com/a?utm=1#frag");
/// let b = normalize_url("https://x.com/a");
/// assert_eq!(a, b);
/// ```
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(parsed) = Url::parse(trimmed) else {
        return strip_suffixes(trimmed).to_owned();
    };
    let Some(host) = parsed.host_str() else {
        return strip_suffixes(trimmed).to_owned();
    };
    match parsed.port() {
        Some(port) => format!("{}://{}:{}{}", parsed.scheme(), host, port, parsed.path()),
        None => format!("{}://{}{}", parsed.scheme(), host, parsed.path()),
    }
}

/// Cut everything from the first `?` or `#`.
fn strip_suffixes(raw: &str) -> &str {
    match raw.find(['?', '#']) {
        Some(idx) => &raw[..idx],
        None => raw,
    }
}
