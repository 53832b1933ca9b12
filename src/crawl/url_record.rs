// src/crawl/url_record.rs
// =============================================================================
// A URL waiting to be crawled (or already crawled), plus its depth.
//
// Two records are the same record when their normalized URLs are equal. Depth
// is deliberately left out of Eq/Hash: the first depth a URL was admitted at
// is the one it keeps, and a later rediscovery at any other depth is ignored.
//
// Normalization is intentionally light:
// - surrounding whitespace and slashes are trimmed
// - "http://" is prefixed when the string has no http(s) scheme
// It is idempotent: normalize(normalize(u)) == normalize(u).
// =============================================================================

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::error::CrawlError;

/// A normalized absolute URL and the number of link-hops from the root.
#[derive(Debug, Clone, Serialize)]
pub struct UrlRecord {
    url: String,
    depth: usize,
}

impl UrlRecord {
    /// Normalizes `raw` and pairs it with `depth`.
    ///
    /// Fails when nothing is left after trimming (e.g. `""` or `"///"`).
    pub fn new(raw: &str, depth: usize) -> Result<Self, CrawlError> {
        let url = normalize(raw);
        if url.is_empty() {
            return Err(CrawlError::invalid_url(raw, "empty after normalization"));
        }
        Ok(Self { url, depth })
    }

    /// A record for the crawl root (depth 0).
    pub fn root(raw: &str) -> Result<Self, CrawlError> {
        Self::new(raw, 0)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl PartialEq for UrlRecord {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for UrlRecord {}

impl Hash for UrlRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

impl fmt::Display for UrlRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Canonical form used as the visited-set key.
///
/// Returns an empty string when the input is only whitespace and slashes.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim_matches(|c: char| c == '/' || c.is_whitespace());
    if trimmed.is_empty() {
        return String::new();
    }
    if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_prefixes_missing_scheme() {
        assert_eq!(normalize("example.com/docs"), "http://example.com/docs");
    }

    #[test]
    fn test_trims_slashes_and_whitespace() {
        assert_eq!(normalize("  https://example.com/docs/ "), "https://example.com/docs");
        assert_eq!(normalize("//example.com//"), "http://example.com");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "example.com",
            "https://example.com/",
            "/ a /",
            "HTTPS://Example.com/x/",
            "http://",
            "ftp://files.example.com/",
            "https://example.com/path?q=1",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_rejects_empty_input() {
        assert!(UrlRecord::new("", 0).is_err());
        assert!(UrlRecord::new(" /// ", 3).is_err());
    }

    #[test]
    fn test_identity_ignores_depth() {
        let shallow = UrlRecord::new("https://example.com/a", 1).unwrap();
        let deep = UrlRecord::new("https://example.com/a/", 4).unwrap();
        assert_eq!(shallow, deep);

        let mut set = HashSet::new();
        set.insert(shallow);
        assert!(!set.insert(deep));
        assert_eq!(set.iter().next().unwrap().depth(), 1);
    }

    #[test]
    fn test_root_is_depth_zero() {
        let root = UrlRecord::root("example.com").unwrap();
        assert_eq!(root.depth(), 0);
        assert_eq!(root.to_string(), "http://example.com");
    }
}
