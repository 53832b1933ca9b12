// src/page/html.rs
// =============================================================================
// This module extracts crawlable links from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// Links come from two places, in this order:
// 1. <a href="..."> tags
// 2. <form action="..."> tags
//
// Each raw value is cleaned up, resolved against the page URL, stripped of
// its #fragment and then run through UrlFilter. The `url` crate's
// serialization takes care of percent-encoding.
// =============================================================================

use scraper::{Html, Selector};
use url::Url;

use super::filter::UrlFilter;
use super::LinkExtractor;

/// scraper-backed [`LinkExtractor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, body: &str, base_url: &str) -> Vec<String> {
        extract_links(body, base_url)
    }
}

// Extracts all crawlable links from HTML content
//
// Parameters:
//   html: the HTML content to parse (borrowed as &str)
//   base_url: the URL of the page (for resolving relative links)
//
// Returns: absolute URLs in document order, <a> tags first
//
// Example:
//   html = "<a href='/docs#intro'>Docs</a>"
//   base_url = "https://example.com"
//   result = ["https://example.com/docs"]
pub fn extract_links(html: &str, base_url: &str) -> Vec<String> {
    let mut links = Vec::new();

    // Parse the base URL once
    // A page whose own URL doesn't parse can't have relative links resolved
    let base = match Url::parse(base_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("invalid base URL '{base_url}': {e}");
            return links;
        }
    };

    let document = Html::parse_document(html);

    // Constant selectors, known to be valid
    let anchors = Selector::parse("a[href]").unwrap();
    let forms = Selector::parse("form[action]").unwrap();

    let sources = [(&anchors, "href"), (&forms, "action")];
    for (selector, attr) in sources {
        for element in document.select(selector) {
            let Some(raw) = element.value().attr(attr) else {
                continue;
            };
            // A bad link only costs us that link
            if let Some(link) = resolve_url(&base, raw) {
                if UrlFilter::is_valid_link(&link) {
                    links.push(link);
                }
            }
        }
    }

    links
}

// Resolves a possibly-relative URL to an absolute, fragment-free URL
//
// Examples:
//   base = "https://example.com/page/"
//   raw = "../other#top" -> Some("https://example.com/other")
//   raw = "\"https://other.com\"" -> Some("https://other.com/")
//   raw = "http://[broken" -> None
fn resolve_url(base: &Url, raw: &str) -> Option<String> {
    // Some pages write escaped quotes into attributes: href=\"http://...\"
    // Slashes stay: "/docs" means the host root, not the current directory
    let cleaned = raw.trim_matches(|c: char| c.is_whitespace() || c == '\\' || c == '"');

    let mut url = base.join(cleaned).ok()?;
    url.set_fragment(None);
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<a href="https://www.rust-lang.org">Rust</a>"#;
        let links = extract_links(html, "https://example.com");
        assert_eq!(links, vec!["https://www.rust-lang.org/"]);
    }

    #[test]
    fn test_resolve_relative_link() {
        let html = r#"<a href="/docs">Docs</a><a href="intro">Intro</a>"#;
        let links = extract_links(html, "https://example.com/guide/page");
        assert_eq!(
            links,
            vec!["https://example.com/docs", "https://example.com/guide/intro"]
        );
    }

    #[test]
    fn test_escaped_quotes_trimmed_slashes_kept() {
        let html = r#"<a href='\"/about/\"'>About</a><a href=" /team ">Team</a>"#;
        let links = extract_links(html, "https://example.com/guide/page");
        assert_eq!(
            links,
            vec!["https://example.com/about/", "https://example.com/team"]
        );
    }

    #[test]
    fn test_strips_fragment() {
        let html = r##"<a href="/docs#install">Docs</a>"##;
        let links = extract_links(html, "https://example.com");
        assert_eq!(links, vec!["https://example.com/docs"]);
    }

    #[test]
    fn test_anchors_before_forms() {
        let html = r#"
            <form action="/search"></form>
            <a href="/about">About</a>
        "#;
        let links = extract_links(html, "https://example.com");
        assert_eq!(
            links,
            vec!["https://example.com/about", "https://example.com/search"]
        );
    }

    #[test]
    fn test_skips_non_http_and_files() {
        let html = r#"
            <a href="mailto:test@example.com">Email</a>
            <a href="javascript:void(0)">JS</a>
            <a href="/logo.png">Logo</a>
            <a href="/report.PDF">Report</a>
            <a href="/a+b">Plus</a>
            <a href="/ok">Ok</a>
        "#;
        let links = extract_links(html, "https://example.com");
        assert_eq!(links, vec!["https://example.com/ok"]);
    }

    #[test]
    fn test_escaped_quotes_and_percent_encoding() {
        let html = r#"<a href='\"https://example.com/a b\"'>x</a><a href="/café">y</a>"#;
        let links = extract_links(html, "https://example.com");
        assert_eq!(
            links,
            vec!["https://example.com/a%20b", "https://example.com/caf%C3%A9"]
        );
    }

    #[test]
    fn test_invalid_base_yields_nothing() {
        let html = r#"<a href="/docs">Docs</a>"#;
        assert!(extract_links(html, "not a url").is_empty());
    }
}
