// src/page/filter.rs
// =============================================================================
// URL checks used when deciding whether a link is worth crawling.
//
// UrlFilter groups small, stateless predicates:
// - check_scheme: only http and https
// - check_invalid_char: no quotes, backslashes, spaces, CR/LF or '+'
// - check_invalid_extension: not an image, media, archive, document or
//   executable file
// - is_same_host / is_same_domain: containment policy
//
// SuffixDomainClassifier answers "what is the registrable domain of this
// host?" with a short built-in rule instead of the full public suffix list:
// the last two labels, or the last three for hosts like "news.bbc.co.uk".
// =============================================================================

use std::net::IpAddr;

use url::Url;

use super::DomainClassifier;

const INVALID_CHARS: &[char] = &['\'', '"', '\\', ' ', '\n', '\r', '+'];

const INVALID_EXTENSIONS: &[&str] = &[
    // images
    "jpg", "gif", "bmp", "jpeg", "png",
    // audio / video
    "swf", "mp3", "wma", "wmv", "wav", "mid", "ape", "mpg", "mpeg", "rm", "rmvb", "avi", "mkv",
    // archives
    "zip", "rar", "gz", "iso", "jar",
    // documents
    "doc", "docx", "ppt", "pptx", "chm", "pdf",
    // executables
    "exe", "msi",
];

// Second-level labels that sit under a country code, as in example.co.uk
const GENERIC_SECOND_LEVEL: &[&str] = &["com", "net", "org", "gov", "edu", "ac", "co"];

/// Stateless URL predicates.
pub struct UrlFilter;

impl UrlFilter {
    pub fn check_scheme(url: &str) -> bool {
        Url::parse(url)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false)
    }

    pub fn check_invalid_char(url: &str) -> bool {
        !url.contains(INVALID_CHARS)
    }

    /// False when the last path segment ends in a known non-HTML extension.
    pub fn check_invalid_extension(url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let last_segment = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or("");
        match last_segment.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_ascii_lowercase();
                !INVALID_EXTENSIONS.contains(&ext.as_str())
            }
            None => true,
        }
    }

    /// All three checks the link extractor applies.
    pub fn is_valid_link(url: &str) -> bool {
        Self::check_scheme(url) && Self::check_invalid_char(url) && Self::check_invalid_extension(url)
    }

    /// Same host name and same port.
    pub fn is_same_host(first: &str, second: &str) -> bool {
        match (Url::parse(first), Url::parse(second)) {
            (Ok(a), Ok(b)) => a.host_str().is_some() && a.host_str() == b.host_str() && a.port() == b.port(),
            _ => false,
        }
    }

    /// Same registrable domain according to `classifier`.
    pub fn is_same_domain(first: &str, second: &str, classifier: &dyn DomainClassifier) -> bool {
        let host = |url: &str| Url::parse(url).ok()?.host_str().map(str::to_string);
        match (host(first), host(second)) {
            (Some(a), Some(b)) => classifier.first_level_domain(&a) == classifier.first_level_domain(&b),
            _ => false,
        }
    }
}

/// Registrable-domain rule based on label suffixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuffixDomainClassifier;

impl DomainClassifier for SuffixDomainClassifier {
    fn first_level_domain(&self, host: &str) -> String {
        let host = host.trim_end_matches('.').to_ascii_lowercase();

        if host.trim_matches(|c| c == '[' || c == ']').parse::<IpAddr>().is_ok() {
            return host;
        }

        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() <= 2 {
            return host;
        }

        let tld = labels[labels.len() - 1];
        let second = labels[labels.len() - 2];
        let keep = if tld.len() == 2 && GENERIC_SECOND_LEVEL.contains(&second) {
            3
        } else {
            2
        };
        labels[labels.len() - keep..].join(".")
    }
}
