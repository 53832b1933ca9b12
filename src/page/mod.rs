// src/page/mod.rs
// =============================================================================
// Everything a crawl task needs to turn a URL into a list of new URLs.
//
// The crawl engine only talks to the four traits below. Each one has a
// default implementation in a submodule:
// - http: HttpFetcher downloads pages with reqwest
// - encoding: MetaCharsetDetector reads <meta charset> and decodes bodies
// - html: HtmlLinkExtractor pulls links out of <a> and <form> tags
// - filter: UrlFilter checks and SuffixDomainClassifier
//
// Tests swap in their own implementations to crawl an in-memory "web".
// =============================================================================

mod encoding;
mod filter;
mod html;
mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::crawl::Strategy;
use crate::error::{CrawlError, FetchError};

pub use encoding::{decode_body, MetaCharsetDetector};
pub use filter::{SuffixDomainClassifier, UrlFilter};
pub use html::HtmlLinkExtractor;
pub use http::HttpFetcher;

/// Raw page body plus the charset the transport reported, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub body: Vec<u8>,
    pub encoding: Option<String>,
}

impl FetchedPage {
    /// A UTF-8 page whose transport declared its charset.
    pub fn utf8(body: impl Into<String>) -> Self {
        Self {
            body: body.into().into_bytes(),
            encoding: Some("utf-8".to_string()),
        }
    }
}

/// Downloads one page.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Guesses a charset from the body when the transport gave none.
pub trait EncodingDetector: Send + Sync {
    fn detect(&self, body: &str) -> Option<String>;
}

/// Finds candidate links in a page.
///
/// Returned URLs are absolute, fragment-free, percent-encoded, http(s) only,
/// and don't point at known non-HTML files.
pub trait LinkExtractor: Send + Sync {
    fn extract(&self, body: &str, base_url: &str) -> Vec<String>;
}

/// Maps a host to its registrable ("first-level") domain.
pub trait DomainClassifier: Send + Sync {
    fn first_level_domain(&self, host: &str) -> String;
}

/// The set of collaborators a crawl runs with.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn Fetcher>,
    pub detector: Arc<dyn EncodingDetector>,
    pub extractor: Arc<dyn LinkExtractor>,
    pub classifier: Arc<dyn DomainClassifier>,
}

impl Collaborators {
    /// The real thing: reqwest, scraper and the suffix classifier.
    pub fn http(strategy: &Strategy) -> Result<Self, CrawlError> {
        Ok(Self::with_fetcher(Arc::new(HttpFetcher::new(strategy)?)))
    }

    /// Default parsing collaborators around a custom fetcher.
    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            detector: Arc::new(MetaCharsetDetector),
            extractor: Arc::new(HtmlLinkExtractor),
            classifier: Arc::new(SuffixDomainClassifier),
        }
    }
}
