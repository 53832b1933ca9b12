// src/crawl/strategy.rs
// =============================================================================
// Crawl configuration.
//
// A Strategy is built once (through StrategyBuilder) and never changes after
// that. The scheduler wraps it in an Arc and every crawl task reads from the
// same copy.
//
// Header and cookie defaults are produced by a function, not stored in a
// shared static, so every Strategy gets its own maps. Changing one crawl's
// headers can never leak into another crawl.
// =============================================================================

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};

use crate::error::CrawlError;

pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const DEFAULT_MAX_COUNT: usize = 5000;
pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_GLOBAL_DEADLINE: Duration = Duration::from_secs(6 * 3600);

/// Headers every crawl starts with. Returns a fresh map on each call.
pub fn default_headers() -> HashMap<String, String> {
    HashMap::from([
        ("User-Agent".to_string(), "link-spider/0.1".to_string()),
        (
            "Accept".to_string(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
        ),
        ("Cache-Control".to_string(), "max-age=0".to_string()),
        ("Accept-Charset".to_string(), "GBK,utf-8;q=0.7,*;q=0.3".to_string()),
    ])
}

/// Immutable crawl configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    max_depth: usize,
    max_count: usize,
    concurrency: usize,
    per_request_timeout: Duration,
    global_deadline: Duration,
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
    verify_tls: bool,
    same_host_only: bool,
    same_domain_only: bool,
}

impl Strategy {
    /// Starts a builder seeded with the default values.
    pub fn builder() -> StrategyBuilder {
        StrategyBuilder::default()
    }

    /// Maximum link-hops from the root; 0 means unbounded.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Visited-set capacity; 0 means unbounded.
    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Number of crawl tasks allowed in flight at once.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn per_request_timeout(&self) -> Duration {
        self.per_request_timeout
    }

    /// Wall-clock budget for the whole crawl; `None` when unbounded.
    pub fn global_deadline(&self) -> Option<Duration> {
        (!self.global_deadline.is_zero()).then_some(self.global_deadline)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    pub fn same_host_only(&self) -> bool {
        self.same_host_only
    }

    pub fn same_domain_only(&self) -> bool {
        self.same_domain_only
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_count: DEFAULT_MAX_COUNT,
            concurrency: DEFAULT_CONCURRENCY,
            per_request_timeout: DEFAULT_REQUEST_TIMEOUT,
            global_deadline: DEFAULT_GLOBAL_DEADLINE,
            headers: default_headers(),
            cookies: HashMap::new(),
            verify_tls: false,
            same_host_only: false,
            same_domain_only: true,
        }
    }
}

/// Step-by-step construction of a [`Strategy`].
///
/// Extra headers and cookies are merged over the defaults; a later value for
/// the same key wins.
#[derive(Debug, Clone, Default)]
pub struct StrategyBuilder {
    inner: Strategy,
}

impl StrategyBuilder {
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.inner.max_depth = max_depth;
        self
    }

    pub fn max_count(mut self, max_count: usize) -> Self {
        self.inner.max_count = max_count;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.inner.concurrency = concurrency;
        self
    }

    pub fn per_request_timeout(mut self, timeout: Duration) -> Self {
        self.inner.per_request_timeout = timeout;
        self
    }

    /// `Duration::ZERO` disables the deadline.
    pub fn global_deadline(mut self, deadline: Duration) -> Self {
        self.inner.global_deadline = deadline;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.headers.insert(name.into(), value.into());
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.inner
            .headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.cookies.insert(name.into(), value.into());
        self
    }

    pub fn cookies<I, K, V>(mut self, cookies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.inner
            .cookies
            .extend(cookies.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.inner.verify_tls = verify;
        self
    }

    pub fn same_host_only(mut self, enabled: bool) -> Self {
        self.inner.same_host_only = enabled;
        self
    }

    pub fn same_domain_only(mut self, enabled: bool) -> Self {
        self.inner.same_domain_only = enabled;
        self
    }

    /// Validates and freezes the configuration.
    pub fn build(self) -> Result<Strategy, CrawlError> {
        let strategy = self.inner;

        if strategy.concurrency == 0 {
            return Err(CrawlError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if strategy.per_request_timeout.is_zero() {
            return Err(CrawlError::InvalidConfig(
                "per-request timeout must be greater than zero".to_string(),
            ));
        }

        for (name, value) in &strategy.headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| CrawlError::InvalidConfig(format!("header name '{name}': {e}")))?;
            HeaderValue::from_str(value)
                .map_err(|e| CrawlError::InvalidConfig(format!("header '{name}' value: {e}")))?;
        }
        for (name, value) in &strategy.cookies {
            if name.is_empty() || name.contains(|c| c == '=' || c == ';') || value.contains(';') {
                return Err(CrawlError::InvalidConfig(format!(
                    "cookie '{name}' contains '=' or ';'"
                )));
            }
        }

        Ok(strategy)
    }
}
