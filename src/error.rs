// src/error.rs
// =============================================================================
// Error types for the crawler library.
//
// There are two families:
// - CrawlError: things the *caller* did wrong (bad root URL, bad config,
//   calling run() twice). These are returned from the public API.
// - FetchError: a single page could not be downloaded. These never leave a
//   crawl task; the task logs them and ends.
//
// Hitting the URL budget or the global deadline is NOT an error. Those are
// reported as a StopReason on the CrawlReport.
// =============================================================================

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::crawl::CrawlState;

/// Errors returned by the public crawl API.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The input could not be turned into a crawlable URL.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A Strategy value was rejected by the builder.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An operation was called in the wrong lifecycle state.
    #[error("scheduler is {actual:?}, expected {expected:?}")]
    InvalidState {
        expected: CrawlState,
        actual: CrawlState,
    },

    /// The HTTP client could not be built from the Strategy.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// The worker pool's slot semaphore was closed underneath the scheduler.
    #[error("worker pool is closed")]
    PoolClosed,
}

/// Why a single page fetch failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS, TLS or body read failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("HTTP {0}")]
    Status(StatusCode),

    /// The fetch did not finish within the per-request timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl CrawlError {
    pub(crate) fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        CrawlError::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
