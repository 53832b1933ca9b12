// src/crawl/task.rs
// =============================================================================
// One crawl task = one URL: fetch it, pull out its links, admit the new ones.
//
// How it works:
// 1. Fetch the page (bounded by the per-request timeout)
// 2. Figure out the charset and decode the body
// 3. Stop here if the children would be deeper than max_depth
// 4. Extract candidate links, using this page's URL as the base
// 5. For each candidate, in order:
//    - visited set full? ask the whole crawl to stop and quit
//    - already visited? skip
//    - wrong host / wrong domain? skip
//    - admit it and push it onto the work queue
//
// A failed fetch only ends this task. Running out of URL budget is the one
// thing a task escalates: it stops the whole crawl.
//
// Every push happens before run() returns. The scheduler relies on that:
// once it has reaped all tasks, nothing can add more work.
// =============================================================================

use std::sync::Arc;

use tracing::{debug, info};

use super::stop::{StopReason, StopSignal};
use super::strategy::Strategy;
use super::url_record::UrlRecord;
use super::visited::{Admission, VisitedSet};
use super::queue::WorkQueue;
use crate::error::FetchError;
use crate::page::{decode_body, Collaborators, FetchedPage, UrlFilter};

/// State shared by the scheduler and every task it starts.
pub(crate) struct CrawlContext {
    pub strategy: Arc<Strategy>,
    pub visited: VisitedSet,
    pub queue: WorkQueue,
    pub stop: Arc<StopSignal>,
    pub collaborators: Collaborators,
}

pub(crate) struct CrawlTask {
    record: UrlRecord,
    ctx: Arc<CrawlContext>,
}

impl CrawlTask {
    pub fn new(record: UrlRecord, ctx: Arc<CrawlContext>) -> Self {
        Self { record, ctx }
    }

    pub async fn run(self) {
        let page = match self.fetch().await {
            Ok(page) => page,
            Err(e) => {
                debug!(url = %self.record, "open failed: {e}");
                return;
            }
        };

        let child_depth = self.record.depth() + 1;
        let max_depth = self.ctx.strategy.max_depth();
        if max_depth > 0 && child_depth > max_depth {
            return;
        }

        let body = self.decode(page);
        let links = self
            .ctx
            .collaborators
            .extractor
            .extract(&body, self.record.url());

        self.expand(links, child_depth);
    }

    async fn fetch(&self) -> Result<FetchedPage, FetchError> {
        let timeout = self.ctx.strategy.per_request_timeout();
        let fetch = self.ctx.collaborators.fetcher.fetch(self.record.url());
        tokio::time::timeout(timeout, fetch)
            .await
            .map_err(|_| FetchError::Timeout(timeout))?
    }

    fn decode(&self, page: FetchedPage) -> String {
        if let Some(label) = page.encoding.as_deref() {
            return decode_body(&page.body, Some(label));
        }
        let sniffed = String::from_utf8_lossy(&page.body);
        let charset = self.ctx.collaborators.detector.detect(&sniffed);
        decode_body(&page.body, charset.as_deref())
    }

    // Admits the links found on this page
    //
    // Parameters:
    //   links: absolute candidate URLs in document order
    //   child_depth: depth every admitted link gets (this page's depth + 1)
    //
    // Returns early once the visited set is full
    fn expand(&self, links: Vec<String>, child_depth: usize) {
        let ctx = &self.ctx;
        let page_url = self.record.url();

        for link in links {
            if ctx.visited.full() {
                self.capacity_reached();
                return;
            }

            if ctx.visited.contains(&link) {
                continue;
            }

            if ctx.strategy.same_host_only() && !UrlFilter::is_same_host(&link, page_url) {
                continue;
            }

            if ctx.strategy.same_domain_only()
                && !UrlFilter::is_same_domain(&link, page_url, ctx.collaborators.classifier.as_ref())
            {
                continue;
            }

            let child = match UrlRecord::new(&link, child_depth) {
                Ok(child) => child,
                Err(e) => {
                    debug!(parent = %self.record, "skipping link: {e}");
                    continue;
                }
            };

            match ctx.visited.admit(child.clone()) {
                Admission::Admitted => {
                    debug!("Crawled ({}) urls for '{}'.", ctx.visited.size(), child);
                    ctx.queue.push(child);
                }
                Admission::Duplicate => {}
                // Another task took the last slot between our check and admit
                Admission::Full => {
                    self.capacity_reached();
                    return;
                }
            }
        }
    }

    fn capacity_reached(&self) {
        if self.ctx.stop.request(StopReason::CapacityReached) {
            info!(
                url = %self.record,
                "visited set reached its limit of {} urls",
                self.ctx.visited.size()
            );
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why check full() AND handle Admission::Full?
//    - full() is a cheap early exit before we bother filtering a link
//    - Between that check and admit() another task may take the last slot,
//      so admit() answers again under the lock and that answer is final
//
// 2. Why does a task only *request* the stop?
//    - The scheduler is the one waiting on tasks; if a task tried to drain
//      the pool itself it would end up waiting for its own future
//    - request() is idempotent, so several tasks hitting the limit is fine
//
// 3. Why tokio::time::timeout around fetch()?
//    - The Fetcher is a trait object and might not enforce any timeout
//    - Wrapping it here keeps the "stop waits at most one request timeout"
//      promise no matter which fetcher is plugged in
// -----------------------------------------------------------------------------
