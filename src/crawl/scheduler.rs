// src/crawl/scheduler.rs
// =============================================================================
// The scheduler owns a crawl from start to finish.
//
// Lifecycle (one way only, a Scheduler is never reused):
//   Init --set_root()--> Ready --run()--> Running -> Stopping -> Stopped
//
// The dispatch loop, each time around:
// 1. Reap tasks that already finished (no waiting)
// 2. Try to pop a URL from the work queue (no waiting)
// 3. Got one: wait for a free pool slot, then start a CrawlTask for it.
//    Waiting for the slot is what keeps the number of fetches bounded.
// 4. Queue empty: if tasks are still running, one of them may push more
//    work, so wait for the next one to finish and go again. If nothing is
//    running AND the queue is still empty, nothing can ever add more work:
//    the crawl is done.
// 5. Deadline passed or someone requested a stop: leave the loop.
//
// Why step 4 is safe: a task pushes all of its links before it finishes, and
// only this loop starts tasks. So "no task running" is checked first, and only
// then "queue empty". Checking in the other order could miss a push made by
// a task that finished in between.
//
// Stopping always means: let running tasks finish, then close the queue.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};
use url::Url;

use super::pool::WorkerPool;
use super::queue::WorkQueue;
use super::stop::{StopReason, StopSignal};
use super::strategy::Strategy;
use super::task::{CrawlContext, CrawlTask};
use super::url_record::UrlRecord;
use super::visited::VisitedSet;
use crate::error::CrawlError;
use crate::page::Collaborators;

/// Where a [`Scheduler`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlState {
    Init,
    Ready,
    Running,
    Stopping,
    Stopped,
}

/// Summary of a finished crawl.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub root: String,
    /// Number of URLs admitted to the visited set, root included.
    pub visited: usize,
    pub reason: StopReason,
    pub elapsed_secs: f64,
    pub urls: Vec<UrlRecord>,
}

/// Runs one bounded crawl.
pub struct Scheduler {
    ctx: Arc<CrawlContext>,
    pool: WorkerPool,
    root: Option<UrlRecord>,
    state: CrawlState,
}

impl Scheduler {
    pub fn new(strategy: Strategy, collaborators: Collaborators) -> Self {
        let pool = WorkerPool::new(strategy.concurrency());
        let ctx = CrawlContext {
            visited: VisitedSet::new(strategy.max_count()),
            queue: WorkQueue::new(),
            stop: Arc::new(StopSignal::new()),
            strategy: Arc::new(strategy),
            collaborators,
        };
        Self {
            ctx: Arc::new(ctx),
            pool,
            root: None,
            state: CrawlState::Init,
        }
    }

    /// A scheduler that fetches over real HTTP.
    pub fn with_http(strategy: Strategy) -> Result<Self, CrawlError> {
        let collaborators = Collaborators::http(&strategy)?;
        Ok(Self::new(strategy, collaborators))
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn strategy(&self) -> &Strategy {
        &self.ctx.strategy
    }

    /// Admits the root URL (depth 0) and queues it.
    pub fn set_root(&mut self, url: &str) -> Result<(), CrawlError> {
        self.expect_state(CrawlState::Init)?;

        // Store the root the way discovered links will spell it, so a page
        // linking back to "http://site.test/" hits the same visited entry
        let raw = UrlRecord::root(url)?;
        let parsed =
            Url::parse(raw.url()).map_err(|e| CrawlError::invalid_url(url, e.to_string()))?;
        let root = UrlRecord::root(parsed.as_str())?;

        self.ctx.visited.insert(root.clone());
        self.ctx.queue.push(root.clone());
        self.root = Some(root);
        self.state = CrawlState::Ready;
        Ok(())
    }

    /// URLs admitted so far, root included.
    pub fn visited_count(&self) -> usize {
        self.ctx.visited.size()
    }

    /// Handle that lets other tasks stop the crawl (e.g. on Ctrl-C).
    pub fn stop_handle(&self) -> Arc<StopSignal> {
        Arc::clone(&self.ctx.stop)
    }

    /// Crawls until the queue runs dry, the URL budget is used up, the
    /// deadline passes, or a stop is requested through [`stop_handle`].
    ///
    /// [`stop_handle`]: Scheduler::stop_handle
    pub async fn run(&mut self) -> Result<CrawlReport, CrawlError> {
        self.expect_state(CrawlState::Ready)?;
        let root = match &self.root {
            Some(root) => root.to_string(),
            None => return Err(self.state_error(CrawlState::Ready)),
        };

        self.state = CrawlState::Running;
        let started = Instant::now();
        // A deadline too far out to represent is the same as no deadline
        let deadline = self
            .ctx
            .strategy
            .global_deadline()
            .and_then(|d| started.checked_add(d));
        info!("Spider '{root}' start running");

        let dispatched = self.dispatch(deadline).await;
        self.stop().await;
        dispatched?;

        let reason = self.ctx.stop.reason().unwrap_or(StopReason::Quiescent);
        let visited = self.visited_count();
        info!("Spider '{root}' finished ({reason}). Fetch ({visited}) urls.");

        Ok(CrawlReport {
            root,
            visited,
            reason,
            elapsed_secs: started.elapsed().as_secs_f64(),
            urls: self.ctx.visited.records(),
        })
    }

    async fn dispatch(&mut self, deadline: Option<Instant>) -> Result<(), CrawlError> {
        let stop = Arc::clone(&self.ctx.stop);

        loop {
            if stop.is_requested() {
                return Ok(());
            }
            if deadline.is_some_and(|at| Instant::now() >= at) {
                stop.request(StopReason::DeadlineExceeded);
                return Ok(());
            }

            self.pool.reap();

            if let Some(record) = self.ctx.queue.try_pop() {
                let slot = tokio::select! {
                    biased;
                    _ = stop.requested() => return Ok(()),
                    _ = sleep_until(deadline) => {
                        stop.request(StopReason::DeadlineExceeded);
                        return Ok(());
                    }
                    slot = self.pool.acquire() => slot?,
                };
                debug!(url = %record, depth = record.depth(), "dispatching");
                let task = CrawlTask::new(record, Arc::clone(&self.ctx));
                self.pool.spawn(slot, task.run());
                continue;
            }

            // Pool first, then queue
            if self.pool.is_idle() {
                if self.ctx.queue.is_empty() {
                    stop.request(StopReason::Quiescent);
                    return Ok(());
                }
                continue;
            }

            tokio::select! {
                biased;
                _ = stop.requested() => return Ok(()),
                _ = sleep_until(deadline) => {
                    stop.request(StopReason::DeadlineExceeded);
                    return Ok(());
                }
                _ = self.pool.wait_next() => {}
            }
        }
    }

    // Drains running tasks, then closes the queue. Safe to call twice.
    async fn stop(&mut self) {
        if self.state == CrawlState::Stopped {
            return;
        }
        self.state = CrawlState::Stopping;
        if !self.pool.is_idle() {
            debug!("waiting for {} running tasks", self.pool.active());
        }
        self.pool.join_all().await;
        self.ctx.queue.close();
        self.state = CrawlState::Stopped;
    }

    fn expect_state(&self, expected: CrawlState) -> Result<(), CrawlError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.state_error(expected))
        }
    }

    fn state_error(&self, expected: CrawlState) -> CrawlError {
        CrawlError::InvalidState {
            expected,
            actual: self.state,
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

impl CrawlReport {
    pub fn elapsed(&self) -> Duration {
        Duration::from_secs_f64(self.elapsed_secs)
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does only the scheduler spawn and reap tasks?
//    - Then "no task running" can't change while dispatch() is looking at it
//    - A task can still push URLs, but only before its future completes,
//      and a completed future is exactly what reap()/wait_next() observe
//
// 2. What does `biased;` do in select!?
//    - Without it, select! polls the branches in random order
//    - With it, a stop request is always noticed before we grab another slot
//
// 3. Why wait for running tasks when stopping?
//    - A task still holds Arc<CrawlContext> and may be pushing links
//    - Closing the queue after join_all() means nothing lands in it afterwards
//    - Each fetch has its own timeout, so this wait is bounded
//
// 4. Why checked_add() for the deadline?
//    - Instant + Duration panics if the result can't be represented
//    - `--time` is a u64, so a huge value is a legal input, not a bug
// -----------------------------------------------------------------------------
