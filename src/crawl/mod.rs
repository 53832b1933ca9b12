// src/crawl/mod.rs
// =============================================================================
// This module handles the crawl itself.
//
// Pieces, smallest first:
// - strategy: the immutable crawl configuration
// - url_record: a normalized URL plus its depth
// - visited: every URL ever admitted, bounded by max_count
// - queue: URLs waiting to be crawled
// - pool: bounded set of running crawl tasks
// - stop: the one-way stop switch and the reason it was flipped
// - task: fetch one page and admit its links
// - scheduler: ties it all together and decides when the crawl is over
// =============================================================================

mod pool;
mod queue;
mod scheduler;
mod stop;
mod strategy;
mod task;
mod url_record;
mod visited;

pub use pool::{Slot, WorkerPool};
pub use queue::WorkQueue;
pub use scheduler::{CrawlReport, CrawlState, Scheduler};
pub use stop::{StopReason, StopSignal};
pub use strategy::{
    default_headers, Strategy, StrategyBuilder, DEFAULT_CONCURRENCY, DEFAULT_GLOBAL_DEADLINE,
    DEFAULT_MAX_COUNT, DEFAULT_MAX_DEPTH, DEFAULT_REQUEST_TIMEOUT,
};
pub use url_record::{normalize, UrlRecord};
pub use visited::{Admission, VisitedSet};
