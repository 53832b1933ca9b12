// src/lib.rs
// =============================================================================
// link-spider: a bounded, depth-limited web crawler.
//
// Give it a root URL and a Strategy and it visits linked pages until one of
// these happens:
// - there is nothing left to crawl
// - max_count URLs have been admitted
// - the global deadline passes
//
// Quick start:
//
//   let strategy = Strategy::builder().max_depth(2).build()?;
//   let mut spider = Scheduler::with_http(strategy)?;
//   spider.set_root("https://example.com")?;
//   let report = spider.run().await?;
// =============================================================================

pub mod crawl;
pub mod error;
pub mod page;

pub use crawl::{CrawlReport, CrawlState, Scheduler, StopReason, Strategy, UrlRecord};
pub use error::{CrawlError, FetchError};
pub use page::{Collaborators, FetchedPage, Fetcher};
