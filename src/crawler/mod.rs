//! Crawler module: scheduling, page visiting, and the HTTP visitor
//!
//! This module contains the core crawling logic, including:
//! - The frontier of pending pages with depth tracking
//! - The bounded scheduler that dispatches concurrent visits
//! - Per-visit deadlines and retries
//! - The `PageVisitor` capability and its default HTTP implementation
//! - Progress reporting

mod fetcher;
mod frontier;
mod http;
mod parser;
mod progress;
mod scheduler;
mod visitor;
mod worker;

pub use fetcher::{build_http_client, fetch_page, probe_resource, FetchResult, ProbeFailure};
pub use frontier::{Depth, Frontier, FrontierEntry};
pub use http::HttpPageVisitor;
pub use parser::{parse_html, ParsedPage};
pub use progress::{ConsoleProgress, NoOpProgress, ProgressReporter};
pub use scheduler::Scheduler;
pub use visitor::{PageVisit, PageVisitor, RetryableCrawlerError, VisitError};

use crate::config::CrawlerOptions;
use crate::report::CrawlOutcome;
use crate::Result;

/// Crawls from `options.url` until no reachable work is left
///
/// Progress is printed to stderr unless `options.silent` is set.
///
/// # Errors
///
/// Only invalid options and internal faults are returned as errors; every
/// per-page problem ends up in the outcome's error collection.
///
/// # Example
///
/// ```no_run
/// use sumi_sweep::crawler::{crawl, HttpPageVisitor};
/// use sumi_sweep::{CrawlerOptions, Depth};
///
/// # async fn run() -> sumi_sweep::Result<()> {
/// let options = CrawlerOptions::new("https://example.com")?
///     .with_depth(Depth::Limited(2))
///     .with_silent(true);
/// let outcome = crawl(options, HttpPageVisitor::new()?).await?;
/// for page in &outcome.errors.pages {
///     println!("broken: {}", page);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn crawl(options: CrawlerOptions, visitor: impl PageVisitor + 'static) -> Result<CrawlOutcome> {
    if options.silent {
        crawl_with_progress(options, visitor, &NoOpProgress).await
    } else {
        crawl_with_progress(options, visitor, &ConsoleProgress::new()).await
    }
}

/// Like [`crawl`], reporting lifecycle events to `progress`
pub async fn crawl_with_progress(
    options: CrawlerOptions,
    visitor: impl PageVisitor + 'static,
    progress: &dyn ProgressReporter,
) -> Result<CrawlOutcome> {
    Scheduler::new(options, visitor)?.run(progress).await
}
