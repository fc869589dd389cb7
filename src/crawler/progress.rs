//! Progress reporting for crawl lifecycle events
//!
//! The scheduler calls a `ProgressReporter` at every dispatch and completion.
//! `NoOpProgress` backs silent crawls; `ConsoleProgress` prints one line per
//! finished page to stderr.

use crate::report::CrawlStatistics;
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

/// Receives crawl lifecycle events
pub trait ProgressReporter: Send + Sync {
    /// The seed has been queued and dispatching is about to start
    fn report_crawl_started(&self, seed: &Url);

    /// A visit was dispatched
    fn report_page_started(&self, url: &Url);

    /// A page loaded; `links_enqueued` new links joined the frontier
    fn report_page_finished(&self, url: &Url, links_enqueued: usize);

    /// A page failed, timed out, or its task panicked
    fn report_page_failed(&self, url: &Url, reason: &str);

    /// The scheduler reached `Done`
    fn report_crawl_finished(&self, stats: &CrawlStatistics);
}

/// Progress reporter that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_crawl_started(&self, _seed: &Url) {}

    #[inline(always)]
    fn report_page_started(&self, _url: &Url) {}

    #[inline(always)]
    fn report_page_finished(&self, _url: &Url, _links_enqueued: usize) {}

    #[inline(always)]
    fn report_page_failed(&self, _url: &Url, _reason: &str) {}

    #[inline(always)]
    fn report_crawl_finished(&self, _stats: &CrawlStatistics) {}
}

/// Prints progress lines to stderr
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    started: AtomicU64,
    finished: AtomicU64,
    failed: AtomicU64,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn done(&self) -> u64 {
        self.finished.load(Ordering::Relaxed) + self.failed.load(Ordering::Relaxed)
    }
}

impl ProgressReporter for ConsoleProgress {
    fn report_crawl_started(&self, seed: &Url) {
        eprintln!("Sweeping {}", seed);
    }

    fn report_page_started(&self, _url: &Url) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    fn report_page_finished(&self, url: &Url, links_enqueued: usize) {
        self.finished.fetch_add(1, Ordering::Relaxed);
        eprintln!(
            "[{}/{}] ok   {} (+{} links)",
            self.done(),
            self.started.load(Ordering::Relaxed),
            url,
            links_enqueued
        );
    }

    fn report_page_failed(&self, url: &Url, reason: &str) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        eprintln!(
            "[{}/{}] FAIL {}: {}",
            self.done(),
            self.started.load(Ordering::Relaxed),
            url,
            reason
        );
    }

    fn report_crawl_finished(&self, stats: &CrawlStatistics) {
        eprintln!(
            "Finished: {} pages visited, {} failed, {} timed out",
            stats.pages_visited, stats.pages_failed, stats.pages_timed_out
        );
    }
}
