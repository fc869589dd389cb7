//! Crawl scheduler: the bounded dispatch loop
//!
//! The scheduler owns the frontier and the statistics. It keeps up to
//! `concurrency` visit tasks in a `FuturesUnordered`, suspends on the next
//! completion when no slot is free or no work is queued, and finishes once the
//! frontier is empty and nothing is in flight.

use crate::config::{validate_options, CrawlerOptions};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::progress::ProgressReporter;
use crate::crawler::visitor::PageVisitor;
use crate::crawler::worker::{visit_entry, PageStatus, VisitReport, WorkerContext};
use crate::report::{CrawlOutcome, CrawlStatistics, CrawlerError, ErrorAggregator};
use crate::state::{CrawlState, VisitedSet};
use crate::url::{normalize_parsed, UrlFilter};
use crate::{Result, SweepError};
use chrono::Utc;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::task::JoinError;
use url::Url;

/// A finished visit task, tagged with the page it was visiting
struct Completion {
    url: Url,
    hops: u32,
    result: std::result::Result<VisitReport, JoinError>,
}

/// Per-crawl state: frontier, in-flight visits, lifecycle, and counters
///
/// # Example
///
/// ```no_run
/// use sumi_sweep::crawler::{HttpPageVisitor, NoOpProgress, Scheduler};
/// use sumi_sweep::CrawlerOptions;
///
/// # async fn run() -> sumi_sweep::Result<()> {
/// let options = CrawlerOptions::new("https://example.com")?.with_concurrency(4);
/// let visitor = HttpPageVisitor::new()?;
/// let outcome = Scheduler::new(options, visitor)?.run(&NoOpProgress).await?;
/// println!("{} broken pages", outcome.errors.pages.len());
/// # Ok(())
/// # }
/// ```
pub struct Scheduler {
    seed: Url,
    concurrency: usize,
    state: CrawlState,
    frontier: Frontier,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
    ctx: WorkerContext,
    stats: CrawlStatistics,
}

impl Scheduler {
    /// Validates `options`, then seeds the frontier with the normalized seed URL
    ///
    /// # Errors
    ///
    /// Returns `SweepError::Config` for invalid options or patterns and
    /// `SweepError::UrlError` if the seed cannot be normalized.
    pub fn new(options: CrawlerOptions, visitor: impl PageVisitor + 'static) -> Result<Self> {
        validate_options(&options)?;

        let seed = normalize_parsed(options.url.clone())?;
        let filter = UrlFilter::new(&seed, &options.exclusions)?;
        let aggregator = ErrorAggregator::with_ignore_patterns(&options.ignore)?;
        let visited = VisitedSet::new();

        let mut frontier = Frontier::new();
        visited.try_claim(&seed);
        frontier.push(FrontierEntry::seed(seed.clone(), options.depth));

        Ok(Self {
            seed,
            concurrency: options.concurrency,
            state: CrawlState::Idle,
            frontier,
            in_flight: FuturesUnordered::new(),
            ctx: WorkerContext {
                visitor: Arc::new(visitor),
                filter: Arc::new(filter),
                visited: Arc::new(visited),
                aggregator: Arc::new(aggregator),
                timeout: options.timeout,
                retries: options.retries,
            },
            stats: CrawlStatistics::new(),
        })
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Normalized seed URL
    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// Drives the crawl to completion
    ///
    /// Per-page failures never end the crawl early; only an invalid state
    /// transition or an internal fault does.
    pub async fn run(mut self, progress: &dyn ProgressReporter) -> Result<CrawlOutcome> {
        let started_at = Utc::now();
        let clock = std::time::Instant::now();

        tracing::info!(
            "Starting crawl of {} (concurrency {}, timeout {}ms, retries {})",
            self.seed,
            self.concurrency,
            self.ctx.timeout.as_millis(),
            self.ctx.retries
        );
        progress.report_crawl_started(&self.seed);
        self.transition(CrawlState::Running)?;

        loop {
            self.fill_slots(progress);

            if self.in_flight.is_empty() {
                self.transition(CrawlState::Done)?;
                break;
            }

            if self.frontier.is_empty() && self.state == CrawlState::Running {
                self.transition(CrawlState::Draining)?;
            }

            let Some(completion) = self.in_flight.next().await else {
                return Err(SweepError::Internal(
                    "in-flight set drained without a completion".to_string(),
                ));
            };
            self.handle_completion(completion, progress);

            if !self.frontier.is_empty() && self.state == CrawlState::Draining {
                self.transition(CrawlState::Running)?;
            }
        }

        self.stats.elapsed_ms = clock.elapsed().as_millis() as u64;
        progress.report_crawl_finished(&self.stats);

        let Scheduler {
            seed, ctx, stats, ..
        } = self;
        let WorkerContext { aggregator, .. } = ctx;
        let aggregator = Arc::try_unwrap(aggregator).map_err(|_| {
            SweepError::Internal("error aggregator still shared after crawl".to_string())
        })?;
        let errors = aggregator.finalize();

        tracing::info!(
            "Crawl finished: {} pages visited, {} broken, {} errors recorded in {}ms",
            stats.pages_visited,
            errors.pages.len(),
            errors.errors.len(),
            stats.elapsed_ms
        );

        Ok(CrawlOutcome {
            seed_url: seed.to_string(),
            errors,
            stats,
            started_at,
            finished_at: Utc::now(),
            config_hash: None,
        })
    }

    fn transition(&mut self, next: CrawlState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            tracing::error!("Invalid scheduler transition {} -> {}", self.state, next);
            return Err(SweepError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("Scheduler {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Dispatches queued entries until every slot is taken or the frontier is empty
    fn fill_slots(&mut self, progress: &dyn ProgressReporter) {
        while self.in_flight.len() < self.concurrency {
            let Some(entry) = self.frontier.pop() else {
                break;
            };
            self.dispatch(entry, progress);
        }
        self.stats.peak_in_flight = self.stats.peak_in_flight.max(self.in_flight.len());
    }

    fn dispatch(&mut self, entry: FrontierEntry, progress: &dyn ProgressReporter) {
        tracing::debug!(
            "Dispatching {} (hops {}, depth {}, {} in flight, {} queued)",
            entry.url,
            entry.hops,
            entry.remaining_depth,
            self.in_flight.len() + 1,
            self.frontier.len()
        );
        progress.report_page_started(&entry.url);

        let url = entry.url.clone();
        let hops = entry.hops;
        let handle = tokio::spawn(visit_entry(self.ctx.clone(), entry));

        self.in_flight.push(Box::pin(async move {
            Completion {
                url,
                hops,
                result: handle.await,
            }
        }));
    }

    fn handle_completion(&mut self, completion: Completion, progress: &dyn ProgressReporter) {
        let Completion { url, hops, result } = completion;

        self.stats.pages_visited += 1;
        *self.stats.depth_breakdown.entry(hops).or_insert(0) += 1;

        let report = match result {
            Ok(report) => report,
            Err(join_error) => {
                let message = format!("Page visit panicked: {}", panic_message(join_error));
                tracing::error!("{} on {}", message, url);
                self.ctx
                    .aggregator
                    .record(CrawlerError::navigation(url.as_str(), message.clone()));
                self.stats.pages_failed += 1;
                progress.report_page_failed(&url, &message);
                return;
            }
        };

        self.stats.links_discovered += report.links_discovered;
        self.stats.links_rejected += report.links_rejected;
        self.stats.links_duplicate += report.links_duplicate;
        self.stats.links_enqueued += report.children.len() as u64;
        self.stats.retries += report.retries;

        match &report.status {
            PageStatus::Loaded => {
                self.stats.pages_succeeded += 1;
                progress.report_page_finished(&url, report.children.len());
            }
            PageStatus::Failed(message) => {
                self.stats.pages_failed += 1;
                progress.report_page_failed(&url, message);
            }
            PageStatus::TimedOut => {
                self.stats.pages_timed_out += 1;
                progress.report_page_failed(&url, "timed out");
            }
        }

        tracing::debug!(
            "Completed {} ({:?}), {} new links, {} in flight, {} queued",
            url,
            report.status,
            report.children.len(),
            self.in_flight.len(),
            self.frontier.len() + report.children.len()
        );
        self.frontier.extend(report.children);
    }
}

/// Extracts a printable message from a failed visit task
fn panic_message(error: JoinError) -> String {
    if error.is_cancelled() {
        return "task was cancelled".to_string();
    }
    match error.try_into_panic() {
        Ok(payload) => {
            if let Some(message) = payload.downcast_ref::<&str>() {
                (*message).to_string()
            } else if let Some(message) = payload.downcast_ref::<String>() {
                message.clone()
            } else {
                "unknown panic payload".to_string()
            }
        }
        Err(error) => error.to_string(),
    }
}
