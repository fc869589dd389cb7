//! A single page visit, run as its own task
//!
//! The worker applies the per-visit deadline, retries retryable failures,
//! records errors, and claims the links it finds. Claiming happens here rather
//! than in the dispatch loop, so discovery on different pages proceeds in
//! parallel while the visited set still guarantees one winner per URL.

use crate::crawler::frontier::FrontierEntry;
use crate::crawler::visitor::{PageVisitor, VisitError};
use crate::report::{CrawlerError, ErrorAggregator};
use crate::state::VisitedSet;
use crate::url::UrlFilter;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Shared handles every visit task gets a clone of
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub visitor: Arc<dyn PageVisitor>,
    pub filter: Arc<UrlFilter>,
    pub visited: Arc<VisitedSet>,
    pub aggregator: Arc<ErrorAggregator>,
    pub timeout: Duration,
    pub retries: u32,
}

/// How a visit ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PageStatus {
    Loaded,
    Failed(String),
    TimedOut,
}

/// Result of one visit task, handed back to the dispatch loop
#[derive(Debug)]
pub(crate) struct VisitReport {
    pub status: PageStatus,

    /// Newly claimed links, ready for the frontier
    pub children: Vec<FrontierEntry>,

    pub links_discovered: u64,
    pub links_rejected: u64,
    pub links_duplicate: u64,

    /// Attempts made beyond the first
    pub retries: u64,
}

impl VisitReport {
    fn new(status: PageStatus) -> Self {
        Self {
            status,
            children: Vec::new(),
            links_discovered: 0,
            links_rejected: 0,
            links_duplicate: 0,
            retries: 0,
        }
    }
}

/// Visits `entry.url`, retrying retryable failures up to `ctx.retries` times
///
/// Each attempt runs under its own deadline. When the deadline passes the
/// visit future is dropped and a `timeout` error is recorded; a visit that
/// only returns once the deadline has passed is treated the same way.
/// Timeouts are never retried.
pub(crate) async fn visit_entry(ctx: WorkerContext, entry: FrontierEntry) -> VisitReport {
    let page = entry.url.as_str();
    let mut attempt: u32 = 0;

    loop {
        let deadline = Instant::now() + ctx.timeout;
        let result = tokio::time::timeout_at(deadline, ctx.visitor.visit(&entry.url, deadline))
            .await
            .ok()
            // A visitor that bounds its own requests by the deadline returns
            // right at it; that still counts as a timeout.
            .filter(|_| Instant::now() < deadline);

        let mut report = match result {
            None => {
                ctx.aggregator.record(CrawlerError::timeout(page, ctx.timeout));
                VisitReport::new(PageStatus::TimedOut)
            }
            Some(Ok(visit)) => {
                ctx.aggregator.record_all(visit.errors);
                let mut report = VisitReport::new(PageStatus::Loaded);
                claim_links(&ctx, &entry, &visit.links, &mut report);
                report
            }
            Some(Err(VisitError::Navigation(message))) => {
                ctx.aggregator
                    .record(CrawlerError::navigation(page, message.clone()));
                VisitReport::new(PageStatus::Failed(message))
            }
            Some(Err(VisitError::Retryable(err))) if attempt < ctx.retries => {
                attempt += 1;
                tracing::warn!(
                    "Retrying {} (attempt {} of {}): {}",
                    page,
                    attempt + 1,
                    ctx.retries + 1,
                    err
                );
                continue;
            }
            Some(Err(VisitError::Retryable(err))) => {
                let message = err.to_string();
                if err.crawler_errors.is_empty() {
                    ctx.aggregator.record(CrawlerError::navigation(
                        page,
                        format!("Visit failed after {} attempts", attempt + 1),
                    ));
                } else {
                    ctx.aggregator.record_all(err.crawler_errors);
                }
                VisitReport::new(PageStatus::Failed(message))
            }
        };

        report.retries = u64::from(attempt);
        return report;
    }
}

/// Filters and claims the links found on `entry`
fn claim_links(ctx: &WorkerContext, entry: &FrontierEntry, links: &[String], report: &mut VisitReport) {
    report.links_discovered = links.len() as u64;

    if !entry.remaining_depth.allows_children() {
        tracing::trace!(
            "Depth exhausted at {}, ignoring {} links",
            entry.url,
            links.len()
        );
        return;
    }

    for link in links {
        let url = match ctx.filter.accept(link, &entry.url) {
            Ok(url) => url,
            Err(rejection) => {
                tracing::trace!("Dropped link {} on {}: {}", link, entry.url, rejection);
                report.links_rejected += 1;
                continue;
            }
        };

        if !ctx.visited.try_claim(&url) {
            report.links_duplicate += 1;
            continue;
        }

        if let Some(child) = entry.child(url) {
            report.children.push(child);
        }
    }
}
