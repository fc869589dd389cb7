//! Crawl statistics gathered by the scheduler
//!
//! The scheduler updates these counters from its single dispatch loop, so
//! no synchronization is needed here.

use serde::Serialize;
use std::collections::BTreeMap;

/// Counters describing one crawl
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlStatistics {
    /// Pages dispatched to the visitor and completed (any outcome)
    pub pages_visited: u64,

    /// Visits that returned a page, possibly with resource or console errors
    pub pages_succeeded: u64,

    /// Visits that failed to navigate (after retries)
    pub pages_failed: u64,

    /// Visits cut off by the per-page deadline
    pub pages_timed_out: u64,

    /// Links returned by the visitor, before filtering
    pub links_discovered: u64,

    /// Links accepted, claimed, and pushed onto the frontier
    pub links_enqueued: u64,

    /// Links dropped by the scope/exclusion filter
    pub links_rejected: u64,

    /// Links dropped because they were already claimed
    pub links_duplicate: u64,

    /// Extra visit attempts made for retryable failures
    pub retries: u64,

    /// Highest number of visits in flight at once
    pub peak_in_flight: usize,

    /// Visited pages by hop distance from the seed
    pub depth_breakdown: BTreeMap<u32, u64>,

    /// Wall-clock duration of the crawl in milliseconds
    pub elapsed_ms: u64,
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Percentage of visited pages that loaded
    pub fn success_rate(&self) -> f64 {
        if self.pages_visited == 0 {
            return 0.0;
        }
        (self.pages_succeeded as f64 / self.pages_visited as f64) * 100.0
    }

    pub fn pages_per_second(&self) -> f64 {
        if self.elapsed_ms == 0 {
            return 0.0;
        }
        self.pages_visited as f64 / (self.elapsed_ms as f64 / 1000.0)
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Pages:");
    println!("  Visited: {}", stats.pages_visited);
    println!("  Loaded: {}", stats.pages_succeeded);
    println!("  Failed: {}", stats.pages_failed);
    println!("  Timed out: {}", stats.pages_timed_out);
    println!("  Retries: {}", stats.retries);
    println!();

    println!("Links:");
    println!("  Discovered: {}", stats.links_discovered);
    println!("  Enqueued: {}", stats.links_enqueued);
    println!("  Out of scope or excluded: {}", stats.links_rejected);
    println!("  Already seen: {}", stats.links_duplicate);
    println!();

    if !stats.depth_breakdown.is_empty() {
        println!("Pages by Depth:");
        for (depth, count) in &stats.depth_breakdown {
            println!("  {}: {}", depth, count);
        }
        println!();
    }

    println!(
        "Peak concurrency: {} | {:.2} pages/sec over {:.1}s",
        stats.peak_in_flight,
        stats.pages_per_second(),
        stats.elapsed_ms as f64 / 1000.0
    );
    println!(
        "Success Rate: {:.1}% ({} / {} pages loaded)",
        stats.success_rate(),
        stats.pages_succeeded,
        stats.pages_visited
    );
}
