//! Error aggregation and crawl reports
//!
//! Page visits feed [`CrawlerError`]s into an [`ErrorAggregator`]. Once the
//! crawl is done the aggregator is folded into an [`ErrorCollection`], which
//! together with the [`CrawlStatistics`] forms the [`CrawlOutcome`] that gets
//! written out as markdown or JSON.

mod aggregator;
mod json;
mod markdown;
mod stats;
mod types;

pub use aggregator::{ErrorAggregator, ErrorCollection};
pub use json::generate_json_report;
pub use markdown::{format_markdown_report, generate_markdown_report};
pub use stats::{print_statistics, CrawlStatistics};
pub use types::{CrawlerError, ErrorKind, ReportError, ReportResult};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Everything a finished crawl produced
#[derive(Debug, Clone, Serialize)]
pub struct CrawlOutcome {
    /// Normalized seed URL
    pub seed_url: String,

    /// De-duplicated errors and the set of broken pages
    pub errors: ErrorCollection,

    pub stats: CrawlStatistics,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,

    /// SHA-256 of the configuration file, when one was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
}

impl CrawlOutcome {
    /// Returns true when no page failed
    pub fn is_success(&self) -> bool {
        self.errors.is_success()
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }
}

/// Output format of a written report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Markdown,
    Json,
}

impl ReportFormat {
    /// `.json` selects JSON; anything else gets markdown
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Markdown,
        }
    }
}

/// Writes `outcome` to `path` in the format implied by its extension
pub fn write_report(outcome: &CrawlOutcome, path: &Path) -> ReportResult<ReportFormat> {
    let format = ReportFormat::from_path(path);
    match format {
        ReportFormat::Json => generate_json_report(outcome, path)?,
        ReportFormat::Markdown => generate_markdown_report(outcome, path)?,
    }
    tracing::info!("Report written to {}", path.display());
    Ok(format)
}
