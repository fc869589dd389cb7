//! Sumi-Sweep: a concurrent broken-link sweeper
//!
//! This crate crawls a website from a seed URL, follows same-origin links up to
//! a bounded depth with a fixed number of concurrent page visits, and collects
//! broken pages, failed resources, and page errors into a single report.

pub mod config;
pub mod crawler;
pub mod report;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Sweep operations
///
/// Per-page failures never surface here; they are recorded as
/// [`CrawlerError`]s. Only configuration problems and internal faults abort a
/// crawl.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Invalid scheduler transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },

    #[error("Report error: {0}")]
    Report(#[from] report::ReportError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Sumi-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::CrawlerOptions;
pub use crawler::{crawl, crawl_with_progress, Depth, PageVisit, PageVisitor, Scheduler, VisitError};
pub use report::{CrawlOutcome, CrawlerError, ErrorCollection, ErrorKind};
pub use state::CrawlState;
pub use url::{normalize_url, UrlFilter};
