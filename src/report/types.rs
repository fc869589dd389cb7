//! Error records and report-level error types

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while writing a report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Write(String),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Category of a problem found while visiting a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The page itself failed to load
    Navigation,

    /// A sub-resource (image, script, stylesheet) failed to load
    Resource,

    /// A script error surfaced by the page
    Console,

    /// The per-page deadline elapsed
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::Resource => "resource",
            Self::Console => "console",
            Self::Timeout => "timeout",
        }
    }

    /// Returns all error kinds
    pub fn all_kinds() -> Vec<Self> {
        vec![Self::Navigation, Self::Resource, Self::Console, Self::Timeout]
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One problem detected on one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlerError {
    /// The page on which the problem was detected
    pub page_url: String,

    /// What went wrong
    pub kind: ErrorKind,

    /// Human-readable description
    pub message: String,

    /// The sub-resource that failed, for `resource` errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_resource_url: Option<String>,

    /// Ignored errors are reported but do not mark the page as broken
    pub ignored: bool,
}

impl CrawlerError {
    pub fn new(page_url: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            kind,
            message: message.into(),
            failed_resource_url: None,
            ignored: false,
        }
    }

    pub fn navigation(page_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(page_url, ErrorKind::Navigation, message)
    }

    pub fn resource(
        page_url: impl Into<String>,
        resource_url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            failed_resource_url: Some(resource_url.into()),
            ..Self::new(page_url, ErrorKind::Resource, message)
        }
    }

    pub fn console(page_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(page_url, ErrorKind::Console, message)
    }

    /// Error synthesized by the scheduler when a visit exceeds its deadline
    pub fn timeout(page_url: impl Into<String>, timeout: Duration) -> Self {
        Self::new(
            page_url,
            ErrorKind::Timeout,
            format!("Page visit timed out after {}ms", timeout.as_millis()),
        )
    }

    /// Marks the error as ignored
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }
}

impl fmt::Display for CrawlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.page_url, self.message)?;
        if let Some(resource) = &self.failed_resource_url {
            write!(f, " ({})", resource)?;
        }
        if self.ignored {
            write!(f, " (ignored)")?;
        }
        Ok(())
    }
}
