//! The page-visiting capability the scheduler drives
//!
//! The scheduler knows nothing about browsers or HTTP. It hands a URL and a
//! deadline to a [`PageVisitor`] and gets back the links found on the page and
//! any problems detected while loading it.

use crate::report::CrawlerError;
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;
use url::Url;

/// What a successful visit found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageVisit {
    /// Raw link targets as they appear on the page (absolute or relative)
    pub links: Vec<String>,

    /// Problems that did not prevent the page from loading
    pub errors: Vec<CrawlerError>,
}

impl PageVisit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links = links.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_errors(mut self, errors: Vec<CrawlerError>) -> Self {
        self.errors = errors;
        self
    }
}

/// A failure that may go away if the page is visited again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryableCrawlerError {
    /// Errors to record if every attempt fails
    pub crawler_errors: Vec<CrawlerError>,
}

impl RetryableCrawlerError {
    pub fn new(crawler_errors: Vec<CrawlerError>) -> Self {
        Self { crawler_errors }
    }
}

impl fmt::Display for RetryableCrawlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.crawler_errors.first() {
            Some(first) if self.crawler_errors.len() > 1 => write!(
                f,
                "{} (and {} more)",
                first.message,
                self.crawler_errors.len() - 1
            ),
            Some(first) => write!(f, "{}", first.message),
            None => write!(f, "retryable failure"),
        }
    }
}

impl std::error::Error for RetryableCrawlerError {}

/// Why a visit produced no page
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VisitError {
    /// The page could not be loaded; recorded as a `navigation` error
    #[error("{0}")]
    Navigation(String),

    /// The page may load on another attempt
    #[error("{0}")]
    Retryable(RetryableCrawlerError),
}

impl VisitError {
    pub fn navigation(message: impl Into<String>) -> Self {
        Self::Navigation(message.into())
    }

    pub fn retryable(crawler_errors: Vec<CrawlerError>) -> Self {
        Self::Retryable(RetryableCrawlerError::new(crawler_errors))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }
}

/// Loads one page and reports its links and errors
///
/// The scheduler drops the returned future once `deadline` passes, so an
/// implementation must release whatever it holds on drop. Honouring the
/// deadline itself is optional but lets the visitor report partial results
/// instead of a bare timeout.
///
/// # Example
///
/// ```
/// use sumi_sweep::crawler::{PageVisit, PageVisitor, VisitError};
/// use tokio::time::Instant;
/// use url::Url;
///
/// struct Static;
///
/// #[async_trait::async_trait]
/// impl PageVisitor for Static {
///     async fn visit(&self, url: &Url, _deadline: Instant) -> Result<PageVisit, VisitError> {
///         if url.path() == "/" {
///             Ok(PageVisit::new().with_links(["/about"]))
///         } else {
///             Ok(PageVisit::new())
///         }
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait PageVisitor: Send + Sync {
    async fn visit(&self, url: &Url, deadline: Instant) -> Result<PageVisit, VisitError>;
}

#[async_trait::async_trait]
impl<T: PageVisitor + ?Sized> PageVisitor for Arc<T> {
    async fn visit(&self, url: &Url, deadline: Instant) -> Result<PageVisit, VisitError> {
        (**self).visit(url, deadline).await
    }
}
