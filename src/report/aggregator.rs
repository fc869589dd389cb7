//! Collection and de-duplication of per-page errors

use crate::report::types::{CrawlerError, ErrorKind};
use crate::url::UrlPattern;
use crate::ConfigError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Mutex, PoisonError};

/// Identity of an error for de-duplication purposes
type ErrorKey = (String, ErrorKind, Option<String>);

/// Final, de-duplicated result of a crawl
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorCollection {
    /// Pages with at least one error that is not ignored
    pub pages: BTreeSet<String>,

    /// Human-readable listing of every recorded error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Every recorded error (ignored ones included) in recording order
    pub errors: Vec<CrawlerError>,
}

impl ErrorCollection {
    /// Returns true when no page failed
    pub fn is_success(&self) -> bool {
        self.pages.is_empty()
    }

    /// Iterates over the errors recorded for one page
    pub fn errors_for<'a>(&'a self, page_url: &'a str) -> impl Iterator<Item = &'a CrawlerError> {
        self.errors.iter().filter(move |e| e.page_url == page_url)
    }

    /// Counts errors by kind, ignored ones excluded
    pub fn counts_by_kind(&self) -> BTreeMap<ErrorKind, usize> {
        let mut counts = BTreeMap::new();
        for error in self.errors.iter().filter(|e| !e.ignored) {
            *counts.entry(error.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn ignored_count(&self) -> usize {
        self.errors.iter().filter(|e| e.ignored).count()
    }
}

#[derive(Debug, Default)]
struct AggregatorState {
    seen: HashSet<ErrorKey>,
    errors: Vec<CrawlerError>,
}

/// Thread-safe sink for errors produced by concurrent page visits
///
/// `record` calls are serialized by an internal mutex. Duplicates, keyed by
/// `(page_url, kind, failed_resource_url)`, keep the first occurrence.
#[derive(Debug, Default)]
pub struct ErrorAggregator {
    ignore: Vec<UrlPattern>,
    state: Mutex<AggregatorState>,
}

impl ErrorAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an aggregator that marks matching resource failures as ignored
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` if any pattern is empty.
    pub fn with_ignore_patterns(patterns: &[String]) -> Result<Self, ConfigError> {
        let ignore = patterns
            .iter()
            .map(|p| UrlPattern::parse(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            ignore,
            state: Mutex::new(AggregatorState::default()),
        })
    }

    /// Records an error, returning false if an equivalent one was already recorded
    pub fn record(&self, mut error: CrawlerError) -> bool {
        if !error.ignored && self.is_ignored_resource(&error) {
            error.ignored = true;
        }

        let key = (
            error.page_url.clone(),
            error.kind,
            error.failed_resource_url.clone(),
        );

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.seen.insert(key) {
            tracing::trace!("Duplicate error dropped: {}", error);
            return false;
        }

        if error.ignored {
            tracing::debug!("Recorded ignored error: {}", error);
        } else {
            tracing::warn!("{}", error);
        }
        state.errors.push(error);
        true
    }

    /// Records every error in `errors`, returning how many were new
    pub fn record_all(&self, errors: impl IntoIterator<Item = CrawlerError>) -> usize {
        errors
            .into_iter()
            .map(|e| self.record(e))
            .filter(|recorded| *recorded)
            .count()
    }

    /// Number of distinct errors recorded so far
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .errors
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Folds everything recorded into the final collection
    ///
    /// Consumes the aggregator, so no worker can record after this point.
    pub fn finalize(self) -> ErrorCollection {
        let state = self.state.into_inner().unwrap_or_else(PoisonError::into_inner);

        let pages = state
            .errors
            .iter()
            .filter(|e| !e.ignored)
            .map(|e| e.page_url.clone())
            .collect();

        let details = if state.errors.is_empty() {
            None
        } else {
            Some(
                state
                    .errors
                    .iter()
                    .map(|e| format!("- {}", e))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        };

        ErrorCollection {
            pages,
            details,
            errors: state.errors,
        }
    }

    fn is_ignored_resource(&self, error: &CrawlerError) -> bool {
        match &error.failed_resource_url {
            Some(resource) => self.ignore.iter().any(|p| p.matches_str(resource)),
            None => false,
        }
    }
}
