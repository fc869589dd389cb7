//! Default [`PageVisitor`] backed by plain HTTP
//!
//! Suitable for sites that render without JavaScript. Pages are fetched with
//! GET, parsed for links, and every sub-resource is probed. Console errors are
//! never produced since no script runs.

use crate::crawler::fetcher::{
    build_http_client, fetch_page, probe_resource, status_message, FetchResult,
};
use crate::crawler::parser::parse_html;
use crate::crawler::visitor::{PageVisit, PageVisitor, VisitError};
use crate::report::CrawlerError;
use crate::SweepError;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::sync::Arc;
use tokio::time::Instant;
use url::Url;

/// Resource probes in flight per page
const PROBE_CONCURRENCY: usize = 8;

/// Fetches pages over HTTP and probes their sub-resources
///
/// Definitive probe results (success or an HTTP error status) are cached for
/// the lifetime of the visitor, so a stylesheet shared by every page is
/// requested once; each page that references a broken resource still gets its
/// own `resource` error. Timeouts and network failures are probed again by the
/// next page that references the resource.
#[derive(Debug, Clone)]
pub struct HttpPageVisitor {
    client: Client,
    check_resources: bool,
    probe_cache: Arc<DashMap<String, Option<String>>>,
}

impl HttpPageVisitor {
    /// Creates a visitor with the default HTTP client
    pub fn new() -> Result<Self, SweepError> {
        Ok(Self::with_client(build_http_client()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            check_resources: true,
            probe_cache: Arc::new(DashMap::new()),
        }
    }

    /// Enables or disables sub-resource probing
    pub fn with_resource_checks(mut self, enabled: bool) -> Self {
        self.check_resources = enabled;
        self
    }

    /// Probes every resource, returning a `resource` error per failure
    async fn probe_resources(
        &self,
        page: &Url,
        resources: Vec<String>,
        deadline: Instant,
    ) -> Vec<CrawlerError> {
        stream::iter(resources)
            .map(|resource| async move {
                let failure = self.probe_cached(&resource, deadline).await;
                failure.map(|message| CrawlerError::resource(page.as_str(), resource, message))
            })
            .buffered(PROBE_CONCURRENCY)
            .filter_map(|error| async move { error })
            .collect()
            .await
    }

    /// Returns the failure message for `resource`, if it failed
    ///
    /// Only definitive answers are cached; a timeout may just mean the calling
    /// page ran out of time.
    async fn probe_cached(&self, resource: &str, deadline: Instant) -> Option<String> {
        if let Some(cached) = self.probe_cache.get(resource) {
            return cached.value().clone();
        }

        match probe_resource(&self.client, resource, deadline).await {
            Ok(()) => {
                self.probe_cache.insert(resource.to_string(), None);
                None
            }
            Err(failure) => {
                tracing::debug!("Resource {} failed: {}", resource, failure);
                let message = failure.to_string();
                if failure.is_definitive() {
                    self.probe_cache
                        .insert(resource.to_string(), Some(message.clone()));
                }
                Some(message)
            }
        }
    }
}

#[async_trait::async_trait]
impl PageVisitor for HttpPageVisitor {
    async fn visit(&self, url: &Url, deadline: Instant) -> Result<PageVisit, VisitError> {
        let fetched = fetch_page(&self.client, url, deadline).await;
        let retryable = fetched.is_retryable();

        match fetched {
            FetchResult::Html { final_url, body } => {
                let parsed = parse_html(&body, &final_url);
                tracing::trace!(
                    "Parsed {} ({:?}): {} links, {} resources",
                    final_url,
                    parsed.title,
                    parsed.links.len(),
                    parsed.resources.len()
                );

                let errors = if self.check_resources {
                    self.probe_resources(url, parsed.resources, deadline).await
                } else {
                    Vec::new()
                };

                Ok(PageVisit {
                    links: parsed.links,
                    errors,
                })
            }
            FetchResult::NotHtml { content_type } => {
                tracing::debug!("Skipping non-HTML page {} ({})", url, content_type);
                Ok(PageVisit::new())
            }
            FetchResult::HttpError { status } if retryable => Err(VisitError::retryable(vec![
                CrawlerError::navigation(url.as_str(), status_message(status)),
            ])),
            FetchResult::HttpError { status } => Err(VisitError::navigation(status_message(status))),
            FetchResult::NetworkError { error, .. } if retryable => {
                Err(VisitError::retryable(vec![CrawlerError::navigation(
                    url.as_str(),
                    error,
                )]))
            }
            FetchResult::NetworkError { error, .. } => Err(VisitError::navigation(error)),
        }
    }
}
