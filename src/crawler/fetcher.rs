//! HTTP fetching for the default page visitor
//!
//! This module handles:
//! - Building the HTTP client with the crawler's user agent
//! - GET requests for pages, bounded by the visit deadline
//! - HEAD probes for sub-resources, with a GET fallback
//! - Error classification (retryable or not)

use reqwest::{redirect::Policy, Client, StatusCode};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Redirect hops followed before a request is treated as failed
const MAX_REDIRECTS: usize = 10;

/// Result of fetching a page
#[derive(Debug)]
pub enum FetchResult {
    /// An HTML page was fetched
    Html {
        /// Final URL after redirects
        final_url: Url,
        /// Page body content
        body: String,
    },

    /// The response was not HTML; nothing to parse
    NotHtml {
        /// The Content-Type received
        content_type: String,
    },

    /// The server answered with an error status
    HttpError {
        /// The HTTP status code
        status: StatusCode,
    },

    /// The request never produced a response
    NetworkError {
        /// Error description
        error: String,
        /// Whether another attempt may succeed
        retryable: bool,
    },
}

impl FetchResult {
    /// Returns true if visiting the page again may give a different result
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError { status } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::NetworkError { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

/// Builds the HTTP client used by [`HttpPageVisitor`](crate::crawler::HttpPageVisitor)
///
/// # Example
///
/// ```
/// use sumi_sweep::crawler::build_http_client;
///
/// let client = build_http_client().unwrap();
/// ```
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Time left before `deadline`, or `None` if it has passed
fn remaining(deadline: Instant) -> Option<Duration> {
    let left = deadline.saturating_duration_since(Instant::now());
    (!left.is_zero()).then_some(left)
}

/// Formats a status the way errors are reported, e.g. `HTTP 404 Not Found`
pub fn status_message(status: StatusCode) -> String {
    format!("HTTP {}", status)
}

fn classify_error(error: &reqwest::Error) -> (String, bool) {
    if error.is_timeout() {
        ("Request timeout".to_string(), true)
    } else if error.is_connect() {
        (format!("Connection failed: {}", error), true)
    } else if error.is_redirect() {
        (format!("Redirect error: {}", error), false)
    } else {
        (error.to_string(), false)
    }
}

/// Fetches a page with GET, giving up at `deadline`
pub async fn fetch_page(client: &Client, url: &Url, deadline: Instant) -> FetchResult {
    let Some(timeout) = remaining(deadline) else {
        return FetchResult::NetworkError {
            error: "Request timeout".to_string(),
            retryable: false,
        };
    };

    let response = match client.get(url.clone()).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => {
            let (error, retryable) = classify_error(&e);
            return FetchResult::NetworkError { error, retryable };
        }
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError { status };
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if !content_type.contains("text/html") && !content_type.contains("application/xhtml+xml") {
        return FetchResult::NotHtml { content_type };
    }

    let final_url = response.url().clone();
    match response.text().await {
        Ok(body) => FetchResult::Html { final_url, body },
        Err(e) => {
            let (error, retryable) = classify_error(&e);
            FetchResult::NetworkError { error, retryable }
        }
    }
}

/// Why a sub-resource probe failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// The server answered with a 4xx or 5xx status
    Status(StatusCode),

    /// The request ran out of time, possibly only because the page's deadline did
    Timeout,

    /// The request never produced a response
    Network(String),
}

impl ProbeFailure {
    /// Returns true if probing again would give the same answer
    pub fn is_definitive(&self) -> bool {
        matches!(self, Self::Status(_))
    }

    fn from_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(classify_error(error).0)
        }
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "{}", status_message(*status)),
            Self::Timeout => write!(f, "Request timeout"),
            Self::Network(error) => write!(f, "{}", error),
        }
    }
}

/// Checks that a sub-resource loads
///
/// Sends HEAD first and falls back to GET when the server does not allow
/// HEAD.
pub async fn probe_resource(
    client: &Client,
    url: &str,
    deadline: Instant,
) -> Result<(), ProbeFailure> {
    let timeout = remaining(deadline).ok_or(ProbeFailure::Timeout)?;

    let head = client
        .head(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| ProbeFailure::from_error(&e))?;

    let status = if head.status() == StatusCode::METHOD_NOT_ALLOWED
        || head.status() == StatusCode::NOT_IMPLEMENTED
    {
        let timeout = remaining(deadline).ok_or(ProbeFailure::Timeout)?;
        client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ProbeFailure::from_error(&e))?
            .status()
    } else {
        head.status()
    };

    if status.is_client_error() || status.is_server_error() {
        return Err(ProbeFailure::Status(status));
    }
    Ok(())
}
