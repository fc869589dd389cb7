use crate::crawler::Depth;
use crate::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default per-page visit deadline in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Upper bound for the default concurrency
pub const MAX_DEFAULT_CONCURRENCY: usize = 16;

/// Default number of extra attempts for retryable visits
pub const DEFAULT_RETRIES: u32 = 1;

/// Options for a single crawl
///
/// Built once before the crawl starts and never changed afterwards; the
/// scheduler owns it for the lifetime of the crawl.
#[derive(Debug, Clone)]
pub struct CrawlerOptions {
    /// Seed URL; also defines the crawl origin
    pub url: Url,

    /// Link hops allowed from the seed
    pub depth: Depth,

    /// Glob or substring patterns for URLs that must never be visited
    pub exclusions: Vec<String>,

    /// Per-page visit deadline
    pub timeout: Duration,

    /// Maximum number of visits in flight
    pub concurrency: usize,

    /// Suppresses progress output
    pub silent: bool,

    /// Extra attempts granted to a page whose visit failed with a retryable error
    pub retries: u32,

    /// Patterns of failed resource URLs that are reported but do not fail the crawl
    pub ignore: Vec<String>,
}

impl CrawlerOptions {
    /// Creates options for `url` with every other field at its default
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` unless `url` is an absolute http(s)
    /// URL with a host.
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_sweep::config::CrawlerOptions;
    /// use sumi_sweep::Depth;
    ///
    /// let options = CrawlerOptions::new("https://example.com")
    ///     .unwrap()
    ///     .with_depth(Depth::Limited(2))
    ///     .with_concurrency(4);
    /// assert_eq!(options.concurrency, 4);
    /// ```
    pub fn new(url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            url: parse_seed_url(url)?,
            depth: Depth::Unbounded,
            exclusions: Vec::new(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            concurrency: default_concurrency(),
            silent: false,
            retries: DEFAULT_RETRIES,
            ignore: Vec::new(),
        })
    }

    pub fn with_depth(mut self, depth: Depth) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_exclusions<I, S>(mut self, exclusions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions = exclusions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_ignore<I, S>(mut self, ignore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore = ignore.into_iter().map(Into::into).collect();
        self
    }
}

/// `min(available CPUs, 16)`, never less than 1
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_DEFAULT_CONCURRENCY)
}

/// Parses and checks a seed URL
pub(crate) fn parse_seed_url(url: &str) -> Result<Url, ConfigError> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", url, e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' must use http or https",
            url
        )));
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            url
        )));
    }

    Ok(parsed)
}

/// Top-level structure of a TOML configuration file
///
/// Every key is optional so that command-line flags can fill the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub crawler: CrawlerSection,

    #[serde(default)]
    pub report: ReportSection,
}

/// `[crawler]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrawlerSection {
    /// Seed URL
    pub url: Option<String>,

    /// Maximum link depth; absent means unbounded
    pub depth: Option<u32>,

    /// Exclusion patterns
    #[serde(default)]
    pub exclusions: Vec<String>,

    /// Per-page visit deadline (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: Option<u64>,

    /// Maximum number of concurrent page visits
    pub concurrency: Option<usize>,

    /// Retry budget for retryable visit failures
    pub retries: Option<u32>,

    /// Failed-resource patterns to ignore
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Suppress progress output
    #[serde(default)]
    pub silent: bool,
}

impl CrawlerSection {
    /// Converts the section into validated crawl options
    ///
    /// # Errors
    ///
    /// Fails if no seed URL is present or any value is out of range.
    pub fn into_options(self) -> Result<CrawlerOptions, ConfigError> {
        let url = self.url.as_deref().ok_or_else(|| {
            ConfigError::Validation("A seed URL is required (crawler.url)".to_string())
        })?;

        let mut options = CrawlerOptions::new(url)?
            .with_depth(self.depth.map_or(Depth::Unbounded, Depth::Limited))
            .with_exclusions(self.exclusions)
            .with_ignore(self.ignore)
            .with_silent(self.silent);

        if let Some(timeout_ms) = self.timeout_ms {
            options.timeout = Duration::from_millis(timeout_ms);
        }
        if let Some(concurrency) = self.concurrency {
            options.concurrency = concurrency;
        }
        if let Some(retries) = self.retries {
            options.retries = retries;
        }

        crate::config::validate_options(&options)?;
        Ok(options)
    }
}

/// `[report]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportSection {
    /// Where to write the report; the extension picks the format
    pub path: Option<PathBuf>,
}
