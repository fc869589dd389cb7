//! Scope and exclusion filtering for discovered links

use crate::url::matcher::{first_match, UrlPattern};
use crate::url::normalize::resolve_url;
use crate::{ConfigError, UrlError};
use std::fmt;
use url::{Origin, Url};

/// Why a discovered link was dropped
///
/// Rejections are never reported as crawl errors; they only feed logging and
/// statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The link could not be parsed or uses an unsupported scheme
    Malformed(UrlError),
    /// The link points to a different scheme, host, or port than the seed
    OutsideOrigin,
    /// The link matched the given exclusion pattern
    Excluded(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "malformed: {}", e),
            Self::OutsideOrigin => write!(f, "outside crawl origin"),
            Self::Excluded(pattern) => write!(f, "excluded by '{}'", pattern),
        }
    }
}

/// Decides which discovered links belong to the crawl
#[derive(Debug, Clone)]
pub struct UrlFilter {
    origin: Origin,
    exclusions: Vec<UrlPattern>,
}

impl UrlFilter {
    /// Creates a filter scoped to the origin of `seed`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` if any exclusion is empty.
    pub fn new(seed: &Url, exclusions: &[String]) -> Result<Self, ConfigError> {
        let exclusions = exclusions
            .iter()
            .map(|p| UrlPattern::parse(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            origin: seed.origin(),
            exclusions,
        })
    }

    /// Resolves, normalizes, and checks a discovered link
    ///
    /// Checks run in order: parse/normalize, origin, exclusions. The first
    /// matching exclusion pattern is reported.
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_sweep::url::{Rejection, UrlFilter};
    /// use url::Url;
    ///
    /// let seed = Url::parse("https://example.com/").unwrap();
    /// let filter = UrlFilter::new(&seed, &["/admin".to_string()]).unwrap();
    ///
    /// let accepted = filter.accept("/docs/", &seed).unwrap();
    /// assert_eq!(accepted.as_str(), "https://example.com/docs");
    ///
    /// assert_eq!(filter.accept("https://other.org/", &seed), Err(Rejection::OutsideOrigin));
    /// assert!(matches!(filter.accept("/admin/x", &seed), Err(Rejection::Excluded(_))));
    /// ```
    pub fn accept(&self, link: &str, base: &Url) -> Result<Url, Rejection> {
        let url = resolve_url(link, base).map_err(Rejection::Malformed)?;

        if url.origin() != self.origin {
            return Err(Rejection::OutsideOrigin);
        }

        if let Some(pattern) = first_match(&self.exclusions, &url) {
            return Err(Rejection::Excluded(pattern.as_str().to_string()));
        }

        Ok(url)
    }

    /// Returns true if `url` matches any exclusion pattern
    pub fn is_excluded(&self, url: &Url) -> bool {
        first_match(&self.exclusions, url).is_some()
    }
}
