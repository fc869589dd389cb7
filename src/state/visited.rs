use dashmap::DashSet;
use url::Url;

/// Set of normalized URLs already claimed by the crawl
///
/// A URL is claimed the moment it is accepted into the frontier, not when it
/// is visited, so concurrent discoveries of the same link enqueue it once.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: DashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically inserts `url`, returning true only for the first claimant
    pub fn try_claim(&self, url: &Url) -> bool {
        self.urls.insert(url.as_str().to_string())
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.urls.contains(url.as_str())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
