//! Pending-work queue for the scheduler
//!
//! The frontier is owned by the dispatch loop, so it is a plain FIFO with no
//! locking. Entries reach it only after their URL has been claimed in the
//! visited set.

use std::collections::VecDeque;
use std::fmt;
use url::Url;

/// Link hops still allowed below a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Depth {
    /// Follow links without limit
    #[default]
    Unbounded,

    /// Follow at most this many more hops; `Limited(0)` visits the page only
    Limited(u32),
}

impl Depth {
    /// Depth granted to links found on a page at this depth
    ///
    /// Returns `None` at `Limited(0)`, so no entry can ever carry a negative
    /// depth.
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_sweep::Depth;
    ///
    /// assert_eq!(Depth::Limited(2).child(), Some(Depth::Limited(1)));
    /// assert_eq!(Depth::Limited(0).child(), None);
    /// assert_eq!(Depth::Unbounded.child(), Some(Depth::Unbounded));
    /// ```
    pub fn child(self) -> Option<Depth> {
        match self {
            Self::Unbounded => Some(Self::Unbounded),
            Self::Limited(0) => None,
            Self::Limited(n) => Some(Self::Limited(n - 1)),
        }
    }

    /// Returns true if links found at this depth may be followed
    pub fn allows_children(self) -> bool {
        self.child().is_some()
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => write!(f, "unbounded"),
            Self::Limited(n) => write!(f, "{}", n),
        }
    }
}

/// A URL waiting to be visited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Normalized URL of the page
    pub url: Url,

    /// Page on which the link was found; `None` for the seed
    pub parent_url: Option<Url>,

    /// Hops still allowed below this page
    pub remaining_depth: Depth,

    /// Hops from the seed to this page
    pub hops: u32,
}

impl FrontierEntry {
    /// Entry for the seed page
    pub fn seed(url: Url, depth: Depth) -> Self {
        Self {
            url,
            parent_url: None,
            remaining_depth: depth,
            hops: 0,
        }
    }

    /// Entry for a link found on this page, or `None` if the depth is spent
    pub fn child(&self, url: Url) -> Option<Self> {
        let remaining_depth = self.remaining_depth.child()?;
        Some(Self {
            url,
            parent_url: Some(self.url.clone()),
            remaining_depth,
            hops: self.hops + 1,
        })
    }
}

/// FIFO of entries in discovery order
#[derive(Debug, Default)]
pub struct Frontier {
    entries: VecDeque<FrontierEntry>,
    pushed: u64,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: FrontierEntry) {
        tracing::trace!(
            "Frontier push: {} (depth {}, hops {})",
            entry.url,
            entry.remaining_depth,
            entry.hops
        );
        self.pushed += 1;
        self.entries.push_back(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = FrontierEntry>) {
        for entry in entries {
            self.push(entry);
        }
    }

    /// Takes the oldest entry; `None` when empty
    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total entries ever pushed
    pub fn total_pushed(&self) -> u64 {
        self.pushed
    }
}
