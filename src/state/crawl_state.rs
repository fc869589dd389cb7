//! Scheduler lifecycle states
//!
//! A crawl moves through these states exactly once, except that `Running` and
//! `Draining` may alternate while completions keep producing new work.

use std::fmt;

/// Represents the current state of the crawl scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    /// Scheduler created, frontier seeded, nothing dispatched yet
    Idle,

    /// Frontier has entries; free slots are being filled
    Running,

    /// Frontier is empty but visits are still in flight
    Draining,

    /// Frontier empty and nothing in flight; the crawl is over
    Done,
}

impl CrawlState {
    /// Returns true if the scheduler may move from `self` to `next`
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Draining)
                | (Self::Running, Self::Done)
                | (Self::Draining, Self::Running)
                | (Self::Draining, Self::Done)
        )
    }

    /// Returns true once no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true while visits may be dispatched or in flight
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Draining)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        }
    }

    /// Returns all scheduler states in lifecycle order
    pub fn all_states() -> Vec<Self> {
        vec![Self::Idle, Self::Running, Self::Draining, Self::Done]
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
