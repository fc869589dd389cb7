//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the scheduler lifecycle (idle, running, draining, done)
//! - `VisitedSet`: the concurrent claim set that guarantees at-most-once visits

mod crawl_state;
mod visited;

// Re-export main types
pub use crawl_state::CrawlState;
pub use visited::VisitedSet;
