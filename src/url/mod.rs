//! URL handling module for Sumi-Sweep
//!
//! This module provides URL normalization, glob/substring pattern matching,
//! and the scope filter that decides which discovered links join the crawl.

mod filter;
mod matcher;
mod normalize;

// Re-export main functions
pub use filter::{Rejection, UrlFilter};
pub use matcher::{first_match, matches_glob, UrlPattern};
pub use normalize::{normalize_parsed, normalize_url, resolve_url};
