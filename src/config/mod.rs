//! Configuration module for Sumi-Sweep
//!
//! Crawl options can be built in code or loaded from a TOML file whose values
//! the command line may override.
//!
//! # Example
//!
//! ```no_run
//! use sumi_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sweep.toml")).unwrap();
//! let options = config.crawler.into_options().unwrap();
//! println!("Crawling {} with {} workers", options.url, options.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    default_concurrency, CrawlerOptions, CrawlerSection, FileConfig, ReportSection,
    DEFAULT_RETRIES, DEFAULT_TIMEOUT_MS, MAX_DEFAULT_CONCURRENCY,
};

// Re-export parser and validation functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate_options;
