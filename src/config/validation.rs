use crate::config::types::CrawlerOptions;
use crate::url::UrlPattern;
use crate::ConfigError;
use std::time::Duration;

/// Validates crawl options before a scheduler is built
pub fn validate_options(options: &CrawlerOptions) -> Result<(), ConfigError> {
    validate_concurrency(options.concurrency)?;
    validate_timeout(options.timeout)?;
    validate_patterns("exclusion", &options.exclusions)?;
    validate_patterns("ignore", &options.ignore)?;
    Ok(())
}

fn validate_concurrency(concurrency: usize) -> Result<(), ConfigError> {
    if concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be >= 1, got {}",
            concurrency
        )));
    }
    Ok(())
}

fn validate_timeout(timeout: Duration) -> Result<(), ConfigError> {
    if timeout.is_zero() {
        return Err(ConfigError::Validation(
            "timeout must be greater than 0ms".to_string(),
        ));
    }
    Ok(())
}

/// Validates each pattern in a list, naming the list in the error
fn validate_patterns(kind: &str, patterns: &[String]) -> Result<(), ConfigError> {
    for (index, pattern) in patterns.iter().enumerate() {
        UrlPattern::parse(pattern).map_err(|_| {
            ConfigError::InvalidPattern(format!("{} pattern #{} is empty", kind, index + 1))
        })?;
    }
    Ok(())
}
