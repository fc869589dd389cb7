use crate::ConfigError;
use url::Url;

/// A user-supplied URL pattern used for exclusions and ignored resources
///
/// Patterns containing `*` or `?` are globs; anything else is a plain
/// substring rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlPattern {
    /// `*` matches any run of characters (including `/`), `?` exactly one
    Glob(String),
    /// Matches when the text contains the pattern
    Substring(String),
}

impl UrlPattern {
    /// Parses a pattern string
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` for empty or whitespace-only input.
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(ConfigError::InvalidPattern(
                "Pattern cannot be empty".to_string(),
            ));
        }

        if pattern.contains(['*', '?']) {
            Ok(Self::Glob(pattern.to_string()))
        } else {
            Ok(Self::Substring(pattern.to_string()))
        }
    }

    /// Returns the original pattern text
    pub fn as_str(&self) -> &str {
        match self {
            Self::Glob(p) | Self::Substring(p) => p,
        }
    }

    /// Checks a normalized URL against this pattern
    ///
    /// Globs are tried against the full URL and against the path plus query,
    /// so both `https://*.example.com/*` and `/admin/*` work as expected.
    pub fn matches_url(&self, url: &Url) -> bool {
        match self {
            Self::Substring(p) => url.as_str().contains(p.as_str()),
            Self::Glob(p) => {
                if matches_glob(p, url.as_str()) {
                    return true;
                }
                let mut path = url.path().to_string();
                if let Some(query) = url.query() {
                    path.push('?');
                    path.push_str(query);
                }
                matches_glob(p, &path)
            }
        }
    }

    /// Checks raw text (which may not be a valid URL) against this pattern
    pub fn matches_str(&self, text: &str) -> bool {
        match Url::parse(text) {
            Ok(url) => self.matches_url(&url),
            Err(_) => match self {
                Self::Substring(p) => text.contains(p.as_str()),
                Self::Glob(p) => matches_glob(p, text),
            },
        }
    }
}

/// Returns the first pattern matching `url`, if any
pub fn first_match<'a>(patterns: &'a [UrlPattern], url: &Url) -> Option<&'a UrlPattern> {
    patterns.iter().find(|p| p.matches_url(url))
}

/// Matches `text` against a glob `pattern` supporting `*` and `?`
///
/// The whole text must match. Runs in O(pattern * text) worst case using the
/// usual single-backtrack-point algorithm.
///
/// # Examples
///
/// ```
/// use sumi_sweep::url::matches_glob;
///
/// assert!(matches_glob("/admin/*", "/admin/users"));
/// assert!(matches_glob("*.pdf", "https://example.com/a/report.pdf"));
/// assert!(matches_glob("/page?", "/page2"));
/// assert!(!matches_glob("/admin/*", "/blog/admin/x"));
/// ```
pub fn matches_glob(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<usize> = None;
    let mut star_t = 0;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some(p);
            star_t = t;
            p += 1;
        } else if let Some(star_p) = star {
            // Let the last star swallow one more character
            p = star_p + 1;
            star_t += 1;
            t = star_t;
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }

    p == pattern.len()
}
