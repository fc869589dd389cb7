//! HTML parser for extracting links and sub-resources
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (from <a> tags and canonical links)
//! - Sub-resources to probe (images, scripts, stylesheets, frames, media sources)
//! - Page title

use scraper::{Html, Selector};
use url::Url;

/// Sub-resource selectors and the attribute holding the URL
const RESOURCE_SELECTORS: &[(&str, &str)] = &[
    ("img[src]", "src"),
    ("script[src]", "src"),
    ("link[rel~='stylesheet'][href]", "href"),
    ("iframe[src]", "src"),
    ("source[src]", "src"),
];

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Links to follow, absolute, in document order
    pub links: Vec<String>,

    /// Sub-resource URLs, absolute and de-duplicated, in document order
    pub resources: Vec<String>,
}

/// Parses HTML content and extracts links, resources, and the title
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
///
/// # Example
///
/// ```
/// use sumi_sweep::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a><img src="/logo.png"></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// assert_eq!(parsed.resources, vec!["https://example.com/logo.png".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, base_url),
        resources: extract_resources(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(absolute_url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.push(absolute_url);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(absolute_url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.push(absolute_url);
            }
        }
    }

    links
}

/// Extracts sub-resource URLs, skipping duplicates
fn extract_resources(document: &Html, base_url: &Url) -> Vec<String> {
    let mut resources: Vec<String> = Vec::new();

    for (selector, attr) in RESOURCE_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(absolute_url) = element
                .value()
                .attr(attr)
                .and_then(|src| resolve_link(src, base_url))
            {
                if !resources.contains(&absolute_url) {
                    resources.push(absolute_url);
                }
            }
        }
    }

    resources
}

/// Resolves an attribute value to an absolute http(s) URL
///
/// Returns None for empty values, `javascript:`, `mailto:`, `tel:` and
/// `data:` targets, fragment-only links, and anything that does not resolve
/// to http or https.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}
