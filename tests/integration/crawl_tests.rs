//! Integration tests for the crawl scheduler
//!
//! These tests drive the scheduler with scripted in-memory visitors, so every
//! page's links, failures, and timing are fully controlled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sumi_sweep::crawler::{crawl, PageVisit, PageVisitor, VisitError};
use sumi_sweep::report::ErrorKind;
use sumi_sweep::{CrawlerError, CrawlerOptions, Depth};
use tokio::time::Instant;
use url::Url;

const SEED: &str = "https://site.test/";

/// What a scripted page does when visited
#[derive(Clone)]
enum Page {
    Links(Vec<&'static str>),
    LinksWithErrors(Vec<&'static str>, Vec<CrawlerError>),
    Broken(&'static str),
    /// Fails retryably this many times, then serves the links
    Flaky(usize, Vec<&'static str>),
    Hang,
}

/// In-memory site keyed by path; unknown paths are empty pages
struct ScriptedSite {
    pages: HashMap<&'static str, Page>,
    delay: Duration,
    visits: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedSite {
    fn new(pages: Vec<(&'static str, Page)>) -> Arc<Self> {
        Self::with_delay(pages, Duration::ZERO)
    }

    fn with_delay(pages: Vec<(&'static str, Page)>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            pages: pages.into_iter().collect(),
            delay,
            visits: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        })
    }

    fn visits_to(&self, path: &str) -> usize {
        let url = Url::parse(SEED).unwrap().join(path).unwrap();
        self.visits
            .lock()
            .unwrap()
            .get(url.as_str())
            .copied()
            .unwrap_or(0)
    }

    fn visited_urls(&self) -> Vec<String> {
        let mut urls: Vec<_> = self.visits.lock().unwrap().keys().cloned().collect();
        urls.sort();
        urls
    }

    fn max_visits_per_url(&self) -> usize {
        self.visits.lock().unwrap().values().copied().max().unwrap_or(0)
    }
}

/// Decrements the in-flight gauge even when the visit future is dropped
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl PageVisitor for ScriptedSite {
    async fn visit(&self, url: &Url, _deadline: Instant) -> Result<PageVisit, VisitError> {
        let attempt = {
            let mut visits = self.visits.lock().unwrap();
            let count = visits.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.pages.get(url.path()).cloned() {
            None => Ok(PageVisit::new()),
            Some(Page::Links(links)) => Ok(PageVisit::new().with_links(links)),
            Some(Page::LinksWithErrors(links, errors)) => {
                Ok(PageVisit::new().with_links(links).with_errors(errors))
            }
            Some(Page::Broken(message)) => Err(VisitError::navigation(message)),
            Some(Page::Flaky(failures, _)) if attempt <= failures => {
                Err(VisitError::retryable(vec![CrawlerError::navigation(
                    url.as_str(),
                    "HTTP 503 Service Unavailable",
                )]))
            }
            Some(Page::Flaky(_, links)) => Ok(PageVisit::new().with_links(links)),
            Some(Page::Hang) => std::future::pending().await,
        }
    }
}

fn options() -> CrawlerOptions {
    CrawlerOptions::new(SEED)
        .unwrap()
        .with_concurrency(4)
        .with_timeout(Duration::from_secs(5))
        .with_silent(true)
}

#[tokio::test]
async fn test_depth_one_scenario() {
    let site = ScriptedSite::new(vec![
        ("/", Page::Links(vec!["/a", "/b"])),
        ("/a", Page::Links(vec!["/c"])),
        ("/b", Page::Links(vec!["/c"])),
    ]);

    let outcome = crawl(options().with_depth(Depth::Limited(1)), site.clone())
        .await
        .unwrap();

    assert_eq!(site.visits_to("/"), 1);
    assert_eq!(site.visits_to("/a"), 1);
    assert_eq!(site.visits_to("/b"), 1);
    assert_eq!(site.visits_to("/c"), 0);
    assert!(outcome.errors.pages.is_empty());
    assert_eq!(outcome.stats.pages_visited, 3);
    assert_eq!(outcome.stats.depth_breakdown.get(&1), Some(&2));
}

#[tokio::test]
async fn test_depth_zero_visits_only_seed() {
    let site = ScriptedSite::new(vec![("/", Page::Links(vec!["/a", "/b"]))]);

    let outcome = crawl(options().with_depth(Depth::Limited(0)), site.clone())
        .await
        .unwrap();

    assert_eq!(site.visited_urls(), vec![SEED.to_string()]);
    assert_eq!(outcome.stats.links_enqueued, 0);
}

#[tokio::test]
async fn test_depth_exactness_on_a_chain() {
    let site = ScriptedSite::new(vec![
        ("/", Page::Links(vec!["/1"])),
        ("/1", Page::Links(vec!["/2"])),
        ("/2", Page::Links(vec!["/3"])),
        ("/3", Page::Links(vec!["/4"])),
    ]);

    crawl(options().with_depth(Depth::Limited(2)), site.clone())
        .await
        .unwrap();

    assert_eq!(site.visits_to("/1"), 1);
    assert_eq!(site.visits_to("/2"), 1);
    assert_eq!(site.visits_to("/3"), 0);
}

#[tokio::test]
async fn test_self_link_visited_once() {
    let site = ScriptedSite::new(vec![("/", Page::Links(vec!["/", SEED, "/#top", "/?utm_source=x"]))]);

    let outcome = crawl(options(), site.clone()).await.unwrap();

    assert_eq!(site.visits_to("/"), 1);
    assert_eq!(outcome.stats.pages_visited, 1);
    assert_eq!(outcome.stats.links_duplicate, 4);
}

#[tokio::test]
async fn test_cycles_terminate_without_duplicates() {
    let site = ScriptedSite::with_delay(
        vec![
            ("/", Page::Links(vec!["/a", "/b", "/c"])),
            ("/a", Page::Links(vec!["/b", "/c", "/"])),
            ("/b", Page::Links(vec!["/a", "/c", "/d"])),
            ("/c", Page::Links(vec!["/a", "/b", "/d"])),
            ("/d", Page::Links(vec!["/", "/a"])),
        ],
        Duration::from_millis(5),
    );

    let outcome = crawl(options(), site.clone()).await.unwrap();

    assert_eq!(site.visited_urls().len(), 5);
    assert_eq!(site.max_visits_per_url(), 1);
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_no_duplicate_visits_under_concurrent_discovery() {
    // Every page links to every other page, discovered by many workers at once
    let paths: Vec<&'static str> = vec!["/p0", "/p1", "/p2", "/p3", "/p4", "/p5", "/p6", "/p7"];
    let mut pages: Vec<(&'static str, Page)> = paths
        .iter()
        .map(|p| (*p, Page::Links(paths.clone())))
        .collect();
    pages.push(("/", Page::Links(paths.clone())));
    let site = ScriptedSite::with_delay(pages, Duration::from_millis(2));

    let outcome = crawl(options().with_concurrency(8), site.clone()).await.unwrap();

    assert_eq!(site.visited_urls().len(), 9);
    assert_eq!(site.max_visits_per_url(), 1);
    assert_eq!(outcome.stats.pages_visited, 9);
    assert_eq!(outcome.stats.links_enqueued, 8);
}

#[tokio::test]
async fn test_concurrency_bound_never_exceeded() {
    let children: Vec<&'static str> = vec![
        "/1", "/2", "/3", "/4", "/5", "/6", "/7", "/8", "/9", "/10", "/11", "/12",
    ];
    let site = ScriptedSite::with_delay(
        vec![("/", Page::Links(children))],
        Duration::from_millis(20),
    );

    let outcome = crawl(options().with_concurrency(3), site.clone())
        .await
        .unwrap();

    assert_eq!(site.max_in_flight.load(Ordering::SeqCst), 3);
    assert_eq!(outcome.stats.peak_in_flight, 3);
    assert_eq!(outcome.stats.pages_visited, 13);
}

#[tokio::test]
async fn test_concurrency_one_is_sequential() {
    let site = ScriptedSite::with_delay(
        vec![("/", Page::Links(vec!["/a", "/b", "/c"]))],
        Duration::from_millis(5),
    );

    crawl(options().with_concurrency(1), site.clone()).await.unwrap();

    assert_eq!(site.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(site.visited_urls().len(), 4);
}

#[tokio::test]
async fn test_excluded_links_never_dispatched() {
    let site = ScriptedSite::new(vec![
        ("/", Page::Links(vec!["/admin/x", "/docs", "/files/report.pdf"])),
        ("/docs", Page::Links(vec!["/admin", "/admin/y"])),
    ]);

    let outcome = crawl(
        options().with_exclusions(["/admin", "*.pdf"]),
        site.clone(),
    )
    .await
    .unwrap();

    assert_eq!(
        site.visited_urls(),
        vec![SEED.to_string(), "https://site.test/docs".to_string()]
    );
    assert_eq!(outcome.stats.links_rejected, 4);
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_off_origin_links_never_dispatched() {
    let site = ScriptedSite::new(vec![(
        "/",
        Page::Links(vec![
            "https://other.test/",
            "http://site.test/insecure",
            "https://site.test:8443/port",
            "mailto:someone@site.test",
            "/ok",
        ]),
    )]);

    let outcome = crawl(options(), site.clone()).await.unwrap();

    assert_eq!(site.visited_urls().len(), 2);
    assert_eq!(site.visits_to("/ok"), 1);
    assert_eq!(outcome.stats.links_rejected, 4);
}

#[tokio::test]
async fn test_hung_page_times_out_in_isolation() {
    let site = ScriptedSite::new(vec![
        ("/", Page::Links(vec!["/slow", "/fast"])),
        ("/fast", Page::Links(vec!["/deeper"])),
        ("/slow", Page::Hang),
    ]);

    let outcome = crawl(
        options().with_timeout(Duration::from_millis(50)),
        site.clone(),
    )
    .await
    .unwrap();

    assert_eq!(site.visits_to("/deeper"), 1);
    assert_eq!(site.visits_to("/slow"), 1);
    assert_eq!(site.in_flight.load(Ordering::SeqCst), 0);

    let pages: Vec<_> = outcome.errors.pages.iter().cloned().collect();
    assert_eq!(pages, vec!["https://site.test/slow".to_string()]);
    assert_eq!(outcome.errors.errors.len(), 1);
    assert_eq!(outcome.errors.errors[0].kind, ErrorKind::Timeout);
    assert_eq!(outcome.stats.pages_timed_out, 1);
}

#[tokio::test]
async fn test_retryable_page_recovers() {
    let site = ScriptedSite::new(vec![
        ("/", Page::Links(vec!["/flaky"])),
        ("/flaky", Page::Flaky(1, vec!["/after"])),
    ]);

    let outcome = crawl(options(), site.clone()).await.unwrap();

    assert_eq!(site.visits_to("/flaky"), 2);
    assert_eq!(site.visits_to("/after"), 1);
    assert!(outcome.is_success());
    assert_eq!(outcome.stats.retries, 1);
}

#[tokio::test]
async fn test_retry_budget_exhausted() {
    let site = ScriptedSite::new(vec![
        ("/", Page::Links(vec!["/down"])),
        ("/down", Page::Flaky(10, vec![])),
    ]);

    let outcome = crawl(options().with_retries(2), site.clone()).await.unwrap();

    assert_eq!(site.visits_to("/down"), 3);
    assert!(outcome.errors.pages.contains("https://site.test/down"));
    assert_eq!(outcome.errors.errors[0].message, "HTTP 503 Service Unavailable");
}

#[tokio::test]
async fn test_navigation_failure_does_not_stop_crawl() {
    let site = ScriptedSite::new(vec![
        ("/", Page::Links(vec!["/gone", "/fine"])),
        ("/gone", Page::Broken("HTTP 404 Not Found")),
        ("/fine", Page::Links(vec!["/more"])),
    ]);

    let outcome = crawl(options(), site.clone()).await.unwrap();

    assert_eq!(site.visits_to("/more"), 1);
    assert_eq!(site.visits_to("/gone"), 1);
    assert!(!outcome.is_success());
    let errors: Vec<_> = outcome.errors.errors_for("https://site.test/gone").collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Navigation);
    assert_eq!(errors[0].message, "HTTP 404 Not Found");
}

#[tokio::test]
async fn test_resource_errors_and_ignore_patterns() {
    let seed = SEED;
    let site = ScriptedSite::new(vec![(
        "/",
        Page::LinksWithErrors(
            vec![],
            vec![
                CrawlerError::resource(seed, "https://cdn.test/analytics.js", "HTTP 404 Not Found"),
                CrawlerError::resource(seed, "https://cdn.test/analytics.js", "HTTP 404 Not Found"),
            ],
        ),
    )]);

    let outcome = crawl(options().with_ignore(["*analytics*"]), site.clone())
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.errors.errors.len(), 1);
    assert!(outcome.errors.errors[0].ignored);
}

#[tokio::test]
async fn test_empty_site_completes() {
    let site = ScriptedSite::new(vec![]);
    let outcome = crawl(options(), site.clone()).await.unwrap();

    assert_eq!(outcome.stats.pages_visited, 1);
    assert!(outcome.is_success());
    assert!(outcome.errors.details.is_none());
}

#[tokio::test]
async fn test_invalid_options_are_rejected() {
    let site = ScriptedSite::new(vec![]);

    let zero_concurrency = crawl(options().with_concurrency(0), site.clone()).await;
    assert!(zero_concurrency.is_err());

    let zero_timeout = crawl(options().with_timeout(Duration::ZERO), site.clone()).await;
    assert!(zero_timeout.is_err());

    let empty_pattern = crawl(options().with_exclusions([""]), site.clone()).await;
    assert!(empty_pattern.is_err());

    assert!(site.visited_urls().is_empty());
}
