//! Integration tests for the HTTP page visitor
//!
//! These tests use wiremock to create mock HTTP servers and run full crawls
//! against them.

use std::time::Duration;
use sumi_sweep::crawler::{crawl, HttpPageVisitor, PageVisitor, VisitError};
use sumi_sweep::report::ErrorKind;
use sumi_sweep::{CrawlerOptions, Depth};
use tokio::time::Instant;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
}

fn options(server: &MockServer) -> CrawlerOptions {
    CrawlerOptions::new(&format!("{}/", server.uri()))
        .unwrap()
        .with_concurrency(4)
        .with_timeout(Duration::from_secs(5))
        .with_silent(true)
}

async fn requests_to(server: &MockServer, http_method: &str, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.to_string() == http_method && r.url.path() == request_path)
        .count()
}

#[tokio::test]
async fn test_full_crawl_finds_broken_links_and_resources() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><head><title>Home</title><link rel="stylesheet" href="/site.css"></head><body>
            <a href="/about">About</a>
            <a href="/missing">Missing</a>
            <a href="https://elsewhere.test/">External</a>
            <img src="/logo.png">
            <img src="/broken.png">
            </body></html>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(
            r#"<html><body><a href="/">Home</a><img src="/logo.png"></body></html>"#,
        ))
        .mount(&server)
        .await;

    for ok in ["/site.css", "/logo.png"] {
        Mock::given(method("HEAD"))
            .and(path(ok))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
    }

    // Unmatched requests (/missing, /broken.png) get wiremock's default 404

    let outcome = crawl(options(&server), HttpPageVisitor::new().unwrap())
        .await
        .unwrap();

    let seed = format!("{}/", server.uri());
    let missing = format!("{}/missing", server.uri());

    assert_eq!(outcome.stats.pages_visited, 3);
    assert!(outcome.errors.pages.contains(&seed));
    assert!(outcome.errors.pages.contains(&missing));
    assert_eq!(outcome.errors.pages.len(), 2);

    let seed_errors: Vec<_> = outcome.errors.errors_for(&seed).collect();
    assert_eq!(seed_errors.len(), 1);
    assert_eq!(seed_errors[0].kind, ErrorKind::Resource);
    assert_eq!(
        seed_errors[0].failed_resource_url.as_deref(),
        Some(format!("{}/broken.png", server.uri()).as_str())
    );

    let missing_errors: Vec<_> = outcome.errors.errors_for(&missing).collect();
    assert_eq!(missing_errors[0].kind, ErrorKind::Navigation);
    assert_eq!(missing_errors[0].message, "HTTP 404 Not Found");

    // Shared resources are probed once per crawl
    assert_eq!(requests_to(&server, "HEAD", "/logo.png").await, 1);
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/unstable">Unstable</a>"#))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/unstable"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let outcome = crawl(options(&server).with_retries(1), HttpPageVisitor::new().unwrap())
        .await
        .unwrap();

    assert_eq!(requests_to(&server, "GET", "/unstable").await, 2);
    assert_eq!(outcome.stats.retries, 1);

    let unstable = format!("{}/unstable", server.uri());
    let errors: Vec<_> = outcome.errors.errors_for(&unstable).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "HTTP 503 Service Unavailable");
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let visitor = HttpPageVisitor::new().unwrap();
    let url = Url::parse(&format!("{}/gone", server.uri())).unwrap();
    let result = visitor
        .visit(&url, Instant::now() + Duration::from_secs(5))
        .await;

    assert_eq!(result, Err(VisitError::navigation("HTTP 410 Gone")));
    assert_eq!(requests_to(&server, "GET", "/gone").await, 1);
}

#[tokio::test]
async fn test_non_html_page_yields_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(br#"{"href": "/not-a-link"}"#.to_vec(), "application/json"),
        )
        .mount(&server)
        .await;

    let visitor = HttpPageVisitor::new().unwrap();
    let url = Url::parse(&format!("{}/data.json", server.uri())).unwrap();
    let visit = visitor
        .visit(&url, Instant::now() + Duration::from_secs(5))
        .await
        .unwrap();

    assert!(visit.links.is_empty());
    assert!(visit.errors.is_empty());
}

#[tokio::test]
async fn test_head_not_allowed_falls_back_to_get() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<script src="/app.js"></script>"#))
        .mount(&server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/app.js"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/app.js"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let outcome = crawl(options(&server), HttpPageVisitor::new().unwrap())
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(requests_to(&server, "GET", "/app.js").await, 1);
}

#[tokio::test]
async fn test_resource_timeout_is_not_cached_across_pages() {
    let server = MockServer::start().await;

    for page in ["/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html(r#"<img src="/r.png">"#))
            .mount(&server)
            .await;
    }

    // The first probe outlives the first page's deadline; later ones are fast
    Mock::given(method("HEAD"))
        .and(path("/r.png"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(800)))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/r.png"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let visitor = HttpPageVisitor::new().unwrap();

    let a = Url::parse(&format!("{}/a", server.uri())).unwrap();
    let visit = visitor
        .visit(&a, Instant::now() + Duration::from_millis(200))
        .await
        .unwrap();
    assert_eq!(visit.errors.len(), 1);
    assert_eq!(visit.errors[0].message, "Request timeout");

    let b = Url::parse(&format!("{}/b", server.uri())).unwrap();
    let visit = visitor
        .visit(&b, Instant::now() + Duration::from_secs(5))
        .await
        .unwrap();
    assert!(visit.errors.is_empty());
    assert_eq!(requests_to(&server, "HEAD", "/r.png").await, 2);
}

#[tokio::test]
async fn test_broken_resource_is_cached_across_pages() {
    let server = MockServer::start().await;

    for page in ["/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html(r#"<img src="/gone.png">"#))
            .mount(&server)
            .await;
    }

    let visitor = HttpPageVisitor::new().unwrap();
    for page in ["/a", "/b"] {
        let url = Url::parse(&format!("{}{}", server.uri(), page)).unwrap();
        let visit = visitor
            .visit(&url, Instant::now() + Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(visit.errors.len(), 1);
        assert_eq!(visit.errors[0].message, "HTTP 404 Not Found");
    }

    assert_eq!(requests_to(&server, "HEAD", "/gone.png").await, 1);
}

#[tokio::test]
async fn test_resource_checks_can_be_disabled() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<img src="/nope.png">"#))
        .mount(&server)
        .await;

    let visitor = HttpPageVisitor::new().unwrap().with_resource_checks(false);
    let outcome = crawl(options(&server), visitor).await.unwrap();

    assert!(outcome.is_success());
    assert_eq!(requests_to(&server, "HEAD", "/nope.png").await, 0);
}

#[tokio::test]
async fn test_slow_page_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/slow">Slow</a><a href="/quick">Quick</a>"#))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<p>late</p>").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/quick"))
        .respond_with(html("<p>quick</p>"))
        .mount(&server)
        .await;

    let outcome = crawl(
        options(&server)
            .with_timeout(Duration::from_millis(200))
            .with_depth(Depth::Limited(1)),
        HttpPageVisitor::new().unwrap(),
    )
    .await
    .unwrap();

    let slow = format!("{}/slow", server.uri());
    assert_eq!(outcome.errors.pages.len(), 1);
    assert!(outcome.errors.pages.contains(&slow));
    let errors: Vec<_> = outcome.errors.errors_for(&slow).collect();
    assert_eq!(errors[0].kind, ErrorKind::Timeout);
}
