use std::time::Duration;

use httpmock::prelude::*;
use ladle_core::{ContentFetcher, FetchError, HttpFetcher, HttpFetcherBuilder};

fn fetcher() -> HttpFetcher {
    HttpFetcherBuilder::from_lookup(|_| None)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

#[tokio::test]
async fn fetches_html_body() {
    let server = MockServer::start_async().await;
    let page = server
        .mock_async(|when, then| {
            when.method(GET).path("/r1");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body("<html><body><h1>Soup</h1></body></html>");
        })
        .await;

    let body = fetcher().fetch(&server.url("/r1")).await.unwrap();

    assert_eq!(body, "<html><body><h1>Soup</h1></body></html>");
    page.assert_async().await;
}

#[tokio::test]
async fn sends_configured_user_agent() {
    let server = MockServer::start_async().await;
    let page = server
        .mock_async(|when, then| {
            when.method(GET).path("/ua").header("user-agent", "ladle-test/1.0");
            then.status(200).body("ok");
        })
        .await;

    let fetcher = HttpFetcherBuilder::from_lookup(|_| None)
        .user_agent("ladle-test/1.0")
        .build()
        .unwrap();
    assert_eq!(fetcher.fetch(&server.url("/ua")).await.unwrap(), "ok");
    page.assert_async().await;
}

#[tokio::test]
async fn error_status_is_reported_without_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/missing");
            then.status(404).body("<h1>Not Found</h1>");
        })
        .await;

    let err = fetcher().fetch(&server.url("/missing")).await.unwrap_err();

    assert!(matches!(err, FetchError::HttpStatus { status: 404 }));
    assert!(!err.is_network());
}

#[tokio::test]
async fn redirects_are_followed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/old");
            then.status(301).header("location", server.url("/new"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/new");
            then.status(200).body("moved here");
        })
        .await;

    assert_eq!(fetcher().fetch(&server.url("/old")).await.unwrap(), "moved here");
}

#[tokio::test]
async fn legacy_charset_is_decoded() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/latin1");
            then.status(200)
                .header("content-type", "text/html; charset=iso-8859-1")
                .body(b"<p>Cr\xe8me br\xfbl\xe9e</p>".as_slice());
        })
        .await;

    let body = fetcher().fetch(&server.url("/latin1")).await.unwrap();
    assert_eq!(body, "<p>Crème brûlée</p>");
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(Duration::from_secs(3)).body("late");
        })
        .await;

    let fetcher = HttpFetcherBuilder::from_lookup(|_| None)
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let err = fetcher.fetch(&server.url("/slow")).await.unwrap_err();

    assert!(matches!(err, FetchError::Timeout(_)), "got {err:?}");
    assert!(err.is_network());
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    // Port 1 on loopback is never listening in test environments.
    let err = fetcher().fetch("http://127.0.0.1:1/r1").await.unwrap_err();
    assert!(err.is_network(), "got {err:?}");
}
