//! `HttpFetcher` against a local server.

use std::time::Duration;

use axum::{http::HeaderMap, http::StatusCode, routing::get, Router};
use tokio::net::TcpListener;

use ufc_rankings::fetch::{Fetcher, HttpFetcher};

async fn start() -> String {
    let app = Router::new()
        .route("/ok", get(|| async { "<html>ok</html>" }))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/agent",
            get(|headers: HeaderMap| async move {
                headers
                    .get("user-agent")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_fetch_returns_body() {
    let base = start().await;
    let fetcher = HttpFetcher::new(Duration::from_secs(2), "test-agent/1.0").unwrap();
    let body = fetcher.fetch(&format!("{}/ok", base)).await.unwrap();
    assert_eq!(body, "<html>ok</html>");
}

#[tokio::test]
async fn test_fetch_sends_user_agent() {
    let base = start().await;
    let fetcher = HttpFetcher::new(Duration::from_secs(2), "test-agent/1.0").unwrap();
    let body = fetcher.fetch(&format!("{}/agent", base)).await.unwrap();
    assert_eq!(body, "test-agent/1.0");
}

#[tokio::test]
async fn test_non_success_status_is_fetch_error() {
    let base = start().await;
    let url = format!("{}/missing", base);
    let fetcher = HttpFetcher::new(Duration::from_secs(2), "test").unwrap();

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert_eq!(err.url, url);
    assert!(err.cause.contains("404"), "cause={}", err.cause);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let base = start().await;
    let fetcher = HttpFetcher::new(Duration::from_millis(200), "test").unwrap();

    let started = std::time::Instant::now();
    let err = fetcher.fetch(&format!("{}/slow", base)).await.unwrap_err();
    assert!(err.cause.starts_with("timed out"), "cause={}", err.cause);
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_connection_refused_is_fetch_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetcher = HttpFetcher::new(Duration::from_secs(2), "test").unwrap();
    let err = fetcher.fetch(&format!("http://{}/", addr)).await.unwrap_err();
    assert!(err.to_string().starts_with("fetch http://"));
}
