//! Integration tests for DcFetcher using wiremock
//!
//! These validate the retry schedule, status classification, and body
//! decoding against a mock server.

use std::time::{Duration, Instant};

use pado::config::Config;
use pado::crawler::fetcher::DcFetcher;
use pado::error::FetchError;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(server: &MockServer) -> DcFetcher {
    let mut config = Config::default();
    config.crawler.rate_limit = 100;
    DcFetcher::new(&config).unwrap().with_base_url(&server.uri())
}

#[tokio::test]
async fn test_fetch_success() {
    let server = MockServer::start().await;
    let html = "<html><body><h1>테스트 게시판</h1></body></html>";

    Mock::given(method("GET"))
        .and(path("/board/lists/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(&server)
        .await;

    let body = fetcher(&server).get("/board/lists/?id=pro").await.unwrap();
    assert!(body.contains("테스트 게시판"));
}

/// 500 twice then 200: the call succeeds after backoff sleeps of 2 s and 4 s
#[tokio::test]
async fn test_server_error_retry_schedule() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let started = Instant::now();
    let body = fetcher(&server).get("/flaky").await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(body, "OK");
    assert!(elapsed >= Duration::from_secs(6), "expected 2s + 4s of backoff, got {elapsed:?}");
    assert!(elapsed < Duration::from_secs(13), "third retry delay should not have fired");
}

/// 429 twice then 200: rate limiting backs off like any other transient error
#[tokio::test]
async fn test_rate_limit_backoff() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let started = Instant::now();
    let body = fetcher(&server).get("/limited").await.unwrap();

    assert_eq!(body, "OK");
    assert!(started.elapsed() >= Duration::from_secs(6));
}

/// Exhausted retries: exactly 4 requests (1 + 3 retries), then the last
/// error propagates
#[tokio::test]
async fn test_retry_exhaustion_request_count() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(429))
        .expect(4)
        .mount(&server)
        .await;

    let result = fetcher(&server).get("/down").await;
    assert!(matches!(result, Err(FetchError::RateLimited)));
    server.verify().await;
}

/// 404 is classified as NotFound and never retried
#[tokio::test]
async fn test_not_found_no_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let started = Instant::now();
    let result = fetcher(&server).get("/gone").await;

    assert!(matches!(result, Err(FetchError::NotFound)));
    assert!(started.elapsed() < Duration::from_secs(1));
    server.verify().await;
}

/// Comment API posts carry the XHR profile and a form-encoded body
#[tokio::test]
async fn test_post_form_headers_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/board/comment/"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .and(body_string_contains("comment_page=1"))
        .and(body_string_contains("sort=N"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"comments": []}"#))
        .expect(1)
        .mount(&server)
        .await;

    let form = [
        ("id", "pro".to_string()),
        ("comment_page", "1".to_string()),
        ("sort", "N".to_string()),
    ];
    let body = fetcher(&server)
        .post_form("/board/comment/", &form)
        .await
        .unwrap();
    assert!(body.contains("comments"));
    server.verify().await;
}

/// EUC-KR bodies decode through the charset fallback
#[tokio::test]
async fn test_euc_kr_response_decoding() {
    let server = MockServer::start().await;
    // "안녕하세요" in EUC-KR
    let euc_kr: &[u8] = &[0xbe, 0xc8, 0xb3, 0xe7, 0xc7, 0xcf, 0xbc, 0xbc, 0xbf, 0xe4];

    Mock::given(method("GET"))
        .and(path("/legacy"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(euc_kr)
                .insert_header("content-type", "text/html; charset=euc-kr"),
        )
        .mount(&server)
        .await;

    let body = fetcher(&server).get("/legacy").await.unwrap();
    assert_eq!(body, "안녕하세요");
}

/// Cancellation aborts a pending request promptly
#[tokio::test]
async fn test_cancellation_aborts_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let cancel = tokio_util::sync::CancellationToken::new();
    let fetcher = fetcher(&server).with_cancellation(cancel.clone());

    let handle = tokio::spawn(async move { fetcher.get("/slow").await });
    tokio::time::sleep(Duration::from_millis(200)).await;
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("cancellation should end the request quickly")
        .unwrap();
    assert!(matches!(result, Err(FetchError::Cancelled)));
}
