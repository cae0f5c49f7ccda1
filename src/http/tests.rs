//! Tests for the HTTP executor module

use super::*;
use crate::auth::Credentials;
use crate::cancel::CancelToken;
use crate::error::Error;
use crate::pagination::{Cursor, PageLayout};
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig::new()
        .with_max_attempts(max_attempts)
        .with_base_delay(Duration::from_millis(10))
        .with_max_delay(Duration::from_millis(50))
        .with_jitter(false)
}

fn executor(server: &MockServer) -> RequestExecutor {
    let config = ExecutorConfig::builder()
        .base_url(server.uri())
        .retry(fast_retry(3))
        .build();
    RequestExecutor::new(config).unwrap()
}

#[test]
fn test_executor_config_default() {
    let config = ExecutorConfig::default();
    assert_eq!(config.base_url, "https://api.github.com");
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.retry.max_attempts, 4);
    assert_eq!(config.credentials, Credentials::Anonymous);
    assert!(config.request_interval.is_none());
    assert!(config.user_agent.starts_with("github-collector/"));
}

#[test]
fn test_executor_config_builder() {
    let config = ExecutorConfig::builder()
        .base_url("https://github.example.com/api/v3")
        .credentials(Credentials::from_token(Some("ghp_1")))
        .timeout(Duration::from_secs(5))
        .retry(fast_retry(5))
        .request_interval(Duration::from_millis(500))
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.base_url, "https://github.example.com/api/v3");
    assert!(config.credentials.is_authenticated());
    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.request_interval, Some(Duration::from_millis(500)));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_invalid_base_url() {
    let config = ExecutorConfig::builder().base_url("not a url").build();
    assert!(matches!(
        RequestExecutor::new(config),
        Err(Error::InvalidUrl(_))
    ));
}

#[tokio::test]
async fn test_execute_array_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/octocat/repos"))
        .and(query_param("per_page", "2"))
        .and(header("Accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "hello-world"},
            {"id": 2, "name": "spoon-knife"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let exec = executor(&mock_server);
    let spec = RequestSpec::get("/users/octocat/repos").query("per_page", 2);
    let page = exec.execute(&spec, &CancelToken::new()).await.unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[1]["name"], "spoon-knife");
    assert!(page.is_last());
}

#[tokio::test]
async fn test_execute_object_body_is_single_record() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"login": "octocat", "id": 583231})),
        )
        .mount(&mock_server)
        .await;

    let page = executor(&mock_server)
        .execute(&RequestSpec::get("/users/octocat"), &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(page.items, vec![json!({"login": "octocat", "id": 583231})]);
}

#[tokio::test]
async fn test_execute_link_header_cursor() {
    let mock_server = MockServer::start().await;
    let next = format!("{}/users/octocat/repos?page=2", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/users/octocat/repos"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", format!("<{next}>; rel=\"next\"").as_str())
                .set_body_json(json!([{"id": 1}])),
        )
        .mount(&mock_server)
        .await;

    let page = executor(&mock_server)
        .execute(&RequestSpec::get("/users/octocat/repos"), &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(page.next_cursor, Some(Cursor::Url(next)));
}

#[tokio::test]
async fn test_execute_embedded_cursor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/issues"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": 1}, {"id": 2}],
            "meta": {"next": "abc"}
        })))
        .mount(&mock_server)
        .await;

    let spec = RequestSpec::get("/search/issues")
        .layout(PageLayout::default().items_at("items").cursor_at("meta.next", "after"));
    let page = executor(&mock_server)
        .execute(&spec, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.next_cursor, Some(Cursor::Token("abc".to_string())));
}

#[tokio::test]
async fn test_link_header_wins_over_embedded_cursor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/issues"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", "<https://api.github.com/search/issues?page=2>; rel=\"next\"")
                .set_body_json(json!({"items": [], "next": "token"})),
        )
        .mount(&mock_server)
        .await;

    let spec = RequestSpec::get("/search/issues")
        .layout(PageLayout::default().items_at("items").cursor_at("next", "after"));
    let page = executor(&mock_server)
        .execute(&spec, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(
        page.next_cursor,
        Some(Cursor::Url(
            "https://api.github.com/search/issues?page=2".to_string()
        ))
    );
}

#[tokio::test]
async fn test_execute_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("Authorization", "Bearer ghp_test"))
        .and(header("X-GitHub-Api-Version", API_VERSION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "me"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ExecutorConfig::builder()
        .base_url(mock_server.uri())
        .credentials(Credentials::from_token(Some("ghp_test")))
        .build();
    let exec = RequestExecutor::new(config).unwrap();

    let page = exec
        .execute(&RequestSpec::get("/user"), &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(page.items[0]["login"], "me");
}

#[tokio::test]
async fn test_execute_request_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/o/r/issues"))
        .and(header("X-Request-Id", "req-456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let spec = RequestSpec::get("/repos/o/r/issues").header("X-Request-Id", "req-456");
    let page = executor(&mock_server)
        .execute(&spec, &CancelToken::new())
        .await
        .unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn test_404_is_fatal_and_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"message\":\"Not Found\"}"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = executor(&mock_server)
        .execute(&RequestSpec::get("/users/ghost"), &CancelToken::new())
        .await;

    match result {
        Err(Error::HttpStatus {
            status,
            method,
            path,
            body,
        }) => {
            assert_eq!(status, 404);
            assert_eq!(method, "GET");
            assert_eq!(path, "/users/ghost");
            assert!(body.contains("Not Found"));
        }
        other => panic!("Expected HttpStatus 404, got {other:?}"),
    }
}

#[tokio::test]
async fn test_401_is_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = executor(&mock_server)
        .execute(&RequestSpec::get("/user"), &CancelToken::new())
        .await;
    assert!(matches!(result, Err(Error::Auth { status: 401, .. })));
}

#[tokio::test]
async fn test_403_without_rate_limit_is_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/o/private"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "4999")
                .insert_header("x-ratelimit-reset", "1")
                .set_body_string("Resource not accessible"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = executor(&mock_server)
        .execute(&RequestSpec::get("/repos/o/private"), &CancelToken::new())
        .await;
    assert!(matches!(result, Err(Error::Auth { status: 403, .. })));
}

#[tokio::test]
async fn test_retry_on_500() {
    let mock_server = MockServer::start().await;

    // First call fails, second succeeds
    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"ok": true}])))
        .mount(&mock_server)
        .await;

    let exec = executor(&mock_server);
    let page = exec
        .execute(&RequestSpec::get("/api/flaky"), &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    let stats = exec.stats();
    assert_eq!(stats.requests, 2);
    assert_eq!(stats.retries, 1);
}

#[tokio::test]
async fn test_5xx_exhausted_returns_http_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/always-fail"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service unavailable"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let result = executor(&mock_server)
        .execute(&RequestSpec::get("/api/always-fail"), &CancelToken::new())
        .await;

    assert!(matches!(result, Err(Error::HttpStatus { status: 503, .. })));
}

#[tokio::test]
async fn test_429_exhausted_returns_rate_limit_exceeded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let result = executor(&mock_server)
        .execute(&RequestSpec::get("/api/limited"), &CancelToken::new())
        .await;

    assert!(matches!(
        result,
        Err(Error::RateLimitExceeded { reset_at: None, .. })
    ));
}

#[tokio::test]
async fn test_429_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    // Retry-After is capped by max_delay (50ms)
    let start = Instant::now();
    let result = executor(&mock_server)
        .execute(&RequestSpec::get("/api/limited"), &CancelToken::new())
        .await;

    assert!(result.is_ok());
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_rate_limited_403_reports_reset() {
    let mock_server = MockServer::start().await;

    // Reset time in the past so the governor does not stall the retries
    Mock::given(method("GET"))
        .and(path("/api/quota"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("x-ratelimit-reset", "1600000000")
                .set_body_string("API rate limit exceeded"),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = ExecutorConfig::builder()
        .base_url(mock_server.uri())
        .retry(fast_retry(2))
        .build();
    let result = RequestExecutor::new(config)
        .unwrap()
        .execute(&RequestSpec::get("/api/quota"), &CancelToken::new())
        .await;

    match result {
        Err(Error::RateLimitExceeded { reset_at, .. }) => {
            assert_eq!(reset_at.unwrap().timestamp(), 1_600_000_000);
        }
        other => panic!("Expected RateLimitExceeded, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transport_error_is_network_error() {
    // Nothing listens on port 1
    let config = ExecutorConfig::builder()
        .base_url("http://127.0.0.1:1")
        .retry(fast_retry(2))
        .build();
    let exec = RequestExecutor::new(config).unwrap();

    let result = exec
        .execute(&RequestSpec::get("/users/octocat"), &CancelToken::new())
        .await;

    assert!(matches!(result, Err(Error::Network { .. })));
    assert_eq!(exec.stats().requests, 2);
    assert_eq!(exec.stats().retries, 1);
}

#[tokio::test]
async fn test_classify_send_outcomes() {
    let mock_server = MockServer::start().await;
    for (status, route) in [(200, "/ok"), (503, "/unavailable"), (404, "/missing")] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock_server)
            .await;
    }

    let policy = RetryPolicy::default();
    let client = reqwest::Client::new();
    let send = |route: &str| client.get(format!("{}{route}", mock_server.uri())).send();

    assert_eq!(policy.classify(&send("/ok").await), Classification::Success);
    assert_eq!(
        policy.classify(&send("/unavailable").await),
        Classification::RetryableFailure
    );
    assert_eq!(
        policy.classify(&send("/missing").await),
        Classification::FatalFailure
    );

    let refused = client.get("http://127.0.0.1:1/").send().await;
    assert_eq!(policy.classify(&refused), Classification::RetryableFailure);

    let unbuildable = client.get("not a url").send().await;
    assert_eq!(policy.classify(&unbuildable), Classification::FatalFailure);
}

#[tokio::test]
async fn test_governor_observes_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-ratelimit-limit", "60")
                .insert_header("x-ratelimit-remaining", "41")
                .insert_header("x-ratelimit-reset", "4102444800")
                .set_body_json(json!({"login": "octocat"})),
        )
        .mount(&mock_server)
        .await;

    let exec = executor(&mock_server);
    exec.execute(&RequestSpec::get("/users/octocat"), &CancelToken::new())
        .await
        .unwrap();

    let state = exec.governor().state().await.unwrap();
    assert_eq!(state.limit, 60);
    assert_eq!(state.remaining, 41);
    assert_eq!(state.reset_at.timestamp(), 4_102_444_800);
}

#[tokio::test]
async fn test_cancel_in_flight_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(10))
                .set_body_json(json!([])),
        )
        .mount(&mock_server)
        .await;

    let exec = executor(&mock_server);
    let cancel = CancelToken::new();
    cancel.cancel_after(Duration::from_millis(50));

    let start = Instant::now();
    let result = exec.execute(&RequestSpec::get("/api/slow"), &cancel).await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_invalid_json_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = executor(&mock_server)
        .execute(&RequestSpec::get("/api/broken"), &CancelToken::new())
        .await;
    assert!(matches!(result, Err(Error::Decode { .. })));
}

#[tokio::test]
async fn test_request_pacing_spaces_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = ExecutorConfig::builder()
        .base_url(mock_server.uri())
        .request_interval(Duration::from_millis(100))
        .build();
    let exec = RequestExecutor::new(config).unwrap();
    assert!(exec.governor().has_pacer());

    let start = Instant::now();
    for _ in 0..3 {
        exec.execute(&RequestSpec::get("/api/data"), &CancelToken::new())
            .await
            .unwrap();
    }
    assert!(start.elapsed() >= Duration::from_millis(190));
}

#[tokio::test]
async fn test_full_url_path() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/test"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let exec = executor(&mock_server);

    let url = format!("{}/api/test?page=2", mock_server.uri());
    exec.execute(&RequestSpec::get(url), &CancelToken::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_foreign_origin_is_rejected() {
    let api = MockServer::start().await;
    let elsewhere = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"leak": true}])))
        .expect(0)
        .mount(&elsewhere)
        .await;

    let config = ExecutorConfig::builder()
        .base_url(api.uri())
        .credentials(Credentials::from_token(Some("ghp_secret")))
        .build();
    let exec = RequestExecutor::new(config).unwrap();

    let url = format!("{}/api/test?page=2", elsewhere.uri());
    let err = exec
        .execute(&RequestSpec::get(url), &CancelToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
    assert_eq!(exec.stats().requests, 0);
}

#[test]
fn test_executor_debug() {
    let exec = RequestExecutor::new(ExecutorConfig::default()).unwrap();
    let debug_str = format!("{exec:?}");
    assert!(debug_str.contains("RequestExecutor"));
    assert!(debug_str.contains("config"));
}
