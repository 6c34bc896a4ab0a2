//! Tests for the HTTP client module

use super::*;
use crate::error::Error;
use crate::types::BackoffType;
use std::time::{Duration, Instant};
use test_case::test_case;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .no_rate_limit()
        .build();
    HttpClient::with_config(config).unwrap()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.max_retries, 0);
    assert!(config.base_url.is_none());
    assert_eq!(
        config.rate_limit,
        Some(RateLimiterConfig::fixed_delay(Duration::from_millis(500)))
    );
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://sellingpartnerapi-eu.amazon.com")
        .timeout(Duration::from_secs(60))
        .max_retries(2)
        .request_delay(Duration::from_millis(250))
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(
        config.base_url.as_deref(),
        Some("https://sellingpartnerapi-eu.amazon.com")
    );
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.max_retries, 2);
    assert_eq!(
        config.rate_limit,
        Some(RateLimiterConfig::fixed_delay(Duration::from_millis(250)))
    );
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");

    let config = HttpClientConfig::builder()
        .request_delay(Duration::ZERO)
        .build();
    assert!(config.rate_limit.is_none());
}

#[test]
fn test_request_config_keeps_param_order() {
    let config = RequestConfig::new()
        .query("keywords", "usb,cable")
        .query("pageSize", "20")
        .header("X-Request-Id", "abc123");

    assert_eq!(config.query_value("keywords"), Some("usb,cable"));
    assert_eq!(config.query[1], ("pageSize".to_string(), "20".to_string()));
    assert_eq!(config.query_value("missing"), None);
    assert_eq!(config.headers.get("X-Request-Id").map(String::as_str), Some("abc123"));
}

#[tokio::test]
async fn test_http_client_get_json_with_query_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog/items"))
        .and(query_param("pageToken", "t1"))
        .and(header("X-Custom", "yes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "numberOfResults": 25
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let body: serde_json::Value = client
        .get_json_with_config(
            "/catalog/items",
            RequestConfig::new()
                .query("pageToken", "t1")
                .header("X-Custom", "yes"),
        )
        .await
        .unwrap();

    assert_eq!(body["numberOfResults"], 25);
}

#[tokio::test]
async fn test_http_client_post_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/query/v1/suiteql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": []
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = client
        .post_with_config(
            "/query/v1/suiteql",
            RequestConfig::new().json(serde_json::json!({"q": "SELECT id FROM file"})),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_client_malformed_json_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .get_json_with_config::<serde_json::Value>("/broken", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn test_http_client_404_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .get_with_config("/api/missing", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_http_client_no_retry_by_default() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .get_with_config("/api/flaky", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_http_client_retry_on_500_when_enabled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .max_retries(3)
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
        .no_rate_limit()
        .build();

    let client = HttpClient::with_config(config).unwrap();
    let response = client
        .get_with_config("/api/flaky", RequestConfig::new())
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_client_429_without_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .get_with_config("/api/limited", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::RateLimited {
            retry_after_seconds: 7
        }
    ));
}

#[tokio::test]
async fn test_http_client_paces_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .request_delay(Duration::from_millis(40))
        .build();

    let client = HttpClient::with_config(config).unwrap();
    assert!(client.has_rate_limiter());

    let start = Instant::now();
    for _ in 0..3 {
        let response = client
            .get_with_config("/api/data", RequestConfig::new())
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    assert!(start.elapsed() >= Duration::from_millis(70));
}

#[test_case(BackoffType::Constant, 0, 100)]
#[test_case(BackoffType::Constant, 5, 100)]
#[test_case(BackoffType::Linear, 0, 100)]
#[test_case(BackoffType::Linear, 2, 300)]
#[test_case(BackoffType::Exponential, 1, 200)]
#[test_case(BackoffType::Exponential, 3, 800)]
#[test_case(BackoffType::Exponential, 10, 1000 ; "exponential capped at max")]
fn test_calculate_backoff(backoff: BackoffType, attempt: u32, expected_ms: u64) {
    let config = HttpClientConfig::builder()
        .backoff(
            backoff,
            Duration::from_millis(100),
            Duration::from_millis(1000),
        )
        .no_rate_limit()
        .build();

    let client = HttpClient::with_config(config).unwrap();
    assert_eq!(
        client.calculate_backoff(attempt),
        Duration::from_millis(expected_ms)
    );
}

#[test]
fn test_http_client_debug() {
    let client = HttpClient::with_config(HttpClientConfig::default()).unwrap();
    let debug_str = format!("{client:?}");
    assert!(debug_str.contains("HttpClient"));
    assert!(debug_str.contains("has_rate_limiter: true"));
}
