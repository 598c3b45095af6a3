//! Tests for the HTTP client module

use super::*;
use crate::error::Error;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.connect_timeout, Duration::from_secs(30));
    assert_eq!(config.request_timeout, Duration::from_secs(60));
    assert!(config.base_url.is_none());
    assert!(config.user_agent.starts_with("bulk-pipeline/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com")
        .connect_timeout(Duration::from_secs(5))
        .request_timeout(Duration::from_secs(10))
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.base_url, Some("https://api.example.com".to_string()));
    assert_eq!(config.connect_timeout, Duration::from_secs(5));
    assert_eq!(config.request_timeout, Duration::from_secs(10));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_request_config_builder() {
    let config = RequestConfig::new()
        .header("X-Request-Id", "abc123")
        .range_from(1024)
        .timeout(Duration::from_secs(10));

    assert_eq!(
        config.headers.get("X-Request-Id"),
        Some(&"abc123".to_string())
    );
    assert_eq!(config.range_start, Some(1024));
    assert_eq!(config.timeout, Some(Duration::from_secs(10)));
}

#[test]
fn test_build_url() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com/")
        .build();
    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(
        client.full_url("/v1/bulk"),
        "https://api.example.com/v1/bulk"
    );
    assert_eq!(
        client.full_url("https://files.example.com/a.zip"),
        "https://files.example.com/a.zip"
    );
}

#[tokio::test]
async fn test_http_client_get_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": 42
        })))
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .build();
    let client = HttpClient::with_config(config).unwrap();
    let data: serde_json::Value = client.get_json("/api/data").await.unwrap();

    assert_eq!(data["value"], 42);
}

#[tokio::test]
async fn test_http_client_sends_range_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/file.bin"))
        .and(header("Range", "bytes=10-"))
        .respond_with(ResponseTemplate::new(206).set_body_bytes(b"tail".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let response = client
        .get_with_config(
            &format!("{}/file.bin", mock_server.uri()),
            RequestConfig::new().range_from(10),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 206);
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"tail");
}

#[tokio::test]
async fn test_http_client_default_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/protected"))
        .and(header("X-Api-Key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .header("X-Api-Key", "secret")
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let response = client.get("/protected").await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_client_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let result = client
        .get(&format!("{}/missing", mock_server.uri()))
        .await;

    match result {
        Err(Error::HttpStatus { status, body }) => {
            assert_eq!(status, 404);
            assert_eq!(body, "Not found");
        }
        other => panic!("Expected HttpStatus error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_http_client_server_error_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().unwrap();
    let err = client
        .get(&format!("{}/flaky", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(err.is_retryable());
}
