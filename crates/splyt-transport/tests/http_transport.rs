//! Integration tests for the HTTP transport against a mock collector.

use httpmock::prelude::*;
use splyt_transport::{HttpTransport, Transport, TransportError};
use std::time::Duration;
use url::Url;

fn collector_url(server: &MockServer) -> Url {
    Url::parse(&server.url("/datacollector_batch?ssf_output=json")).unwrap()
}

#[tokio::test]
async fn test_posts_payload_with_collector_headers() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/datacollector_batch")
                .query_param("ssf_output", "json")
                .header("ssf-use-positional-post-params", "true")
                .header("ssf-contents-not-url-encoded", "true")
                .body(r#"[1.5,[{"method":"m","args":[]}]]"#);
            then.status(200).body(r#"{"error":0,"data":{}}"#);
        })
        .await;

    let transport = HttpTransport::new().unwrap();
    let body = transport
        .send(
            &collector_url(&server),
            Duration::from_secs(5),
            r#"[1.5,[{"method":"m","args":[]}]]"#.to_string(),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(body, r#"{"error":0,"data":{}}"#);
}

#[tokio::test]
async fn test_non_ok_status_is_generic_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/datacollector_batch");
            then.status(503).body("unavailable");
        })
        .await;

    let transport = HttpTransport::new().unwrap();
    let result = transport
        .send(&collector_url(&server), Duration::from_secs(5), "[]".to_string())
        .await;

    assert!(matches!(result, Err(TransportError::Generic(_))));
}

#[tokio::test]
async fn test_slow_response_is_timeout() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/datacollector_batch");
            then.status(200).delay(Duration::from_millis(1500)).body("{}");
        })
        .await;

    let transport = HttpTransport::new().unwrap();
    let result = transport
        .send(&collector_url(&server), Duration::from_millis(100), "[]".to_string())
        .await;

    assert_eq!(result, Err(TransportError::Timeout));
}

#[tokio::test]
async fn test_spawn_send_resolves_without_blocking_caller() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/datacollector_batch");
            then.status(200).body("registered");
        })
        .await;

    let transport = HttpTransport::new().unwrap();
    let handle = transport.spawn_send(
        collector_url(&server),
        Duration::from_secs(5),
        "[]".to_string(),
    );

    let body = handle.await.unwrap().unwrap();
    assert_eq!(body, "registered");
    mock.assert_async().await;
}
