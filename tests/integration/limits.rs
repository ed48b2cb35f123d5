//! Body size ceiling, transport failures and read deadline

use std::time::Duration;

use bytes::Bytes;
use futures_util::stream;
use http::StatusCode;
use tokio_util::io::ReaderStream;

use crate::helpers::*;
use request_params::core::{Context, Error};
use request_params::params::aggregate;

const FORM: &str = "application/x-www-form-urlencoded";

/// A declared Content-Length over the ceiling fails before reading.
#[tokio::test]
async fn test_declared_length_exceeds_limit() {
    let config = TestConfig::new().with_params(|p| p.with_max_body_size(16));
    let mut req = request(
        "/form",
        &[("content-type", FORM), ("content-length", "1024")],
        "a=1",
    );

    let err = aggregate(&mut req, &config.params)
        .await
        .expect_err("Expected size error");

    assert!(matches!(err, Error::SizeExceeded { limit: 16 }));
    assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(req.has_body());
}

/// An undeclared oversized body fails while streaming.
#[tokio::test]
async fn test_streamed_body_exceeds_limit() {
    let config = TestConfig::new().with_params(|p| p.with_max_body_size(16));
    let mut req = streaming_request(
        "/form",
        &[("content-type", FORM)],
        chunked("a=0123456789&b=0123456789", 4),
    );

    let err = aggregate(&mut req, &config.params)
        .await
        .expect_err("Expected size error");

    assert!(matches!(err, Error::SizeExceeded { limit: 16 }));
}

/// The ceiling applies to multipart bodies and leaves no spool files.
#[tokio::test]
async fn test_multipart_exceeds_limit() {
    let config = TestConfig::new().with_params(|p| {
        p.with_max_body_size(200).with_memory_threshold(0)
    });
    let content_type = format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY);
    let mut req = streaming_request(
        "/upload",
        &[("content-type", content_type.as_str())],
        chunked(MULTIPART_FORM_DATA, 32),
    );

    let err = aggregate(&mut req, &config.params)
        .await
        .expect_err("Expected size error");

    assert!(matches!(err, Error::SizeExceeded { limit: 200 }));
    assert_eq!(config.spooled_count(), 0);
}

/// A body exactly at the ceiling is accepted.
#[tokio::test]
async fn test_body_at_limit() {
    let body = "a=1&b=2";
    let config = TestConfig::new().with_params(|p| p.with_max_body_size(body.len() as u64));
    let mut req = request("/form", &[("content-type", FORM)], body);

    let params = aggregate(&mut req, &config.params)
        .await
        .expect("Aggregation failed")
        .into_inner();

    assert_values(params.values(), "b", &["2"]);
}

/// A failed body read surfaces as a transport error.
#[tokio::test]
async fn test_transport_error() {
    let reader = tokio_test::io::Builder::new()
        .read(b"a=1&b=")
        .read_error(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset",
        ))
        .build();

    let config = TestConfig::new();
    let mut req = streaming_request("/form", &[("content-type", FORM)], ReaderStream::new(reader));

    let err = aggregate(&mut req, &config.params)
        .await
        .expect_err("Expected transport error");

    assert!(err.is_transport());
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    match err {
        Error::Transport(e) => assert_eq!(e.kind(), std::io::ErrorKind::ConnectionReset),
        other => panic!("Unexpected error: {}", other),
    }
}

/// A transport failure mid-multipart is fatal, not a degradation.
#[tokio::test]
async fn test_multipart_transport_error() {
    let head = &MULTIPART_FORM_DATA.as_bytes()[..60];
    let body = stream::iter(vec![
        Ok(Bytes::copy_from_slice(head)),
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe")),
    ]);

    let config = TestConfig::new();
    let content_type = format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY);
    let mut req = streaming_request("/upload", &[("content-type", content_type.as_str())], body);

    let err = aggregate(&mut req, &config.params)
        .await
        .expect_err("Expected transport error");

    assert!(matches!(err, Error::Transport(_)));
}

/// A stalled body trips the read deadline.
#[tokio::test]
async fn test_read_timeout() {
    let config = TestConfig::new()
        .with_params(|p| p.with_read_timeout(Some(Duration::from_millis(50))));
    let mut req = streaming_request(
        "/form",
        &[("content-type", FORM)],
        stream::pending::<std::io::Result<Bytes>>(),
    );

    let err = aggregate(&mut req, &config.params)
        .await
        .expect_err("Expected timeout");

    assert!(matches!(err, Error::Timeout { duration_ms: 50 }));
    assert_eq!(err.status_code(), StatusCode::REQUEST_TIMEOUT);
    assert!(err.is_transport());
}

/// A failed populate leaves the context untouched.
#[tokio::test]
async fn test_populate_error_keeps_context() {
    let config = TestConfig::new().with_params(|p| p.with_max_body_size(4));
    let mut req = request(
        "/form?a=1",
        &[("content-type", FORM), ("accept-language", "de")],
        "b=123456",
    );

    let mut ctx = Context::with_request_id("req-limits");
    let err = ctx
        .populate(&mut req, &config.params)
        .await
        .expect_err("Expected size error");

    assert!(matches!(err, Error::SizeExceeded { .. }));
    assert!(ctx.params().values().is_empty());
    assert!(ctx.languages().is_empty());
}
