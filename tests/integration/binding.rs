//! Typed binding of aggregated values

use crate::helpers::*;
use request_params::binder::{BindOutcome, ValueKind};
use request_params::core::Context;

/// Query and body values bind into typed destinations.
#[tokio::test]
async fn test_bind_from_request() {
    let config = TestConfig::new();
    let mut req = request(
        "/search?page=5&ratio=0.25&debug=on",
        &[("content-type", "application/x-www-form-urlencoded")],
        "q=rust+async&ids=1&ids=2&ids=x&ids=3",
    );

    let mut ctx = Context::new();
    ctx.populate(&mut req, &config.params)
        .await
        .expect("Populate failed");
    let params = ctx.params();

    let mut page: u32 = 1;
    let mut ratio: f64 = 0.0;
    let mut debug = false;
    let mut query = String::new();

    assert!(params.bind(&mut page, "page").is_bound());
    assert!(params.bind(&mut ratio, "ratio").is_bound());
    assert!(params.bind(&mut debug, "debug").is_bound());
    assert!(params.bind(&mut query, "q").is_bound());

    assert_eq!(page, 5);
    assert_eq!(ratio, 0.25);
    assert!(debug);
    assert_eq!(query, "rust async");

    let mut ids: Vec<i64> = Vec::new();
    let errors = params.bind_all(&mut ids, "ids");
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].value, "x");
    assert_eq!(errors[0].kind, ValueKind::Int);
}

/// Failed and absent binds leave the destination alone.
#[tokio::test]
async fn test_bind_failures_keep_destination() {
    let config = TestConfig::new();
    let mut req = request("/list?limit=-3&offset=&verbose=maybe", &[], "");

    let mut ctx = Context::new();
    ctx.populate(&mut req, &config.params)
        .await
        .expect("Populate failed");
    let params = ctx.params();

    let mut limit: u16 = 20;
    let outcome = params.bind(&mut limit, "limit");
    assert_eq!(limit, 20);
    let err = outcome.error().expect("Expected coercion error");
    assert_eq!(err.field, "limit");
    assert_eq!(err.kind, ValueKind::Uint);

    let mut offset: i32 = 7;
    assert!(matches!(params.bind(&mut offset, "offset"), BindOutcome::Failed(_)));
    assert_eq!(offset, 7);

    let mut verbose = true;
    assert!(matches!(params.bind(&mut verbose, "verbose"), BindOutcome::Failed(_)));
    assert!(verbose);

    let mut missing: u8 = 9;
    assert_eq!(params.bind(&mut missing, "missing"), BindOutcome::Absent);
    assert_eq!(missing, 9);
}

/// Multipart scalar parts bind like any other value.
#[tokio::test]
async fn test_bind_multipart_values() {
    let config = TestConfig::new();
    let mut req = multipart_request("/upload?count=300");

    let mut ctx = Context::new();
    ctx.populate(&mut req, &config.params)
        .await
        .expect("Populate failed");

    let mut text = String::new();
    assert!(ctx.params().bind(&mut text, "text2").is_bound());
    assert_eq!(text, "data2");

    let mut raw: Vec<u8> = Vec::new();
    assert!(ctx.params().bind(&mut raw, "text1").is_bound());
    assert_eq!(raw, b"data1");

    // 300 overflows u8
    let mut small: u8 = 0;
    assert!(ctx.params().bind(&mut small, "count").error().is_some());
    let mut wide: u16 = 0;
    assert!(ctx.params().bind(&mut wide, "count").is_bound());
    assert_eq!(wide, 300);

    // File parts are not values
    let mut name = String::from("unset");
    assert_eq!(ctx.params().bind(&mut name, "file1"), BindOutcome::Absent);
}
