//! Resolve the parameters of a CGI-style request and print them as JSON.
//!
//! The request comes from the standard CGI environment (`REQUEST_METHOD`,
//! `QUERY_STRING`, `CONTENT_TYPE`, `CONTENT_LENGTH`, `HTTP_ACCEPT_LANGUAGE`)
//! and the body from stdin:
//!
//! ```text
//! CONTENT_TYPE='application/x-www-form-urlencoded' QUERY_STRING='a=1' \
//!     request_params <<< 'b=2&b=3'
//! ```

use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use request_params::config::Config;
use request_params::core::{Context, Request};

/// CGI variables copied into request headers.
const HEADER_VARS: &[(&str, &str)] = &[
    ("CONTENT_TYPE", "content-type"),
    ("CONTENT_LENGTH", "content-length"),
    ("HTTP_ACCEPT_LANGUAGE", "accept-language"),
];

fn cgi_request() -> Result<Request, Box<dyn std::error::Error + Send + Sync>> {
    let method: Method = std::env::var("REQUEST_METHOD")
        .unwrap_or_else(|_| "POST".to_string())
        .parse()?;

    let uri: Uri = match std::env::var("QUERY_STRING") {
        Ok(query) if !query.is_empty() => format!("/?{}", query).parse()?,
        _ => Uri::from_static("/"),
    };

    let mut headers = HeaderMap::new();
    for (var, header) in HEADER_VARS {
        if let Ok(value) = std::env::var(*var) {
            headers.insert(HeaderName::from_static(*header), HeaderValue::from_str(&value)?);
        }
    }

    let body = ReaderStream::new(tokio::io::stdin());
    Ok(Request::streaming(method, uri, headers, body))
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::from_env()?;
    request_params::logging::init(&config.logging)?;
    config.log_summary();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

async fn async_main(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut req = cgi_request()?;
    let mut ctx = Context::new();

    if let Err(e) = ctx.populate(&mut req, &config.params).await {
        warn!(status = e.status_code().as_u16(), error = %e, "failed to resolve parameters");
        return Err(e.into());
    }

    for d in ctx.degraded() {
        info!(source = %d.source, fragment = %d.fragment, reason = %d.reason, "degraded fragment");
    }

    let output = serde_json::json!({
        "request_id": ctx.request_id,
        "params": ctx.params(),
        "languages": ctx.languages(),
        "degraded": ctx.degraded().iter().map(|d| d.to_string()).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
