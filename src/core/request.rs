//! HTTP request abstraction handed in by the host.

use std::fmt;
use std::io;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::stream::{self, Stream, TryStreamExt};
use http::header::{self, HeaderName};
use http::{HeaderMap, Method, Uri};
use http_body_util::BodyExt;

/// Streaming request body.
pub type BodyStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Header name constants for fast lookup.
mod header_names {
    use super::*;

    pub static ACCEPT_LANGUAGE: HeaderName = header::ACCEPT_LANGUAGE;
    pub static CONTENT_TYPE: HeaderName = header::CONTENT_TYPE;
    pub static CONTENT_LENGTH: HeaderName = header::CONTENT_LENGTH;
}

/// HTTP request as seen by the parameter layer.
///
/// The body is a stream that can be taken exactly once; aggregation consumes
/// it, later readers see an empty body.
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Option<BodyStream>,
}

impl Request {
    /// Create a request with a fully buffered body.
    #[inline]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        let body: Option<BodyStream> = if body.is_empty() {
            None
        } else {
            Some(Box::pin(stream::once(async move { Ok(body) })))
        };

        Self {
            method,
            uri,
            headers,
            body,
        }
    }

    /// Create a request whose body is read lazily from `body`.
    pub fn streaming<S>(method: Method, uri: Uri, headers: HeaderMap, body: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            method,
            uri,
            headers,
            body: Some(Box::pin(body)),
        }
    }

    /// Convert any `http::Request` whose body implements [`hyper::body::Body`].
    pub fn from_http<B>(req: http::Request<B>) -> Self
    where
        B: hyper::body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();
        let body = body.into_data_stream().map_err(io::Error::other);
        Self::streaming(parts.method, parts.uri, parts.headers, body)
    }

    /// Get the query string.
    #[inline]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Get the headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }


    /// Take the body stream, leaving an empty body behind.
    pub fn take_body(&mut self) -> BodyStream {
        self.body
            .take()
            .unwrap_or_else(|| Box::pin(stream::empty()))
    }

    /// Whether the body has not been consumed yet.
    #[inline]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    #[inline]
    fn header_by_name(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get a header value by string name (case-insensitive).
    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get Content-Type header.
    #[inline]
    pub fn content_type(&self) -> Option<&str> {
        self.header_by_name(&header_names::CONTENT_TYPE)
    }

    /// Get Content-Length header.
    #[inline]
    pub fn content_length(&self) -> Option<u64> {
        self.header_by_name(&header_names::CONTENT_LENGTH)
            .and_then(|v| v.trim().parse().ok())
    }

    /// Get Accept-Language header.
    #[inline]
    pub fn accept_language(&self) -> Option<&str> {
        self.header_by_name(&header_names::ACCEPT_LANGUAGE)
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}
