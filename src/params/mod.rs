//! Request parameter aggregation.
//!
//! Merges the URL query string with a URL-encoded or multipart body into one
//! [`ParameterSet`]:
//!
//! - [`Values`] - ordered multi-value mapping of scalar fields
//! - [`Files`] - ordered mapping of uploaded files
//!
//! Field names are opaque: `name[]` and `name[0]` are stored verbatim.
//!
//! # Example
//!
//! ```rust,ignore
//! use request_params::params::aggregate;
//!
//! let parsed = aggregate(&mut request, &config.params).await?;
//! for d in &parsed.degraded {
//!     tracing::debug!(%d, "skipped");
//! }
//! let params = parsed.into_inner();
//! let name = params.values().get("name");
//! ```

mod framing;
mod limit;
mod multipart;
mod parser;
mod report;
mod upload;

use std::time::Duration;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::ParamsConfig;
use crate::core::{Error, Request, Result};

pub use limit::{read_to_bytes, BodyError, LimitedBody};
pub use multipart::{parse_boundary, parse_multipart};
pub use parser::{parse_query_string, parse_urlencoded, ParamList};
pub use report::{Degradation, FragmentSource, Parsed};
pub use upload::{UploadedFile, DEFAULT_CONTENT_TYPE};

/// Ordered multi-value mapping.
///
/// Keys keep first-seen order, values keep append order. Backed by a Vec of
/// pairs, which beats a HashMap for the handful of fields a request carries.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiMap<V> {
    entries: Vec<(String, Vec<V>)>,
}

impl<V> MultiMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a value under `key`, keeping any earlier values.
    pub fn append(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if let Some(entry) = self.entries.iter_mut().find(|(name, _)| *name == key) {
            entry.1.push(value);
        } else {
            self.entries.push((key, vec![value]));
        }
    }

    /// All values for `key`, or None when the key never appeared.
    pub fn get_all(&self, key: &str) -> Option<&[V]> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, values)| values.as_slice())
    }

    /// First value for `key`.
    pub fn first(&self, key: &str) -> Option<&V> {
        self.get_all(key).and_then(|values| values.first())
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of distinct keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MultiMap<String> {
    /// First value for `key` as a string slice.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.first(key).map(String::as_str)
    }

    /// Append every pair of a parsed list.
    pub fn extend_pairs(&mut self, pairs: ParamList) {
        for (key, value) in pairs {
            self.append(key, value);
        }
    }
}

impl<V> Default for MultiMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for MultiMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.append(key, value);
        }
        map
    }
}

impl<V: Serialize> Serialize for MultiMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, values) in &self.entries {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

/// Scalar field values.
pub type Values = MultiMap<String>;

/// Uploaded files by field name.
pub type Files = MultiMap<UploadedFile>;

/// Aggregated request parameters.
///
/// A name may appear in both `values` and `files` when a request mixes a
/// scalar part and a file part under the same name.
#[derive(Debug, Default, Serialize)]
pub struct ParameterSet {
    pub(crate) values: Values,
    pub(crate) files: Files,
}

impl ParameterSet {
    pub fn from_values(values: Values) -> Self {
        Self {
            values,
            files: Files::new(),
        }
    }

    #[inline]
    pub fn values(&self) -> &Values {
        &self.values
    }

    #[inline]
    pub fn files(&self) -> &Files {
        &self.files
    }
}

/// How the body should be decoded, by media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    UrlEncoded,
    Multipart,
    Other,
}

impl BodyKind {
    fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return BodyKind::Other;
        };
        let essence = content_type.split(';').next().unwrap_or("").trim();

        if essence.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            BodyKind::UrlEncoded
        } else if essence.eq_ignore_ascii_case("multipart/form-data") {
            BodyKind::Multipart
        } else {
            BodyKind::Other
        }
    }
}

/// Aggregate the query string and form body of `req`.
///
/// Malformed fragments are skipped or kept literally and reported in
/// [`Parsed::degraded`]. Only an oversized body, a failed or timed-out body
/// read, or a failed spool write return an error. The body is consumed for
/// form content types and left alone otherwise.
pub async fn aggregate(req: &mut Request, config: &ParamsConfig) -> Result<Parsed<ParameterSet>> {
    let mut out = Parsed::new(ParameterSet::default());

    if let Some(query) = req.query() {
        let pairs = parse_query_string(query);
        out.degraded.extend(pairs.degraded);
        out.value.values.extend_pairs(pairs.value);
    }

    let content_type = req.content_type().map(str::to_owned);
    let kind = BodyKind::from_content_type(content_type.as_deref());
    if kind == BodyKind::Other {
        return Ok(out);
    }

    if let Some(declared) = req.content_length() {
        if declared > config.max_body_size {
            tracing::debug!(
                declared,
                limit = config.max_body_size,
                "declared content-length exceeds limit"
            );
            return Err(Error::SizeExceeded {
                limit: config.max_body_size,
            });
        }
    }

    let body = LimitedBody::new(req.take_body(), config.max_body_size);
    let content_type = content_type.unwrap_or_default();

    let read_body = async {
        match kind {
            BodyKind::UrlEncoded => {
                let bytes = read_to_bytes(body).await?;
                let text = match std::str::from_utf8(&bytes) {
                    Ok(text) => std::borrow::Cow::Borrowed(text),
                    Err(_) => {
                        out.degrade(Degradation::new(
                            FragmentSource::Body,
                            "request body",
                            "body is not valid UTF-8",
                        ));
                        String::from_utf8_lossy(&bytes)
                    }
                };
                let pairs = parse_urlencoded(&text, FragmentSource::Body);
                out.degraded.extend(pairs.degraded);
                out.value.values.extend_pairs(pairs.value);
                Ok::<(), Error>(())
            }
            BodyKind::Multipart => parse_multipart(&content_type, body, config, &mut out).await,
            BodyKind::Other => Ok(()),
        }
    };

    match config.read_timeout {
        Some(deadline) => with_deadline(deadline, read_body).await?,
        None => read_body.await?,
    }

    tracing::debug!(
        values = out.value.values.len(),
        files = out.value.files.len(),
        degraded = out.degraded.len(),
        "aggregate: completed"
    );

    Ok(out)
}

async fn with_deadline<F>(deadline: Duration, fut: F) -> Result<()>
where
    F: std::future::Future<Output = Result<()>>,
{
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| Error::Timeout {
            duration_ms: deadline.as_millis() as u64,
        })?
}
