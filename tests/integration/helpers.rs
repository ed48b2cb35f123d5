//! Test helpers and utilities

use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, Stream};
use http::{HeaderMap, Method};
use request_params::config::ParamsConfig;
use request_params::core::Request;
use request_params::params::{Files, Values};
use tempfile::TempDir;

pub const MULTIPART_BOUNDARY: &str = "A";

/// Multipart form with repeated values, repeated file fields and indexed
/// file fields.
pub const MULTIPART_FORM_DATA: &str = "--A\r
Content-Disposition: form-data; name=\"text1\"\r
\r
data1\r
--A\r
Content-Disposition: form-data; name=\"text2\"\r
\r
data2\r
--A\r
Content-Disposition: form-data; name=\"text2\"\r
\r
data3\r
--A\r
Content-Disposition: form-data; name=\"file1\"; filename=\"test.txt\"\r
Content-Type: text/plain\r
\r
content1\r
--A\r
Content-Disposition: form-data; name=\"file2[]\"; filename=\"test.txt\"\r
Content-Type: text/plain\r
\r
content2\r
--A\r
Content-Disposition: form-data; name=\"file2[]\"; filename=\"favicon.ico\"\r
Content-Type: image/x-icon\r
\r
xyz\r
--A\r
Content-Disposition: form-data; name=\"file3[0]\"; filename=\"test.txt\"\r
Content-Type: text/plain\r
\r
content3\r
--A\r
Content-Disposition: form-data; name=\"file3[1]\"; filename=\"favicon.ico\"\r
Content-Type: image/x-icon\r
\r
zzz\r
--A--\r
";

/// The same form with bare-LF line endings throughout.
pub const MULTIPART_FORM_DATA_LF: &str = r#"--A
Content-Disposition: form-data; name="text1"

data1
--A
Content-Disposition: form-data; name="text2"

data2
--A
Content-Disposition: form-data; name="text2"

data3
--A
Content-Disposition: form-data; name="file1"; filename="test.txt"
Content-Type: text/plain

content1
--A
Content-Disposition: form-data; name="file2[]"; filename="test.txt"
Content-Type: text/plain

content2
--A
Content-Disposition: form-data; name="file2[]"; filename="favicon.ico"
Content-Type: image/x-icon

xyz
--A
Content-Disposition: form-data; name="file3[0]"; filename="test.txt"
Content-Type: text/plain

content3
--A
Content-Disposition: form-data; name="file3[1]"; filename="favicon.ico"
Content-Type: image/x-icon

zzz
--A--
"#;

/// Test configuration with a private spool directory.
pub struct TestConfig {
    pub params: ParamsConfig,
    pub spool: TempDir,
}

#[allow(dead_code)]
impl TestConfig {
    pub fn new() -> Self {
        let spool = tempfile::tempdir().expect("Failed to create spool dir");
        let params = ParamsConfig::default()
            .with_spool_dir(spool.path())
            .with_read_timeout(Some(Duration::from_secs(5)));
        Self { params, spool }
    }

    pub fn with_params(mut self, f: impl FnOnce(ParamsConfig) -> ParamsConfig) -> Self {
        self.params = f(self.params);
        self
    }

    /// Number of files currently in the spool directory.
    pub fn spooled_count(&self) -> usize {
        std::fs::read_dir(self.spool.path())
            .expect("Failed to read spool dir")
            .count()
    }
}

/// Build a request with a buffered body.
#[allow(dead_code)]
pub fn request(uri: &str, headers: &[(&str, &str)], body: &str) -> Request {
    request_bytes(uri, headers, body.as_bytes())
}

/// Build a request with a buffered body that need not be UTF-8.
#[allow(dead_code)]
pub fn request_bytes(uri: &str, headers: &[(&str, &str)], body: &[u8]) -> Request {
    Request::new(
        Method::POST,
        uri.parse().expect("Invalid URI"),
        header_map(headers),
        Bytes::copy_from_slice(body),
    )
}

/// Build a request whose body arrives from `body` chunk by chunk.
#[allow(dead_code)]
pub fn streaming_request<S>(uri: &str, headers: &[(&str, &str)], body: S) -> Request
where
    S: Stream<Item = std::io::Result<Bytes>> + Send + 'static,
{
    Request::streaming(
        Method::POST,
        uri.parse().expect("Invalid URI"),
        header_map(headers),
        body,
    )
}

/// Split `body` into fixed-size chunks.
#[allow(dead_code)]
pub fn chunked(body: &str, size: usize) -> impl Stream<Item = std::io::Result<Bytes>> + Send {
    let chunks: Vec<_> = body
        .as_bytes()
        .chunks(size)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    stream::iter(chunks)
}

/// Multipart request carrying the standard fixture.
#[allow(dead_code)]
pub fn multipart_request(uri: &str) -> Request {
    multipart_request_with(uri, MULTIPART_FORM_DATA)
}

/// Multipart request with boundary `A` carrying `body`.
#[allow(dead_code)]
pub fn multipart_request_with(uri: &str, body: &str) -> Request {
    let content_type = format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY);
    let content_length = body.len().to_string();
    request(
        uri,
        &[
            ("content-type", content_type.as_str()),
            ("content-length", content_length.as_str()),
        ],
        body,
    )
}

fn header_map(headers: &[(&str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(
            http::HeaderName::from_bytes(name.as_bytes()).expect("Invalid header name"),
            value.parse().expect("Invalid header value"),
        );
    }
    map
}

/// Assert the values of a field, in order.
#[allow(dead_code)]
pub fn assert_values(values: &Values, name: &str, expected: &[&str]) {
    let actual = values
        .get_all(name)
        .unwrap_or_else(|| panic!("Field {} missing", name));
    assert_eq!(actual, expected, "Values of field {}", name);
}

/// Read back every upload of a field as (filename, content) pairs.
#[allow(dead_code)]
pub async fn read_files(files: &Files, name: &str) -> Vec<(String, Vec<u8>)> {
    let mut out = Vec::new();
    for file in files
        .get_all(name)
        .unwrap_or_else(|| panic!("File field {} missing", name))
    {
        let content = file.bytes().await.expect("Failed to read upload");
        out.push((file.filename.clone(), content.to_vec()));
    }
    out
}
