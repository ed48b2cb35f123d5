//! Multipart form data parsing.

use std::io;

use bytes::Bytes;
use futures_util::Stream;
use multer::{Field, Multipart};

use super::framing::NormalizedBody;
use super::limit::{BodyError, LimitedBody};
use super::report::{Degradation, FragmentSource, Parsed};
use super::upload::{UploadWriter, DEFAULT_CONTENT_TYPE};
use super::ParameterSet;
use crate::config::ParamsConfig;
use crate::core::{Error, Result};

/// Extract the boundary parameter from a multipart content type.
pub fn parse_boundary(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|part| {
        let (name, value) = part.trim().split_once('=')?;
        if name.trim().eq_ignore_ascii_case("boundary") {
            let boundary = value.trim().trim_matches('"');
            (!boundary.is_empty()).then(|| boundary.to_string())
        } else {
            None
        }
    })
}

/// Outcome of a failed multer call.
enum PartFailure {
    /// Framing is broken; stop parsing and keep what we have.
    Malformed(String),
    /// Body read failed or the size ceiling tripped.
    Fatal(Error),
}

impl From<multer::Error> for PartFailure {
    fn from(err: multer::Error) -> Self {
        match err {
            multer::Error::StreamReadFailed(inner) => match inner.downcast::<BodyError>() {
                Ok(body_err) => PartFailure::Fatal((*body_err).into()),
                Err(other) => PartFailure::Fatal(Error::Transport(io::Error::other(other))),
            },
            other => PartFailure::Malformed(other.to_string()),
        }
    }
}

/// Parse a multipart body into `out`.
///
/// Part order is preserved. Delimiter and header lines may end in CRLF or a
/// bare LF. A part with a `filename` attribute (even an empty
/// one) becomes an [`UploadedFile`](super::UploadedFile), anything else a
/// value. Broken framing stops parsing without discarding earlier parts.
pub async fn parse_multipart<S>(
    content_type: &str,
    body: LimitedBody<S>,
    config: &ParamsConfig,
    out: &mut Parsed<ParameterSet>,
) -> Result<()>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin + Send + 'static,
{
    let Some(boundary) = parse_boundary(content_type) else {
        out.degrade(Degradation::new(
            FragmentSource::Multipart,
            content_type,
            "missing boundary in multipart content-type",
        ));
        return Ok(());
    };

    tracing::debug!(boundary = %boundary, "parse_multipart: found boundary");

    let body = NormalizedBody::new(body, &boundary);
    let mut multipart = Multipart::new(body, boundary);
    let mut index = 0usize;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => match PartFailure::from(err) {
                PartFailure::Fatal(e) => return Err(e),
                PartFailure::Malformed(reason) => {
                    out.degrade(Degradation::new(
                        FragmentSource::Multipart,
                        format!("part #{}", index),
                        reason,
                    ));
                    break;
                }
            },
        };
        index += 1;

        match read_part(field, index, config, out).await {
            Ok(()) => {}
            Err(PartFailure::Fatal(e)) => return Err(e),
            Err(PartFailure::Malformed(reason)) => {
                out.degrade(Degradation::new(
                    FragmentSource::Multipart,
                    format!("part #{}", index),
                    reason,
                ));
                break;
            }
        }
    }

    tracing::debug!(
        parts = index,
        values = out.value.values.len(),
        files = out.value.files.len(),
        "parse_multipart: completed"
    );

    Ok(())
}

async fn read_part(
    mut field: Field<'_>,
    index: usize,
    config: &ParamsConfig,
    out: &mut Parsed<ParameterSet>,
) -> std::result::Result<(), PartFailure> {
    let Some(field_name) = field.name().map(str::to_string) else {
        out.degrade(Degradation::new(
            FragmentSource::Multipart,
            format!("part #{}", index),
            "part has no field name",
        ));
        return Ok(());
    };

    if let Some(filename) = field.file_name().map(str::to_string) {
        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let mut writer = UploadWriter::new(config.memory_threshold, &config.spool_dir);
        while let Some(chunk) = field.chunk().await? {
            writer
                .write(&chunk)
                .await
                .map_err(|e| PartFailure::Fatal(Error::Spool(e)))?;
        }
        let file = writer
            .finish(filename, content_type)
            .await
            .map_err(|e| PartFailure::Fatal(Error::Spool(e)))?;

        tracing::debug!(
            field_name = %field_name,
            file_name = %file.filename,
            size = file.size(),
            spooled = file.is_spooled(),
            "parse_multipart: parsed uploaded file"
        );

        out.value.files.append(field_name, file);
    } else {
        let data = field.bytes().await?;
        let value = match String::from_utf8(data.to_vec()) {
            Ok(value) => value,
            Err(e) => {
                out.degrade(Degradation::new(
                    FragmentSource::Multipart,
                    field_name.as_str(),
                    "value is not valid UTF-8",
                ));
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };

        tracing::debug!(
            field_name = %field_name,
            value_len = value.len(),
            "parse_multipart: parsed form field"
        );

        out.value.values.append(field_name, value);
    }

    Ok(())
}
