//! Bare-LF multipart framing.
//!
//! Some clients (and hand-written fixtures) terminate delimiter and header
//! lines with `\n` instead of `\r\n`. `multer` only understands CRLF framing,
//! so [`NormalizedBody`] sits in front of it and rewrites those line endings.
//! Part content is passed through untouched; only the newline that precedes a
//! delimiter is widened to CRLF.

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_util::Stream;

use super::limit::BodyError;

/// Give up on detection after this many bytes without a newline.
const DETECT_LIMIT: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// First line not seen yet.
    Detect,
    /// CRLF framing; bytes pass through.
    Passthrough,
    /// Bare-LF framing; rewrite line endings.
    BareLf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Part content (or preamble): looking for `\n--boundary`.
    Content,
    /// Rest of a delimiter line; `dashes` counts a leading `--`.
    Delimiter { dashes: u8 },
    /// Part headers; `line_empty` is true at the start of a line.
    Headers { line_empty: bool },
    /// After the closing delimiter.
    Epilogue,
}

/// Incremental line-ending rewriter for one multipart body.
pub(crate) struct FramingNormalizer {
    delimiter: Vec<u8>,
    mode: Mode,
    state: State,
    at_start: bool,
    carry: Vec<u8>,
    last: Option<u8>,
}

impl FramingNormalizer {
    pub(crate) fn new(boundary: &str) -> Self {
        let mut delimiter = Vec::with_capacity(boundary.len() + 2);
        delimiter.extend_from_slice(b"--");
        delimiter.extend_from_slice(boundary.as_bytes());

        Self {
            delimiter,
            mode: Mode::Detect,
            state: State::Content,
            at_start: true,
            carry: Vec::new(),
            last: None,
        }
    }

    #[inline]
    pub(crate) fn is_passthrough(&self) -> bool {
        self.mode == Mode::Passthrough
    }

    /// Feed one chunk, appending rewritten bytes to `out`.
    pub(crate) fn push(&mut self, input: &[u8], out: &mut BytesMut) {
        match self.mode {
            Mode::Passthrough => out.extend_from_slice(input),
            Mode::Detect => {
                self.carry.extend_from_slice(input);
                let Some(nl) = self.carry.iter().position(|&b| b == b'\n') else {
                    if self.carry.len() > DETECT_LIMIT {
                        self.mode = Mode::Passthrough;
                        out.extend_from_slice(&std::mem::take(&mut self.carry));
                    }
                    return;
                };

                let data = std::mem::take(&mut self.carry);
                if nl > 0 && data[nl - 1] == b'\r' {
                    self.mode = Mode::Passthrough;
                    out.extend_from_slice(&data);
                } else {
                    tracing::debug!("multipart body uses bare LF framing");
                    self.mode = Mode::BareLf;
                    self.rewrite(&data, false, out);
                }
            }
            Mode::BareLf => {
                let mut data = std::mem::take(&mut self.carry);
                data.extend_from_slice(input);
                self.rewrite(&data, false, out);
            }
        }
    }

    /// Flush held-back bytes at end of body.
    pub(crate) fn finish(&mut self, out: &mut BytesMut) {
        let data = std::mem::take(&mut self.carry);
        match self.mode {
            Mode::BareLf => self.rewrite(&data, true, out),
            _ => out.extend_from_slice(&data),
        }
    }

    fn emit(&mut self, bytes: &[u8], out: &mut BytesMut) {
        if let Some(&b) = bytes.last() {
            out.extend_from_slice(bytes);
            self.last = Some(b);
        }
    }

    fn emit_newline(&mut self, out: &mut BytesMut) {
        if self.last != Some(b'\r') {
            out.extend_from_slice(b"\r");
        }
        self.emit(b"\n", out);
    }

    fn rewrite(&mut self, data: &[u8], eof: bool, out: &mut BytesMut) {
        let delim_len = self.delimiter.len();
        let mut i = 0;

        while i < data.len() {
            match self.state {
                State::Content if self.at_start => {
                    let rest = &data[i..];
                    if rest.len() < delim_len && !eof && self.delimiter.starts_with(rest) {
                        self.carry = rest.to_vec();
                        return;
                    }
                    self.at_start = false;
                    if rest.starts_with(&self.delimiter) {
                        let delimiter = self.delimiter.clone();
                        self.emit(&delimiter, out);
                        i += delim_len;
                        self.state = State::Delimiter { dashes: 0 };
                    }
                }
                State::Content => {
                    let Some(rel) = data[i..].iter().position(|&b| b == b'\n') else {
                        self.emit(&data[i..], out);
                        return;
                    };
                    let nl = i + rel;
                    self.emit(&data[i..nl], out);

                    let rest = &data[nl + 1..];
                    if rest.len() < delim_len && !eof && self.delimiter.starts_with(rest) {
                        self.carry = data[nl..].to_vec();
                        return;
                    }

                    if rest.starts_with(&self.delimiter) {
                        self.emit_newline(out);
                        let delimiter = self.delimiter.clone();
                        self.emit(&delimiter, out);
                        i = nl + 1 + delim_len;
                        self.state = State::Delimiter { dashes: 0 };
                    } else {
                        self.emit(b"\n", out);
                        i = nl + 1;
                    }
                }
                State::Delimiter { dashes } => {
                    let b = data[i];
                    i += 1;
                    if b == b'\n' {
                        self.emit_newline(out);
                        self.state = if dashes >= 2 {
                            State::Epilogue
                        } else {
                            State::Headers { line_empty: true }
                        };
                    } else {
                        self.emit(&[b], out);
                        let dashes = if b == b'-' && dashes < 2 { dashes + 1 } else { dashes };
                        self.state = State::Delimiter { dashes };
                    }
                }
                State::Headers { line_empty } => {
                    let b = data[i];
                    i += 1;
                    match b {
                        b'\n' => {
                            self.emit_newline(out);
                            self.state = if line_empty {
                                State::Content
                            } else {
                                State::Headers { line_empty: true }
                            };
                        }
                        b'\r' => self.emit(&[b], out),
                        _ => {
                            self.emit(&[b], out);
                            self.state = State::Headers { line_empty: false };
                        }
                    }
                }
                State::Epilogue => {
                    self.emit(&data[i..], out);
                    return;
                }
            }
        }
    }
}

/// Multipart body stream with bare-LF framing rewritten to CRLF.
pub(crate) struct NormalizedBody<S> {
    inner: S,
    normalizer: FramingNormalizer,
    done: bool,
}

impl<S> NormalizedBody<S> {
    pub(crate) fn new(inner: S, boundary: &str) -> Self {
        Self {
            inner,
            normalizer: FramingNormalizer::new(boundary),
            done: false,
        }
    }
}

impl<S> Stream for NormalizedBody<S>
where
    S: Stream<Item = Result<Bytes, BodyError>> + Unpin,
{
    type Item = Result<Bytes, BodyError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            if this.done {
                return Poll::Ready(None);
            }

            match ready!(Pin::new(&mut this.inner).poll_next(cx)) {
                Some(Ok(chunk)) => {
                    if this.normalizer.is_passthrough() {
                        return Poll::Ready(Some(Ok(chunk)));
                    }
                    let mut out = BytesMut::with_capacity(chunk.len() + 8);
                    this.normalizer.push(&chunk, &mut out);
                    if !out.is_empty() {
                        return Poll::Ready(Some(Ok(out.freeze())));
                    }
                }
                Some(Err(e)) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
                None => {
                    this.done = true;
                    let mut out = BytesMut::new();
                    this.normalizer.finish(&mut out);
                    if !out.is_empty() {
                        return Poll::Ready(Some(Ok(out.freeze())));
                    }
                }
            }
        }
    }
}
