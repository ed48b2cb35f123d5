//! Size-bounded body stream.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};

use crate::core::Error;

/// Error yielded by [`LimitedBody`].
#[derive(Debug)]
pub enum BodyError {
    /// More than `limit` bytes were read.
    TooLarge { limit: u64 },
    /// The underlying stream failed.
    Io(io::Error),
}

impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyError::TooLarge { limit } => write!(f, "body exceeds {} bytes", limit),
            BodyError::Io(e) => write!(f, "body read failed: {}", e),
        }
    }
}

impl std::error::Error for BodyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BodyError::Io(e) => Some(e),
            BodyError::TooLarge { .. } => None,
        }
    }
}

impl From<BodyError> for Error {
    fn from(e: BodyError) -> Self {
        match e {
            BodyError::TooLarge { limit } => Error::SizeExceeded { limit },
            BodyError::Io(e) => Error::Transport(e),
        }
    }
}

/// Counting wrapper that fails as soon as the running total passes `limit`.
///
/// Independent of whatever decoder consumes it; once the limit trips the
/// stream is fused and yields nothing further.
pub struct LimitedBody<S> {
    inner: S,
    limit: u64,
    read: u64,
    done: bool,
}

impl<S> LimitedBody<S> {
    pub fn new(inner: S, limit: u64) -> Self {
        Self {
            inner,
            limit,
            read: 0,
            done: false,
        }
    }
}

impl<S> Stream for LimitedBody<S>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    type Item = Result<Bytes, BodyError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }

        let this = &mut *self;
        match ready!(Pin::new(&mut this.inner).poll_next(cx)) {
            Some(Ok(chunk)) => {
                this.read += chunk.len() as u64;
                if this.read > this.limit {
                    this.done = true;
                    Poll::Ready(Some(Err(BodyError::TooLarge { limit: this.limit })))
                } else {
                    Poll::Ready(Some(Ok(chunk)))
                }
            }
            Some(Err(e)) => {
                this.done = true;
                Poll::Ready(Some(Err(BodyError::Io(e))))
            }
            None => {
                this.done = true;
                Poll::Ready(None)
            }
        }
    }
}

/// Read a bounded body to completion.
pub async fn read_to_bytes<S>(mut body: LimitedBody<S>) -> Result<Bytes, BodyError>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
{
    let mut buf = BytesMut::new();
    while let Some(chunk) = body.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf.freeze())
}
