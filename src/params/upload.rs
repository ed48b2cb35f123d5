//! Uploaded file handles.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWriteExt};
use uuid::Uuid;

/// Content type assumed when a file part does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

enum Storage {
    Memory(Bytes),
    Spooled { path: PathBuf },
}

/// One multipart file part.
///
/// Spooled parts live in a temporary file that is removed when the handle is
/// dropped, so readers opened from it must not outlive the request.
pub struct UploadedFile {
    /// Client-supplied filename. Untrusted; may be empty.
    pub filename: String,
    /// Declared content type of the part.
    pub content_type: String,
    size: u64,
    storage: Storage,
}

impl UploadedFile {
    /// Size of the part body in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    #[inline]
    pub fn is_spooled(&self) -> bool {
        matches!(self.storage, Storage::Spooled { .. })
    }

    /// Path of the spool file, if this upload is backed by disk.
    pub fn spooled_path(&self) -> Option<&Path> {
        match &self.storage {
            Storage::Memory(_) => None,
            Storage::Spooled { path } => Some(path),
        }
    }

    /// Open a reader over the part body.
    pub async fn open(&self) -> io::Result<Box<dyn AsyncRead + Send + Unpin>> {
        match &self.storage {
            Storage::Memory(data) => Ok(Box::new(io::Cursor::new(data.clone()))),
            Storage::Spooled { path } => Ok(Box::new(File::open(path).await?)),
        }
    }

    /// Read the whole part body.
    pub async fn bytes(&self) -> io::Result<Bytes> {
        match &self.storage {
            Storage::Memory(data) => Ok(data.clone()),
            Storage::Spooled { path } => tokio::fs::read(path).await.map(Bytes::from),
        }
    }
}

impl Drop for UploadedFile {
    fn drop(&mut self) {
        if let Storage::Spooled { path } = &self.storage {
            let _ = std::fs::remove_file(path);
        }
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .field("spooled", &self.is_spooled())
            .finish()
    }
}

impl Serialize for UploadedFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("UploadedFile", 4)?;
        s.serialize_field("filename", &self.filename)?;
        s.serialize_field("content_type", &self.content_type)?;
        s.serialize_field("size", &self.size)?;
        s.serialize_field("spooled", &self.is_spooled())?;
        s.end()
    }
}

/// Accumulates a file part, moving it to disk once it grows past the
/// memory threshold.
pub(crate) struct UploadWriter {
    threshold: usize,
    spool_dir: PathBuf,
    buffer: BytesMut,
    spool: Option<(PathBuf, File)>,
    size: u64,
}

impl UploadWriter {
    pub(crate) fn new(threshold: usize, spool_dir: &Path) -> Self {
        Self {
            threshold,
            spool_dir: spool_dir.to_path_buf(),
            buffer: BytesMut::new(),
            spool: None,
            size: 0,
        }
    }

    pub(crate) async fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.size += chunk.len() as u64;

        if let Some((_, file)) = self.spool.as_mut() {
            return file.write_all(chunk).await;
        }

        if self.buffer.len() + chunk.len() <= self.threshold {
            self.buffer.extend_from_slice(chunk);
            return Ok(());
        }

        let path = self
            .spool_dir
            .join(format!("upload-{}", Uuid::new_v4().simple()));
        let file = File::create(&path).await?;
        tracing::debug!(path = %path.display(), "spooling upload to disk");

        // Registered before writing so a failed write still cleans up.
        let (_, file) = self.spool.insert((path, file));
        file.write_all(&self.buffer).await?;
        file.write_all(chunk).await?;
        self.buffer.clear();
        Ok(())
    }

    pub(crate) async fn finish(
        mut self,
        filename: String,
        content_type: String,
    ) -> io::Result<UploadedFile> {
        let storage = match self.spool.take() {
            Some((path, mut file)) => {
                if let Err(e) = file.flush().await {
                    let _ = std::fs::remove_file(&path);
                    return Err(e);
                }
                Storage::Spooled { path }
            }
            None => Storage::Memory(std::mem::take(&mut self.buffer).freeze()),
        };

        Ok(UploadedFile {
            filename,
            content_type,
            size: self.size,
            storage,
        })
    }
}

impl Drop for UploadWriter {
    fn drop(&mut self) {
        if let Some((path, _)) = self.spool.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}
