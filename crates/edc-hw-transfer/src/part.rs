//! Transfer parts: named byte streams.

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use edc_hw_obs_client::ByteStream;

use crate::error::{StreamResult, TransferError};

/// One logical object moved by a transfer.
///
/// `open_stream` hands out an owned reader; dropping it closes the underlying
/// file or connection.
#[async_trait]
pub trait Part: Send + Sync + fmt::Debug {
    /// Object name, relative to the sink's key prefix.
    fn name(&self) -> &str;

    /// Size in bytes, `0` when unknown.
    fn size(&self) -> u64;

    /// Open the content for reading.
    async fn open_stream(&self) -> StreamResult<ByteStream>;
}

/// In-memory part.
#[derive(Debug, Clone)]
pub struct BytesPart {
    name: String,
    data: Bytes,
}

impl BytesPart {
    /// Create a part named `name` holding `data`.
    #[must_use]
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

#[async_trait]
impl Part for BytesPart {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn open_stream(&self) -> StreamResult<ByteStream> {
        Ok(Box::pin(Cursor::new(self.data.clone())))
    }
}

/// Local file part.
#[derive(Debug, Clone)]
pub struct FilePart {
    name: String,
    path: PathBuf,
    size: u64,
}

impl FilePart {
    /// Part for the file at `path`, named after its file name.
    pub async fn from_path(path: impl AsRef<Path>) -> StreamResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                TransferError::General(format!("{} has no usable file name", path.display()))
            })?
            .to_owned();
        Self::with_name(name, path).await
    }

    /// Part for the file at `path` uploaded as `name`.
    pub async fn with_name(name: impl Into<String>, path: impl AsRef<Path>) -> StreamResult<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| file_error(&path, &e))?;
        if !metadata.is_file() {
            return Err(TransferError::General(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        Ok(Self {
            name: name.into(),
            path,
            size: metadata.len(),
        })
    }

    /// Local path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn file_error(path: &Path, error: &std::io::Error) -> TransferError {
    if error.kind() == std::io::ErrorKind::NotFound {
        TransferError::NotFound(format!("{}: {error}", path.display()))
    } else {
        TransferError::General(format!("{}: {error}", path.display()))
    }
}

#[async_trait]
impl Part for FilePart {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn open_stream(&self) -> StreamResult<ByteStream> {
        let file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| file_error(&self.path, &e))?;
        Ok(Box::pin(file))
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    #[tokio::test]
    async fn test_should_read_file_part() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.bin");
        tokio::fs::write(&path, b"file content").await.expect("write");

        let part = FilePart::from_path(&path).await.expect("part");
        assert_eq!(part.name(), "data.bin");
        assert_eq!(part.size(), 12);

        let mut content = Vec::new();
        part.open_stream()
            .await
            .expect("open")
            .read_to_end(&mut content)
            .await
            .expect("read");
        assert_eq!(content, b"file content");
    }

    #[tokio::test]
    async fn test_should_report_missing_file_as_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = FilePart::from_path(dir.path().join("missing"))
            .await
            .expect_err("missing");
        assert!(matches!(err, TransferError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_should_reopen_bytes_part() {
        let part = BytesPart::new("a", Bytes::from_static(b"abc"));
        for _ in 0..2 {
            let mut content = Vec::new();
            part.open_stream()
                .await
                .expect("open")
                .read_to_end(&mut content)
                .await
                .expect("read");
            assert_eq!(content, b"abc");
        }
    }
}
