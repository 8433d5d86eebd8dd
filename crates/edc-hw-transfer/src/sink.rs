//! Multipart upload sink.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use edc_hw_obs_client::{ByteStream, ObsClient, UploadPartRequest};
use edc_hw_obs_model::{CompletedPart, ErrorReason, MAX_PART_NUMBER, ObsError};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::error::{StreamResult, TransferError};
use crate::part::Part;

/// Chunk buffers start at most this large and grow as data arrives.
const INITIAL_CHUNK_CAPACITY: usize = 8 * 1024 * 1024;

/// State of one object's multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    /// Target bucket.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Upload id returned by the initiate call.
    pub upload_id: String,
    /// Number of the next part to upload, starting at 1.
    pub part_number: u32,
    /// Bytes uploaded so far.
    pub bytes_transferred: u64,
    /// Uploaded parts in upload order.
    pub completed_parts: Vec<CompletedPart>,
}

impl UploadSession {
    fn new(bucket: &str, key: &str, upload_id: String) -> Self {
        Self {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            upload_id,
            part_number: 1,
            bytes_transferred: 0,
            completed_parts: Vec::new(),
        }
    }

    fn record(&mut self, part: CompletedPart, len: usize) {
        self.completed_parts.push(part);
        self.part_number += 1;
        self.bytes_transferred += len as u64;
    }
}

/// One uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    /// Object key.
    pub key: String,
    /// Number of multipart parts.
    pub part_count: u32,
    /// Object size.
    pub bytes: u64,
}

/// Result of a successful `transfer_parts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferSummary {
    /// Uploaded objects in input order.
    pub objects: Vec<UploadedObject>,
    /// Total bytes uploaded.
    pub bytes_transferred: u64,
}

/// Uploads parts into an OBS bucket.
pub struct ObsDataSink {
    client: Arc<dyn ObsClient>,
    abort_client: Option<Arc<dyn ObsClient>>,
    bucket: String,
    key_prefix: String,
    chunk_size: usize,
}

impl fmt::Debug for ObsDataSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObsDataSink")
            .field("endpoint", &self.client.endpoint())
            .field("abort_fallback", &self.abort_client.is_some())
            .field("bucket", &self.bucket)
            .field("key_prefix", &self.key_prefix)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

impl ObsDataSink {
    /// Create a sink writing to `bucket` under `key_prefix` in `chunk_size` byte parts.
    #[must_use]
    pub fn new(
        client: Arc<dyn ObsClient>,
        bucket: impl Into<String>,
        key_prefix: impl Into<String>,
        chunk_size: usize,
    ) -> Self {
        Self {
            client,
            abort_client: None,
            bucket: bucket.into(),
            key_prefix: key_prefix.into(),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Abort with `client` when the upload client is denied the abort.
    ///
    /// Upload credentials scoped to `PutObject` may not abort their own
    /// multipart uploads.
    #[must_use]
    pub fn with_abort_client(mut self, client: Arc<dyn ObsClient>) -> Self {
        self.abort_client = Some(client);
        self
    }

    /// Target bucket.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload every part, in order, stopping at the first failure.
    ///
    /// A failed object's multipart upload is aborted before the error is
    /// returned. Objects uploaded before the failure are kept.
    pub async fn transfer_parts(&self, parts: Vec<Box<dyn Part>>) -> StreamResult<TransferSummary> {
        let mut summary = TransferSummary::default();
        for part in parts {
            let uploaded = self.transfer_part(part.as_ref()).await?;
            summary.bytes_transferred += uploaded.bytes;
            summary.objects.push(uploaded);
        }
        info!(
            bucket = %self.bucket,
            objects = summary.objects.len(),
            bytes = summary.bytes_transferred,
            "transfer complete"
        );
        Ok(summary)
    }

    async fn transfer_part(&self, part: &dyn Part) -> StreamResult<UploadedObject> {
        let name = part.name();
        let key = format!("{}{name}", self.key_prefix);
        let failure = |part_number: u32, cause: &dyn fmt::Display| {
            TransferError::General(format!(
                "Error transferring part {part_number} of {name} to OBS bucket {}: {cause}",
                self.bucket
            ))
        };

        let mut stream = part.open_stream().await.map_err(|e| failure(1, &e))?;
        let upload = self
            .client
            .initiate_multipart_upload(&self.bucket, &key)
            .await
            .map_err(|e| failure(1, &e))?;
        debug!(bucket = %self.bucket, key = %key, upload_id = %upload.upload_id, "initiated multipart upload");

        let mut session = UploadSession::new(&self.bucket, &key, upload.upload_id);
        let result = self.upload_chunks(&mut session, &mut stream).await;
        drop(stream);

        match result {
            Ok(()) => Ok(UploadedObject {
                key,
                part_count: session.part_number - 1,
                bytes: session.bytes_transferred,
            }),
            Err(e) => {
                self.abort(&session).await;
                let part_number = match e {
                    ChunkError::Complete(_) => session.part_number - 1,
                    ChunkError::Read(_) | ChunkError::Obs(_) => session.part_number,
                };
                Err(failure(part_number, &e))
            }
        }
    }

    async fn upload_chunks(
        &self,
        session: &mut UploadSession,
        stream: &mut ByteStream,
    ) -> Result<(), ChunkError> {
        loop {
            let chunk = self.read_chunk(stream).await?;
            let len = chunk.len();
            // An empty first chunk still uploads one empty part.
            if len == 0 && session.part_number > 1 {
                break;
            }
            if session.part_number > MAX_PART_NUMBER {
                return Err(ChunkError::Obs(ObsError::InvalidRequest(format!(
                    "object needs more than {MAX_PART_NUMBER} parts, increase the chunk size"
                ))));
            }

            let completed = self
                .client
                .upload_part(UploadPartRequest {
                    bucket: &session.bucket,
                    key: &session.key,
                    upload_id: &session.upload_id,
                    part_number: session.part_number,
                    offset: session.bytes_transferred,
                    body: chunk,
                })
                .await?;
            debug!(
                key = %session.key,
                part_number = session.part_number,
                bytes = len,
                "uploaded part"
            );
            session.record(completed, len);

            // A short chunk means the stream hit end of file.
            if len < self.chunk_size {
                break;
            }
        }

        self.client
            .complete_multipart_upload(
                &session.bucket,
                &session.key,
                &session.upload_id,
                &session.completed_parts,
            )
            .await
            .map_err(ChunkError::Complete)?;
        Ok(())
    }

    /// Read up to `chunk_size` bytes, filling the chunk across short reads.
    async fn read_chunk(&self, stream: &mut ByteStream) -> Result<Bytes, ChunkError> {
        let mut buf = Vec::with_capacity(self.chunk_size.min(INITIAL_CHUNK_CAPACITY));
        stream
            .take(self.chunk_size as u64)
            .read_to_end(&mut buf)
            .await
            .map_err(ChunkError::Read)?;
        Ok(Bytes::from(buf))
    }

    async fn abort(&self, session: &UploadSession) {
        let mut result = self
            .client
            .abort_multipart_upload(&session.bucket, &session.key, &session.upload_id)
            .await;
        if let Some(fallback) = &self.abort_client {
            if matches!(&result, Err(e) if e.reason() == ErrorReason::AccessDenied) {
                debug!(
                    key = %session.key,
                    upload_id = %session.upload_id,
                    "abort denied, retrying with the abort client"
                );
                result = fallback
                    .abort_multipart_upload(&session.bucket, &session.key, &session.upload_id)
                    .await;
            }
        }
        if let Err(e) = result {
            warn!(
                bucket = %session.bucket,
                key = %session.key,
                upload_id = %session.upload_id,
                error = %e,
                "failed to abort multipart upload"
            );
        }
    }
}

#[derive(Debug)]
enum ChunkError {
    Read(std::io::Error),
    Obs(ObsError),
    Complete(ObsError),
}

impl From<ObsError> for ChunkError {
    fn from(error: ObsError) -> Self {
        Self::Obs(error)
    }
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(e) => write!(f, "failed to read input: {e}"),
            Self::Obs(e) => e.fmt(f),
            Self::Complete(e) => write!(f, "failed to complete upload: {e}"),
        }
    }
}
