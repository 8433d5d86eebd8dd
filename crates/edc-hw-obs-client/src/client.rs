//! The [`ObsClient`] trait.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use edc_hw_obs_model::{
    CompletedPart, DeleteResult, InitiatedUpload, ListObjectsPage, ObjectSummary, ObsError,
    ObsResult,
};
use tokio::io::AsyncRead;

/// Streaming object body.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Body and metadata of a fetched object.
pub struct ObjectBody {
    /// `Content-Length`, when known.
    pub content_length: Option<u64>,
    /// Entity tag, quotes stripped.
    pub etag: Option<String>,
    /// The body stream. Dropping it releases the connection.
    pub stream: ByteStream,
}

impl fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBody")
            .field("content_length", &self.content_length)
            .field("etag", &self.etag)
            .finish_non_exhaustive()
    }
}

/// Arguments of one `UploadPart` call.
#[derive(Debug, Clone)]
pub struct UploadPartRequest<'a> {
    /// Target bucket.
    pub bucket: &'a str,
    /// Target object key.
    pub key: &'a str,
    /// Upload id from the initiate call.
    pub upload_id: &'a str,
    /// Part number, starting at 1.
    pub part_number: u32,
    /// Offset of this part within the object.
    pub offset: u64,
    /// Part content. Its length is the part size.
    pub body: Bytes,
}

/// Operations the connector performs against an OBS endpoint.
#[async_trait]
pub trait ObsClient: Send + Sync + fmt::Debug {
    /// Endpoint this client talks to.
    fn endpoint(&self) -> &str;

    /// Create a bucket.
    async fn create_bucket(&self, bucket: &str) -> ObsResult<()>;

    /// Delete an empty bucket.
    async fn delete_bucket(&self, bucket: &str) -> ObsResult<()>;

    /// List one page of objects under `prefix`, starting after `marker`.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        marker: Option<&str>,
    ) -> ObsResult<ListObjectsPage>;

    /// Upload an object in a single request. Returns its entity tag.
    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> ObsResult<String>;

    /// Fetch an object as a stream.
    async fn get_object(&self, bucket: &str, key: &str) -> ObsResult<ObjectBody>;

    /// Delete one object.
    async fn delete_object(&self, bucket: &str, key: &str) -> ObsResult<()>;

    /// Delete up to [`MAX_DELETE_BATCH`](edc_hw_obs_model::MAX_DELETE_BATCH) objects.
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> ObsResult<DeleteResult>;

    /// Start a multipart upload.
    async fn initiate_multipart_upload(&self, bucket: &str, key: &str)
    -> ObsResult<InitiatedUpload>;

    /// Upload one part of a multipart upload.
    async fn upload_part(&self, request: UploadPartRequest<'_>) -> ObsResult<CompletedPart>;

    /// Assemble the uploaded parts, which must be in ascending part order.
    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> ObsResult<()>;

    /// Abandon a multipart upload and free its parts.
    async fn abort_multipart_upload(&self, bucket: &str, key: &str, upload_id: &str)
    -> ObsResult<()>;

    /// Release resources held by the client.
    async fn close(&self) -> ObsResult<()>;

    /// List every object under `prefix`, following markers until the listing ends.
    async fn list_all_objects(&self, bucket: &str, prefix: &str) -> ObsResult<Vec<ObjectSummary>> {
        let mut objects = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let page = self.list_objects(bucket, prefix, marker.as_deref()).await?;
            let next = page.continuation_marker();
            objects.extend(page.objects);
            match next {
                None => return Ok(objects),
                Some(m) if marker.as_deref() == Some(m.as_str()) => {
                    return Err(ObsError::InvalidResponse(format!(
                        "listing of {bucket} did not advance past marker {m}"
                    )));
                }
                Some(m) => marker = Some(m),
            }
        }
    }
}
