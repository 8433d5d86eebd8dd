//! In-memory [`ObsClient`].
//!
//! Buckets live in a mutex-guarded map. Every call is appended to a log before
//! it runs, and faults can be injected per operation, which is what the
//! provisioning and transfer tests rely on.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use edc_hw_obs_model::{
    CompletedPart, DeleteResult, InitiatedUpload, ListObjectsPage, MAX_DELETE_BATCH,
    MAX_LIST_KEYS, ObjectSummary, ObsError, ObsResult,
};
use parking_lot::Mutex;

use crate::client::{ObjectBody, ObsClient, UploadPartRequest};

/// Operation names recorded in the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObsOperation {
    /// `create_bucket`.
    CreateBucket,
    /// `delete_bucket`.
    DeleteBucket,
    /// `list_objects`.
    ListObjects,
    /// `put_object`.
    PutObject,
    /// `get_object`.
    GetObject,
    /// `delete_object`.
    DeleteObject,
    /// `delete_objects`.
    DeleteObjects,
    /// `initiate_multipart_upload`.
    InitiateMultipartUpload,
    /// `upload_part`.
    UploadPart,
    /// `complete_multipart_upload`.
    CompleteMultipartUpload,
    /// `abort_multipart_upload`.
    AbortMultipartUpload,
    /// `close`.
    Close,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObsCall {
    /// The operation.
    pub operation: ObsOperation,
    /// Bucket argument (empty for `close`).
    pub bucket: String,
    /// Key argument, where the operation takes one.
    pub key: Option<String>,
    /// Part number of `upload_part` calls.
    pub part_number: Option<u32>,
    /// Payload size of `put_object`/`upload_part`, or key count of `delete_objects`.
    pub size: Option<u64>,
}

impl ObsCall {
    fn new(operation: ObsOperation, bucket: &str) -> Self {
        Self {
            operation,
            bucket: bucket.to_owned(),
            key: None,
            part_number: None,
            size: None,
        }
    }

    fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_owned());
        self
    }
}

#[derive(Debug)]
struct PendingUpload {
    bucket: String,
    key: String,
    parts: BTreeMap<u32, (String, Bytes)>,
}

#[derive(Debug)]
struct Fault {
    error: ObsError,
    skip: usize,
    remaining: Option<usize>,
}

#[derive(Debug, Default)]
struct MemoryState {
    buckets: BTreeMap<String, BTreeMap<String, Bytes>>,
    uploads: HashMap<String, PendingUpload>,
    faults: HashMap<ObsOperation, VecDeque<Fault>>,
    calls: Vec<ObsCall>,
    next_upload: u64,
    closed: bool,
}

impl MemoryState {
    /// Record the call and return the injected fault, if any.
    fn enter(&mut self, call: ObsCall) -> ObsResult<()> {
        let operation = call.operation;
        self.calls.push(call);

        let Some(queue) = self.faults.get_mut(&operation) else {
            return Ok(());
        };
        let Some(fault) = queue.front_mut() else {
            return Ok(());
        };
        if fault.skip > 0 {
            fault.skip -= 1;
            return Ok(());
        }
        let error = fault.error.clone();
        if let Some(remaining) = fault.remaining.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                queue.pop_front();
            }
        }
        Err(error)
    }

    fn bucket(&self, bucket: &str) -> ObsResult<&BTreeMap<String, Bytes>> {
        self.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))
    }

    fn bucket_mut(&mut self, bucket: &str) -> ObsResult<&mut BTreeMap<String, Bytes>> {
        self.buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))
    }
}

/// In-memory OBS endpoint.
#[derive(Debug)]
pub struct MemoryObsClient {
    endpoint: String,
    page_size: usize,
    state: Mutex<MemoryState>,
}

impl Default for MemoryObsClient {
    fn default() -> Self {
        Self::new("memory://obs")
    }
}

impl MemoryObsClient {
    /// Create an empty store answering for `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            page_size: MAX_LIST_KEYS as usize,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Limit listing pages to `page_size` objects.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fail every subsequent call of `operation` with `error`.
    pub fn fail_always(&self, operation: ObsOperation, error: ObsError) {
        self.state
            .lock()
            .faults
            .entry(operation)
            .or_default()
            .push_back(Fault {
                error,
                skip: 0,
                remaining: None,
            });
    }

    /// Fail the next `times` calls of `operation` with `error`.
    pub fn fail_times(&self, operation: ObsOperation, error: ObsError, times: usize) {
        if times == 0 {
            return;
        }
        self.state
            .lock()
            .faults
            .entry(operation)
            .or_default()
            .push_back(Fault {
                error,
                skip: 0,
                remaining: Some(times),
            });
    }

    /// Fail only the `nth` (1-based) subsequent call of `operation`.
    pub fn fail_nth(&self, operation: ObsOperation, error: ObsError, nth: usize) {
        self.state
            .lock()
            .faults
            .entry(operation)
            .or_default()
            .push_back(Fault {
                error,
                skip: nth.saturating_sub(1),
                remaining: Some(1),
            });
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        self.state.lock().faults.clear();
    }

    /// Snapshot of the call log.
    #[must_use]
    pub fn calls(&self) -> Vec<ObsCall> {
        self.state.lock().calls.clone()
    }

    /// Operations in call order.
    #[must_use]
    pub fn operations(&self) -> Vec<ObsOperation> {
        self.state.lock().calls.iter().map(|c| c.operation).collect()
    }

    /// Number of calls of `operation`.
    #[must_use]
    pub fn call_count(&self, operation: ObsOperation) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Forget all recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Whether the bucket exists.
    #[must_use]
    pub fn bucket_exists(&self, bucket: &str) -> bool {
        self.state.lock().buckets.contains_key(bucket)
    }

    /// Stored content of an object.
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.state
            .lock()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
    }

    /// Keys stored in a bucket, in order.
    #[must_use]
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.state
            .lock()
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of multipart uploads neither completed nor aborted.
    #[must_use]
    pub fn pending_uploads(&self) -> usize {
        self.state.lock().uploads.len()
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Create a bucket with objects without recording calls.
    pub fn seed_bucket<I, K>(&self, bucket: &str, objects: I)
    where
        I: IntoIterator<Item = (K, Bytes)>,
        K: Into<String>,
    {
        let mut state = self.state.lock();
        let entry = state.buckets.entry(bucket.to_owned()).or_default();
        for (key, body) in objects {
            entry.insert(key.into(), body);
        }
    }
}

fn no_such_bucket(bucket: &str) -> ObsError {
    ObsError::service(404, "NoSuchBucket", format!("bucket {bucket} does not exist"))
}

fn no_such_upload(upload_id: &str) -> ObsError {
    ObsError::service(404, "NoSuchUpload", format!("upload {upload_id} does not exist"))
}

fn memory_etag(body: &[u8]) -> String {
    // FNV-1a is enough to tell parts apart.
    let hash = body.iter().fold(0xcbf2_9ce4_8422_2325_u64, |acc, b| {
        (acc ^ u64::from(*b)).wrapping_mul(0x0100_0000_01b3)
    });
    format!("\"{hash:016x}\"")
}

#[async_trait]
impl ObsClient for MemoryObsClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn create_bucket(&self, bucket: &str) -> ObsResult<()> {
        let mut state = self.state.lock();
        state.enter(ObsCall::new(ObsOperation::CreateBucket, bucket))?;
        if state.buckets.contains_key(bucket) {
            return Err(ObsError::service(
                409,
                "BucketAlreadyOwnedByYou",
                format!("bucket {bucket} already exists"),
            ));
        }
        state.buckets.insert(bucket.to_owned(), BTreeMap::new());
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> ObsResult<()> {
        let mut state = self.state.lock();
        state.enter(ObsCall::new(ObsOperation::DeleteBucket, bucket))?;
        if !state.bucket(bucket)?.is_empty() {
            return Err(ObsError::service(
                409,
                "BucketNotEmpty",
                format!("bucket {bucket} is not empty"),
            ));
        }
        state.buckets.remove(bucket);
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        marker: Option<&str>,
    ) -> ObsResult<ListObjectsPage> {
        let mut state = self.state.lock();
        state.enter(ObsCall::new(ObsOperation::ListObjects, bucket))?;

        let mut matching = state
            .bucket(bucket)?
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| marker.is_none_or(|m| key.as_str() > m));

        let objects: Vec<ObjectSummary> = matching
            .by_ref()
            .take(self.page_size)
            .map(|(key, body)| ObjectSummary {
                key: key.clone(),
                size: body.len() as u64,
                etag: Some(memory_etag(body).trim_matches('"').to_owned()),
                last_modified: None,
            })
            .collect();
        let is_truncated = matching.next().is_some();

        Ok(ListObjectsPage {
            objects,
            is_truncated,
            next_marker: None,
        })
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> ObsResult<String> {
        let mut state = self.state.lock();
        let mut call = ObsCall::new(ObsOperation::PutObject, bucket).with_key(key);
        call.size = Some(body.len() as u64);
        state.enter(call)?;
        let etag = memory_etag(&body);
        state.bucket_mut(bucket)?.insert(key.to_owned(), body);
        Ok(etag)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> ObsResult<ObjectBody> {
        let mut state = self.state.lock();
        state.enter(ObsCall::new(ObsOperation::GetObject, bucket).with_key(key))?;
        let body = state.bucket(bucket)?.get(key).cloned().ok_or_else(|| {
            ObsError::service(404, "NoSuchKey", format!("key {key} does not exist"))
        })?;
        Ok(ObjectBody {
            content_length: Some(body.len() as u64),
            etag: Some(memory_etag(&body).trim_matches('"').to_owned()),
            stream: Box::pin(Cursor::new(body)),
        })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> ObsResult<()> {
        let mut state = self.state.lock();
        state.enter(ObsCall::new(ObsOperation::DeleteObject, bucket).with_key(key))?;
        state.bucket_mut(bucket)?.remove(key);
        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> ObsResult<DeleteResult> {
        let mut state = self.state.lock();
        let mut call = ObsCall::new(ObsOperation::DeleteObjects, bucket);
        call.size = Some(keys.len() as u64);
        state.enter(call)?;
        if keys.len() > MAX_DELETE_BATCH {
            return Err(ObsError::service(
                400,
                "MalformedXML",
                "too many keys in one delete request",
            ));
        }
        let objects = state.bucket_mut(bucket)?;
        for key in keys {
            objects.remove(key);
        }
        Ok(DeleteResult {
            deleted: keys.to_vec(),
            errors: Vec::new(),
        })
    }

    async fn initiate_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
    ) -> ObsResult<InitiatedUpload> {
        let mut state = self.state.lock();
        state.enter(ObsCall::new(ObsOperation::InitiateMultipartUpload, bucket).with_key(key))?;
        state.bucket(bucket)?;
        state.next_upload += 1;
        let upload_id = format!("upload-{}", state.next_upload);
        state.uploads.insert(
            upload_id.clone(),
            PendingUpload {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
                parts: BTreeMap::new(),
            },
        );
        Ok(InitiatedUpload {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            upload_id,
        })
    }

    async fn upload_part(&self, request: UploadPartRequest<'_>) -> ObsResult<CompletedPart> {
        let mut state = self.state.lock();
        let mut call = ObsCall::new(ObsOperation::UploadPart, request.bucket).with_key(request.key);
        call.part_number = Some(request.part_number);
        call.size = Some(request.body.len() as u64);
        state.enter(call)?;

        let upload = state
            .uploads
            .get_mut(request.upload_id)
            .ok_or_else(|| no_such_upload(request.upload_id))?;
        let etag = memory_etag(&request.body);
        upload
            .parts
            .insert(request.part_number, (etag.clone(), request.body));
        Ok(CompletedPart {
            part_number: request.part_number,
            etag,
        })
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> ObsResult<()> {
        let mut state = self.state.lock();
        state.enter(ObsCall::new(ObsOperation::CompleteMultipartUpload, bucket).with_key(key))?;

        let upload = state
            .uploads
            .get(upload_id)
            .ok_or_else(|| no_such_upload(upload_id))?;
        if upload.bucket != bucket || upload.key != key {
            return Err(no_such_upload(upload_id));
        }
        if parts.is_empty() {
            return Err(ObsError::service(400, "MalformedXML", "no parts given"));
        }
        if parts.windows(2).any(|w| w[0].part_number >= w[1].part_number) {
            return Err(ObsError::service(
                400,
                "InvalidPartOrder",
                "parts are not in ascending order",
            ));
        }

        let mut content = BytesMut::new();
        for part in parts {
            match upload.parts.get(&part.part_number) {
                Some((etag, body)) if *etag == part.etag => content.extend_from_slice(body),
                _ => {
                    return Err(ObsError::service(
                        400,
                        "InvalidPart",
                        format!("part {} was not uploaded", part.part_number),
                    ));
                }
            }
        }

        state.uploads.remove(upload_id);
        state
            .bucket_mut(bucket)?
            .insert(key.to_owned(), content.freeze());
        Ok(())
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> ObsResult<()> {
        let mut state = self.state.lock();
        state.enter(ObsCall::new(ObsOperation::AbortMultipartUpload, bucket).with_key(key))?;
        state
            .uploads
            .remove(upload_id)
            .map(|_| ())
            .ok_or_else(|| no_such_upload(upload_id))
    }

    async fn close(&self) -> ObsResult<()> {
        let mut state = self.state.lock();
        state.enter(ObsCall::new(ObsOperation::Close, ""))?;
        state.closed = true;
        Ok(())
    }
}

/// A [`MemoryObsClient`] seen through a scoped credential.
///
/// Operations outside the grant fail with `403 AccessDenied` without reaching
/// the store, like a temporary credential whose policy lacks the action.
#[derive(Debug)]
pub struct RestrictedObsClient {
    inner: Arc<MemoryObsClient>,
    allowed: Vec<ObsOperation>,
    denied: Mutex<Vec<ObsOperation>>,
}

impl RestrictedObsClient {
    /// Allow only `allowed` against `inner`.
    #[must_use]
    pub fn new(
        inner: Arc<MemoryObsClient>,
        allowed: impl IntoIterator<Item = ObsOperation>,
    ) -> Self {
        Self {
            inner,
            allowed: allowed.into_iter().collect(),
            denied: Mutex::new(Vec::new()),
        }
    }

    /// The grant of a credential limited to `obs:object:PutObject`, which
    /// covers single and multipart uploads but not aborting them.
    #[must_use]
    pub fn put_object_only(inner: Arc<MemoryObsClient>) -> Self {
        Self::new(
            inner,
            [
                ObsOperation::PutObject,
                ObsOperation::InitiateMultipartUpload,
                ObsOperation::UploadPart,
                ObsOperation::CompleteMultipartUpload,
                ObsOperation::Close,
            ],
        )
    }

    /// Operations rejected so far, in call order.
    #[must_use]
    pub fn denied(&self) -> Vec<ObsOperation> {
        self.denied.lock().clone()
    }

    fn check(&self, operation: ObsOperation) -> ObsResult<()> {
        if self.allowed.contains(&operation) {
            return Ok(());
        }
        self.denied.lock().push(operation);
        Err(ObsError::service(
            403,
            "AccessDenied",
            format!("{operation:?} is not allowed by the credential policy"),
        ))
    }
}

#[async_trait]
impl ObsClient for RestrictedObsClient {
    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }

    async fn create_bucket(&self, bucket: &str) -> ObsResult<()> {
        self.check(ObsOperation::CreateBucket)?;
        self.inner.create_bucket(bucket).await
    }

    async fn delete_bucket(&self, bucket: &str) -> ObsResult<()> {
        self.check(ObsOperation::DeleteBucket)?;
        self.inner.delete_bucket(bucket).await
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        marker: Option<&str>,
    ) -> ObsResult<ListObjectsPage> {
        self.check(ObsOperation::ListObjects)?;
        self.inner.list_objects(bucket, prefix, marker).await
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> ObsResult<String> {
        self.check(ObsOperation::PutObject)?;
        self.inner.put_object(bucket, key, body).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> ObsResult<ObjectBody> {
        self.check(ObsOperation::GetObject)?;
        self.inner.get_object(bucket, key).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> ObsResult<()> {
        self.check(ObsOperation::DeleteObject)?;
        self.inner.delete_object(bucket, key).await
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> ObsResult<DeleteResult> {
        self.check(ObsOperation::DeleteObjects)?;
        self.inner.delete_objects(bucket, keys).await
    }

    async fn initiate_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
    ) -> ObsResult<InitiatedUpload> {
        self.check(ObsOperation::InitiateMultipartUpload)?;
        self.inner.initiate_multipart_upload(bucket, key).await
    }

    async fn upload_part(&self, request: UploadPartRequest<'_>) -> ObsResult<CompletedPart> {
        self.check(ObsOperation::UploadPart)?;
        self.inner.upload_part(request).await
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> ObsResult<()> {
        self.check(ObsOperation::CompleteMultipartUpload)?;
        self.inner
            .complete_multipart_upload(bucket, key, upload_id, parts)
            .await
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> ObsResult<()> {
        self.check(ObsOperation::AbortMultipartUpload)?;
        self.inner.abort_multipart_upload(bucket, key, upload_id).await
    }

    async fn close(&self) -> ObsResult<()> {
        self.check(ObsOperation::Close)?;
        self.inner.close().await
    }
}

#[cfg(test)]
mod tests {
    use edc_hw_obs_model::ErrorReason;
    use tokio::io::AsyncReadExt;

    use super::*;

    #[tokio::test]
    async fn test_should_paginate_listing_with_small_pages() {
        let client = MemoryObsClient::default().with_page_size(2);
        client.seed_bucket(
            "b",
            (0..5).map(|i| (format!("data/{i}"), Bytes::from_static(b"x"))),
        );
        client.seed_bucket("b", [("other", Bytes::new())]);

        let first = client.list_objects("b", "data/", None).await.expect("page");
        assert_eq!(first.objects.len(), 2);
        assert!(first.is_truncated);

        let all = client.list_all_objects("b", "data/").await.expect("listing");
        let keys: Vec<_> = all.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, ["data/0", "data/1", "data/2", "data/3", "data/4"]);
    }

    #[tokio::test]
    async fn test_should_assemble_multipart_upload() {
        let client = MemoryObsClient::default();
        client.create_bucket("b").await.expect("bucket");
        let upload = client
            .initiate_multipart_upload("b", "k")
            .await
            .expect("initiate");

        let mut parts = Vec::new();
        for (i, chunk) in [&b"hello "[..], &b"world"[..]].iter().enumerate() {
            let part = client
                .upload_part(UploadPartRequest {
                    bucket: "b",
                    key: "k",
                    upload_id: &upload.upload_id,
                    part_number: u32::try_from(i + 1).expect("part number"),
                    offset: 0,
                    body: Bytes::copy_from_slice(chunk),
                })
                .await
                .expect("part");
            parts.push(part);
        }
        client
            .complete_multipart_upload("b", "k", &upload.upload_id, &parts)
            .await
            .expect("complete");

        assert_eq!(client.object("b", "k").as_deref(), Some(&b"hello world"[..]));
        assert_eq!(client.pending_uploads(), 0);

        let mut body = client.get_object("b", "k").await.expect("get");
        let mut content = Vec::new();
        body.stream.read_to_end(&mut content).await.expect("read");
        assert_eq!(content, b"hello world");
    }

    #[tokio::test]
    async fn test_should_reject_deleting_non_empty_bucket() {
        let client = MemoryObsClient::default();
        client.seed_bucket("b", [("k", Bytes::from_static(b"v"))]);
        let err = client.delete_bucket("b").await.expect_err("not empty");
        assert_eq!(err.code().map(|c| c.as_str()), Some("BucketNotEmpty"));
    }

    #[tokio::test]
    async fn test_should_inject_faults_and_record_calls() {
        let client = MemoryObsClient::default();
        client.fail_times(
            ObsOperation::CreateBucket,
            ObsError::service(503, "ServiceUnavailable", "busy"),
            1,
        );

        assert!(client.create_bucket("b").await.is_err());
        assert!(client.create_bucket("b").await.is_ok());
        assert_eq!(client.call_count(ObsOperation::CreateBucket), 2);

        client.fail_nth(ObsOperation::DeleteObject, ObsError::Transport("flaky".into()), 2);
        assert!(client.delete_object("b", "k").await.is_ok());
        assert!(client.delete_object("b", "k").await.is_err());
        assert!(client.delete_object("b", "k").await.is_ok());

        client.fail_always(ObsOperation::Close, ObsError::Transport("down".into()));
        assert!(client.close().await.is_err());
        assert!(client.close().await.is_err());
        assert!(!client.is_closed());
    }

    #[tokio::test]
    async fn test_should_deny_operations_outside_the_grant() {
        let store = Arc::new(MemoryObsClient::default());
        store.create_bucket("b").await.expect("bucket");
        let scoped = RestrictedObsClient::put_object_only(Arc::clone(&store));

        let upload = scoped
            .initiate_multipart_upload("b", "k")
            .await
            .expect("initiate");
        let err = scoped
            .abort_multipart_upload("b", "k", &upload.upload_id)
            .await
            .expect_err("abort denied");
        assert_eq!(err.reason(), ErrorReason::AccessDenied);
        assert_eq!(scoped.denied(), [ObsOperation::AbortMultipartUpload]);
        assert_eq!(store.pending_uploads(), 1);
        assert_eq!(store.call_count(ObsOperation::AbortMultipartUpload), 0);

        store
            .abort_multipart_upload("b", "k", &upload.upload_id)
            .await
            .expect("abort");
        assert_eq!(store.pending_uploads(), 0);
    }
}
