//! Listing data source.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use edc_hw_obs_client::{ByteStream, ObsClient};
use edc_hw_obs_model::ObjectSummary;
use tracing::debug;

use crate::error::{StreamResult, TransferError};
use crate::part::Part;

/// A remote object, fetched when its stream is opened.
#[derive(Clone)]
pub struct ObsPart {
    client: Arc<dyn ObsClient>,
    bucket: String,
    key: String,
    size: u64,
}

impl fmt::Debug for ObsPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObsPart")
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl ObsPart {
    fn new(client: Arc<dyn ObsClient>, bucket: &str, object: ObjectSummary) -> Self {
        Self {
            client,
            bucket: bucket.to_owned(),
            key: object.key,
            size: object.size,
        }
    }

    /// Bucket holding the object.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl Part for ObsPart {
    fn name(&self) -> &str {
        &self.key
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn open_stream(&self) -> StreamResult<ByteStream> {
        debug!(bucket = %self.bucket, key = %self.key, "opening object stream");
        let body = self
            .client
            .get_object(&self.bucket, &self.key)
            .await
            .map_err(|e| {
                TransferError::from_obs(
                    &format!("failed to read {} from bucket {}", self.key, self.bucket),
                    &e,
                )
            })?;
        Ok(body.stream)
    }
}

/// Reads every object under a prefix, or one named object.
pub struct ObsDataSource {
    client: Arc<dyn ObsClient>,
    bucket: String,
    key_prefix: String,
    object_name: Option<String>,
}

impl fmt::Debug for ObsDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObsDataSource")
            .field("endpoint", &self.client.endpoint())
            .field("bucket", &self.bucket)
            .field("key_prefix", &self.key_prefix)
            .field("object_name", &self.object_name)
            .finish()
    }
}

impl ObsDataSource {
    /// Source over every object in `bucket` whose key starts with `key_prefix`.
    #[must_use]
    pub fn new(
        client: Arc<dyn ObsClient>,
        bucket: impl Into<String>,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            key_prefix: key_prefix.into(),
            object_name: None,
        }
    }

    /// Restrict the source to the object with key `object_name`.
    #[must_use]
    pub fn with_object_name(mut self, object_name: impl Into<String>) -> Self {
        self.object_name = Some(object_name.into());
        self
    }

    /// List the matching objects.
    ///
    /// Nothing is downloaded until a part's stream is opened. An empty
    /// listing is [`TransferError::NotFound`].
    pub async fn open_part_stream(&self) -> StreamResult<Vec<ObsPart>> {
        let prefix = self.object_name.as_deref().unwrap_or(&self.key_prefix);
        let objects = self
            .client
            .list_all_objects(&self.bucket, prefix)
            .await
            .map_err(|e| {
                TransferError::from_obs(&format!("failed to list bucket {}", self.bucket), &e)
            })?;

        let parts: Vec<ObsPart> = objects
            .into_iter()
            .filter(|o| self.object_name.as_deref().is_none_or(|name| o.key == name))
            .map(|o| ObsPart::new(Arc::clone(&self.client), &self.bucket, o))
            .collect();

        if parts.is_empty() {
            return Err(TransferError::NotFound(format!(
                "no objects match {prefix:?} in bucket {}",
                self.bucket
            )));
        }
        debug!(bucket = %self.bucket, prefix, parts = parts.len(), "listed source objects");
        Ok(parts)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use bytes::Bytes;
    use edc_hw_obs_client::{MemoryObsClient, ObsOperation};
    use tokio::io::AsyncReadExt;

    use super::*;

    fn client_with(page_size: usize, keys: &[&str]) -> Arc<MemoryObsClient> {
        let client = Arc::new(MemoryObsClient::default().with_page_size(page_size));
        client.seed_bucket(
            "bucket",
            keys.iter()
                .map(|k| (*k, Bytes::copy_from_slice(k.as_bytes()))),
        );
        client
    }

    #[tokio::test]
    async fn test_should_list_every_object_across_pages_exactly_once() {
        let keys: Vec<String> = (0..10).map(|i| format!("data/{i:02}")).collect();
        let mut all: Vec<&str> = keys.iter().map(String::as_str).collect();
        all.push("other/x");
        let client = client_with(3, &all);

        let parts = ObsDataSource::new(client.clone(), "bucket", "data/")
            .open_part_stream()
            .await
            .expect("parts");

        let names: HashSet<_> = parts.iter().map(|p| p.name().to_owned()).collect();
        assert_eq!(parts.len(), 10);
        assert_eq!(names.len(), 10);
        assert!(names.iter().all(|n| n.starts_with("data/")));
        assert_eq!(client.call_count(ObsOperation::ListObjects), 4);
        assert_eq!(client.call_count(ObsOperation::GetObject), 0);
    }

    #[tokio::test]
    async fn test_should_open_fresh_stream_per_part() {
        let client = client_with(1000, &["a", "b"]);
        let parts = ObsDataSource::new(client.clone(), "bucket", "")
            .open_part_stream()
            .await
            .expect("parts");

        for part in &parts {
            let mut content = Vec::new();
            part.open_stream()
                .await
                .expect("open")
                .read_to_end(&mut content)
                .await
                .expect("read");
            assert_eq!(content, part.name().as_bytes());
            assert_eq!(part.size(), 1);
        }
        assert_eq!(client.call_count(ObsOperation::GetObject), 2);
    }

    #[tokio::test]
    async fn test_should_return_not_found_for_empty_listing() {
        let client = client_with(1000, &["a"]);
        let err = ObsDataSource::new(client, "bucket", "missing/")
            .open_part_stream()
            .await
            .expect_err("empty");
        assert!(matches!(err, TransferError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_should_return_not_found_for_missing_bucket() {
        let client = Arc::new(MemoryObsClient::default());
        let err = ObsDataSource::new(client, "nope", "")
            .open_part_stream()
            .await
            .expect_err("missing bucket");
        assert!(matches!(err, TransferError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_should_select_single_named_object() {
        let client = client_with(1000, &["data/a", "data/ab", "data/b"]);
        let parts = ObsDataSource::new(client, "bucket", "data/")
            .with_object_name("data/a")
            .open_part_stream()
            .await
            .expect("parts");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name(), "data/a");
    }
}
