//! Sink and source integration tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use edc_hw_transfer::{BytesPart, ObsDataSink, ObsDataSource, Part};
    use tokio::io::AsyncReadExt;

    use crate::{cleanup_bucket, create_test_bucket, obs_client, s3_client};

    const CHUNK: usize = 4096;

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_upload_in_chunks_and_read_back() {
        let client = obs_client();
        let s3 = s3_client();
        let bucket = create_test_bucket(&s3, "sink").await;

        let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let sink = ObsDataSink::new(Arc::clone(&client), bucket.as_str(), "in/", CHUNK);
        let summary = sink
            .transfer_parts(vec![
                Box::new(BytesPart::new("data.bin", payload.clone())) as Box<dyn Part>,
                Box::new(BytesPart::new("empty.bin", Bytes::new())),
            ])
            .await
            .expect("transfer");
        assert_eq!(summary.objects[0].part_count, 3);
        assert_eq!(summary.objects[1].part_count, 1);
        assert_eq!(summary.bytes_transferred, 10_000);

        let stored = s3
            .get_object()
            .bucket(&bucket)
            .key("in/data.bin")
            .send()
            .await
            .expect("get")
            .body
            .collect()
            .await
            .expect("body")
            .into_bytes();
        assert_eq!(stored.as_ref(), payload.as_slice());

        let empty = s3
            .head_object()
            .bucket(&bucket)
            .key("in/empty.bin")
            .send()
            .await
            .expect("head");
        assert_eq!(empty.content_length(), Some(0));

        let uploads = s3
            .list_multipart_uploads()
            .bucket(&bucket)
            .send()
            .await
            .expect("uploads");
        assert!(uploads.uploads().is_empty());

        let parts = ObsDataSource::new(Arc::clone(&client), bucket.as_str(), "in/")
            .open_part_stream()
            .await
            .expect("source");
        assert_eq!(parts.len(), 2);
        let data = parts
            .iter()
            .find(|p| p.name() == "in/data.bin")
            .expect("data part");
        let mut content = Vec::new();
        data.open_stream()
            .await
            .expect("open")
            .read_to_end(&mut content)
            .await
            .expect("read");
        assert_eq!(content, payload);

        cleanup_bucket(&s3, &bucket).await;
    }
}
