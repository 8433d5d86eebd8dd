//! Object-store client integration tests.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use edc_hw_obs_model::ErrorReason;
    use tokio::io::AsyncReadExt;

    use crate::{cleanup_bucket, create_test_bucket, obs_client, s3_client, test_bucket_name};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_and_delete_bucket() {
        let client = obs_client();
        let s3 = s3_client();
        let bucket = test_bucket_name("create");

        client.create_bucket(&bucket).await.expect("create");
        s3.head_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect("bucket visible");

        client.delete_bucket(&bucket).await.expect("delete");
        assert!(s3.head_bucket().bucket(&bucket).send().await.is_err());
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_put_and_get_object() {
        let client = obs_client();
        let s3 = s3_client();
        let bucket = create_test_bucket(&s3, "object").await;

        client
            .put_object(&bucket, "dir/hello.txt", Bytes::from_static(b"hello"))
            .await
            .expect("put");

        let mut body = client
            .get_object(&bucket, "dir/hello.txt")
            .await
            .expect("get");
        let mut content = Vec::new();
        body.stream
            .read_to_end(&mut content)
            .await
            .expect("read");
        assert_eq!(content, b"hello");
        assert_eq!(body.content_length, Some(5));

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_map_missing_object_to_not_found() {
        let client = obs_client();
        let s3 = s3_client();
        let bucket = create_test_bucket(&s3, "missing").await;

        let err = client
            .get_object(&bucket, "nope")
            .await
            .err()
            .expect("missing object");
        assert_eq!(err.reason(), ErrorReason::NotFound);

        cleanup_bucket(&s3, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_all_objects_and_batch_delete() {
        let client = obs_client();
        let s3 = s3_client();
        let bucket = create_test_bucket(&s3, "list").await;

        for i in 0..25 {
            client
                .put_object(&bucket, &format!("p/{i:03}"), Bytes::from_static(b"x"))
                .await
                .expect("put");
        }
        client
            .put_object(&bucket, "other", Bytes::from_static(b"y"))
            .await
            .expect("put");

        let listed = client.list_all_objects(&bucket, "p/").await.expect("list");
        assert_eq!(listed.len(), 25);

        let keys: Vec<String> = listed.into_iter().map(|o| o.key).collect();
        let result = client.delete_objects(&bucket, &keys).await.expect("delete");
        assert!(result.errors.is_empty(), "{:?}", result.errors);

        let remaining = s3
            .list_objects_v2()
            .bucket(&bucket)
            .send()
            .await
            .expect("list");
        assert_eq!(remaining.key_count(), Some(1));

        cleanup_bucket(&s3, &bucket).await;
    }
}
