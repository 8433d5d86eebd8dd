//! Provisioning integration tests.
//!
//! The identity service is replaced by a static client; the object store is
//! the real server.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use edc_hw_core::utils::now_epoch_millis;
    use edc_hw_core::{BucketResourceDescriptor, TemporaryCredential};
    use edc_hw_iam::{CredentialBroker, StaticIdentityClient};
    use edc_hw_obs_client::ObsClientCache;
    use edc_hw_provision::{ObsProvisioner, ResourceProvisioner};
    use edc_hw_secrets::{InMemorySecretStore, SecretStore};

    use crate::{endpoint_url, obs_client, s3_client, test_bucket_name, test_config};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_provision_and_deprovision_bucket() {
        let config = test_config();
        let s3 = s3_client();
        let secrets = Arc::new(InMemorySecretStore::new());
        let broker = CredentialBroker::new(
            Arc::new(StaticIdentityClient::new(TemporaryCredential {
                access_key: "tmp-ak".into(),
                secret_key: "tmp-sk".into(),
                security_token: "tmp-token".into(),
                expires_at_epoch_millis: now_epoch_millis() + 3_600_000,
            })),
            config.token_duration_seconds,
        );
        let clients = Arc::new(ObsClientCache::http(config.clone()));
        let provisioner = ObsProvisioner::new(
            Arc::clone(&clients),
            broker,
            Arc::clone(&secrets) as Arc<dyn SecretStore>,
            &config,
        );

        let bucket = test_bucket_name("provision");
        let descriptor = BucketResourceDescriptor::builder()
            .id("resource-1")
            .transfer_process_id("tp-1")
            .bucket_name(bucket.as_str())
            .endpoint(endpoint_url())
            .build();

        let provisioned = provisioner.provision(&descriptor).await.expect("provision");
        s3.head_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect("bucket created");
        let stored = secrets
            .resolve(&provisioned.secret_key_reference)
            .await
            .expect("resolve")
            .expect("secret stored");
        assert_eq!(
            TemporaryCredential::from_json(&stored)
                .expect("json")
                .access_key,
            "tmp-ak"
        );

        let client = obs_client();
        for i in 0..3 {
            client
                .put_object(&bucket, &format!("obj-{i}"), Bytes::from_static(b"x"))
                .await
                .expect("put");
        }

        let result = provisioner
            .deprovision(&provisioned)
            .await
            .expect("deprovision");
        assert_eq!(result.objects_deleted, 3);
        assert!(result.secret_deleted);
        assert!(s3.head_bucket().bucket(&bucket).send().await.is_err());
        assert!(secrets.is_empty());

        clients.shutdown().await;
    }
}
