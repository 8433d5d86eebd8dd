//! Bucket provisioning and deprovisioning.

use std::sync::Arc;

use async_trait::async_trait;
use edc_hw_core::utils::secret_key_reference;
use edc_hw_core::validation::validate_bucket_name;
use edc_hw_core::{BucketResourceDescriptor, HuaweiCloudConfig, ProvisionedBucket};
use edc_hw_iam::{CredentialBroker, IamError};
use edc_hw_obs_client::{ObsClient, ObsClientCache};
use edc_hw_obs_model::{MAX_DELETE_BATCH, ObsError, ObsErrorCode};
use edc_hw_secrets::SecretStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ProvisionError, ProvisionResult};
use crate::retry::RetryPolicy;

/// Outcome of a successful deprovision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprovisionedBucket {
    /// Id of the resource that was torn down.
    pub provisioned_resource_id: String,
    /// Number of objects deleted before the bucket.
    pub objects_deleted: usize,
    /// Whether a stored credential was removed.
    pub secret_deleted: bool,
}

/// Allocates and releases the storage backing a transfer.
#[async_trait]
pub trait ResourceProvisioner: Send + Sync {
    /// Create the bucket and its temporary credential.
    async fn provision(
        &self,
        descriptor: &BucketResourceDescriptor,
    ) -> ProvisionResult<ProvisionedBucket>;

    /// Delete every object, then the bucket, then the stored credential.
    async fn deprovision(&self, resource: &ProvisionedBucket)
    -> ProvisionResult<DeprovisionedBucket>;
}

/// [`ResourceProvisioner`] for OBS buckets.
#[derive(Debug)]
pub struct ObsProvisioner {
    clients: Arc<ObsClientCache>,
    broker: CredentialBroker,
    secrets: Arc<dyn SecretStore>,
    retry: RetryPolicy,
    token_duration_seconds: u32,
    delete_secret_on_deprovision: bool,
}

impl ObsProvisioner {
    /// Create a provisioner with the retry and token settings of `config`.
    #[must_use]
    pub fn new(
        clients: Arc<ObsClientCache>,
        broker: CredentialBroker,
        secrets: Arc<dyn SecretStore>,
        config: &HuaweiCloudConfig,
    ) -> Self {
        Self {
            clients,
            broker,
            secrets,
            retry: RetryPolicy::from_config(config),
            token_duration_seconds: config.token_duration_seconds,
            delete_secret_on_deprovision: config.delete_secret_on_deprovision,
        }
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn client(&self, endpoint: &str, bucket: &str) -> ProvisionResult<Arc<dyn ObsClient>> {
        self.clients
            .get_or_create(endpoint)
            .map_err(|e| ProvisionError::obs("resolve client", bucket, e))
    }

    async fn list_keys(&self, client: &dyn ObsClient, bucket: &str) -> ProvisionResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let page = self
                .retry
                .run(
                    "list objects",
                    || client.list_objects(bucket, "", marker.as_deref()),
                    ObsError::is_retryable,
                )
                .await
                .map_err(|e| ProvisionError::obs("list objects", bucket, e))?;

            let next = page.continuation_marker();
            keys.extend(page.objects.into_iter().map(|o| o.key));
            match next {
                None => return Ok(keys),
                Some(m) if marker.as_deref() == Some(m.as_str()) => {
                    return Err(ProvisionError::obs(
                        "list objects",
                        bucket,
                        ObsError::InvalidResponse(format!("listing did not advance past {m}")),
                    ));
                }
                Some(m) => marker = Some(m),
            }
        }
    }
}

/// Every violation in a descriptor, empty when it is usable.
fn descriptor_violations(descriptor: &BucketResourceDescriptor) -> Vec<String> {
    let mut violations = Vec::new();
    if descriptor.bucket_name().is_empty() {
        violations.push("bucketName must not be empty".to_owned());
    } else if let Err(e) = validate_bucket_name(descriptor.bucket_name()) {
        violations.push(e.to_string());
    }
    if descriptor.endpoint().trim().is_empty() {
        violations.push("endpoint must not be empty".to_owned());
    }
    if descriptor.id().is_empty() {
        violations.push("id must not be empty".to_owned());
    }
    violations
}

#[async_trait]
impl ResourceProvisioner for ObsProvisioner {
    async fn provision(
        &self,
        descriptor: &BucketResourceDescriptor,
    ) -> ProvisionResult<ProvisionedBucket> {
        let violations = descriptor_violations(descriptor);
        if !violations.is_empty() {
            return Err(ProvisionError::Validation(violations));
        }

        let bucket = descriptor.bucket_name();
        let client = self.client(descriptor.endpoint(), bucket)?;
        info!(
            bucket,
            endpoint = descriptor.endpoint(),
            resource_id = descriptor.id(),
            "provisioning bucket"
        );

        match self
            .retry
            .run(
                "create bucket",
                || client.create_bucket(bucket),
                ObsError::is_retryable,
            )
            .await
        {
            Ok(()) => debug!(bucket, "bucket created"),
            Err(e) if e.code() == Some(&ObsErrorCode::BucketAlreadyOwnedByYou) => {
                debug!(bucket, "bucket already owned by this account");
            }
            Err(e) => return Err(ProvisionError::obs("create bucket", bucket, e)),
        }

        let credential = self
            .retry
            .run(
                "issue credential",
                || {
                    self.broker
                        .issue_temporary_credential(bucket, self.token_duration_seconds)
                },
                IamError::is_retryable,
            )
            .await?;

        let secret_ref = secret_key_reference(descriptor.id());
        self.secrets
            .store(&secret_ref, &credential.to_json()?)
            .await?;

        info!(bucket, resource_id = descriptor.id(), "bucket provisioned");
        Ok(ProvisionedBucket::new(descriptor.clone(), secret_ref))
    }

    async fn deprovision(
        &self,
        resource: &ProvisionedBucket,
    ) -> ProvisionResult<DeprovisionedBucket> {
        let bucket = resource.bucket_name();
        let client = self.client(resource.endpoint(), bucket)?;
        info!(bucket, resource_id = resource.id(), "deprovisioning bucket");

        let keys = self.list_keys(client.as_ref(), bucket).await?;
        let mut objects_deleted = 0;
        for batch in keys.chunks(MAX_DELETE_BATCH) {
            let result = self
                .retry
                .run(
                    "delete objects",
                    || client.delete_objects(bucket, batch),
                    ObsError::is_retryable,
                )
                .await
                .map_err(|e| ProvisionError::obs("delete objects", bucket, e))?;

            if let Some(first) = result.errors.first() {
                return Err(ProvisionError::ObjectsRemaining {
                    bucket: bucket.to_owned(),
                    count: result.errors.len(),
                    key: first.key.clone(),
                    code: first.code.clone(),
                    message: first.message.clone(),
                });
            }
            objects_deleted += batch.len();
            debug!(bucket, deleted = objects_deleted, total = keys.len(), "deleted objects");
        }

        self.retry
            .run(
                "delete bucket",
                || client.delete_bucket(bucket),
                ObsError::is_retryable,
            )
            .await
            .map_err(|e| ProvisionError::obs("delete bucket", bucket, e))?;

        let secret_deleted = if self.delete_secret_on_deprovision {
            let removed = self.secrets.delete(&resource.secret_key_reference).await?;
            if !removed {
                warn!(bucket, "stored credential was already gone");
            }
            removed
        } else {
            false
        };

        info!(bucket, objects_deleted, "bucket deprovisioned");
        Ok(DeprovisionedBucket {
            provisioned_resource_id: resource.id().to_owned(),
            objects_deleted,
            secret_deleted,
        })
    }
}
