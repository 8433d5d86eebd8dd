//! Component wiring and command handlers.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use edc_hw_auth::Credentials;
use edc_hw_core::address::obs;
use edc_hw_core::utils::now_epoch_millis;
use edc_hw_core::{DataAddress, HuaweiCloudConfig, ProvisionedBucket, TemporaryCredential};
use edc_hw_gaussdb::{QuerySpec, SqlQueryStatement, Store, StoreStatements};
use edc_hw_iam::{CredentialBroker, HttpIamClient, IdentityClient, StaticIdentityClient};
use edc_hw_obs_client::{MemoryObsClient, ObsClient, ObsClientCache, ObsClientFactory, ObsResult};
use edc_hw_provision::{
    DeprovisionedBucket, ObsConsumerResourceGenerator, ObsProvisioner, ResourceProvisioner,
};
use edc_hw_secrets::{FileSecretStore, InMemorySecretStore, SecretStore};
use edc_hw_transfer::{
    FilePart, ObsDataSinkFactory, ObsDataSource, ObsDataSourceFactory, Part, TransferSummary,
};
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::cli::Target;

/// Lifetime of the stand-in credential issued in memory mode.
const MEMORY_CREDENTIAL_TTL_MS: i64 = 3_600_000;

/// Every long-lived component, built once per invocation.
#[derive(Debug)]
pub struct App {
    config: HuaweiCloudConfig,
    clients: Arc<ObsClientCache>,
    secrets: Arc<dyn SecretStore>,
    identity: Arc<dyn IdentityClient>,
}

impl App {
    /// Wire the components against Huawei Cloud.
    pub async fn connect(config: HuaweiCloudConfig, secrets_file: &Path) -> Result<Self> {
        let identity = HttpIamClient::new(&config).context("failed to create IAM client")?;
        let secrets = FileSecretStore::open(secrets_file)
            .await
            .with_context(|| format!("failed to open {}", secrets_file.display()))?;
        Ok(Self {
            clients: Arc::new(ObsClientCache::http(config.clone())),
            secrets: Arc::new(secrets),
            identity: Arc::new(identity),
            config,
        })
    }

    /// Wire the components against in-process fakes sharing one object store.
    #[must_use]
    pub fn in_memory(config: HuaweiCloudConfig, store: Arc<MemoryObsClient>) -> Self {
        let factory: Arc<dyn ObsClientFactory> = Arc::new(
            move |_: &str, _: Option<&Credentials>| -> ObsResult<Arc<dyn ObsClient>> {
                Ok(store.clone())
            },
        );
        let credential = TemporaryCredential {
            access_key: "memory-ak".to_owned(),
            secret_key: "memory-sk".to_owned(),
            security_token: "memory-token".to_owned(),
            expires_at_epoch_millis: now_epoch_millis() + MEMORY_CREDENTIAL_TTL_MS,
        };
        Self {
            clients: Arc::new(ObsClientCache::new(factory)),
            secrets: Arc::new(InMemorySecretStore::new()),
            identity: Arc::new(StaticIdentityClient::new(credential)),
            config,
        }
    }

    fn provisioner(&self) -> ObsProvisioner {
        let broker = CredentialBroker::new(
            Arc::clone(&self.identity),
            self.config.token_duration_seconds,
        );
        ObsProvisioner::new(
            Arc::clone(&self.clients),
            broker,
            Arc::clone(&self.secrets),
            &self.config,
        )
    }

    fn address(&self, target: &Target) -> DataAddress {
        let mut address = DataAddress::obs(
            target.bucket.as_str(),
            target.endpoint.as_deref().unwrap_or(&self.config.obs_endpoint),
        );
        if !target.key_prefix.is_empty() {
            address.set_property(obs::KEY_PREFIX, target.key_prefix.as_str());
        }
        if let Some(key_name) = &target.key_name {
            address.set_property(obs::KEY_NAME, key_name.as_str());
        }
        address
    }

    /// Create and credential a bucket.
    pub async fn provision(
        &self,
        bucket: &str,
        endpoint: Option<&str>,
        key_prefix: Option<&str>,
        transfer_process_id: &str,
    ) -> Result<ProvisionedBucket> {
        let mut destination = DataAddress::new(obs::TYPE).with_property(obs::BUCKET_NAME, bucket);
        if let Some(endpoint) = endpoint {
            destination.set_property(obs::ENDPOINT, endpoint);
        }
        if let Some(prefix) = key_prefix {
            destination.set_property(obs::KEY_PREFIX, prefix);
        }

        let descriptor = ObsConsumerResourceGenerator::new(self.config.obs_endpoint.as_str())
            .generate(transfer_process_id, &destination)
            .context("invalid destination")?;
        let provisioned = self
            .provisioner()
            .provision(&descriptor)
            .await
            .with_context(|| format!("failed to provision bucket {bucket}"))?;
        info!(
            bucket,
            endpoint = descriptor.endpoint(),
            secret = %provisioned.secret_key_reference,
            "provisioned bucket"
        );
        Ok(provisioned)
    }

    /// Tear down a provisioned bucket.
    pub async fn deprovision(&self, resource: &ProvisionedBucket) -> Result<DeprovisionedBucket> {
        let bucket = resource.descriptor.bucket_name();
        let result = self
            .provisioner()
            .deprovision(resource)
            .await
            .with_context(|| format!("failed to deprovision bucket {bucket}"))?;
        info!(
            bucket,
            objects_deleted = result.objects_deleted,
            "deprovisioned bucket"
        );
        Ok(result)
    }

    /// Upload local files.
    pub async fn upload(&self, target: &Target, files: &[PathBuf]) -> Result<TransferSummary> {
        let address = self.address(target);
        let factory = ObsDataSinkFactory::new(
            Arc::clone(&self.clients),
            Arc::clone(&self.secrets),
            self.config.chunk_size_bytes(),
        );
        let sink = factory.create(&address).await?;

        let mut parts: Vec<Box<dyn Part>> = Vec::with_capacity(files.len());
        for file in files {
            parts.push(Box::new(FilePart::from_path(file).await?));
        }
        Ok(sink.transfer_parts(parts).await?)
    }

    /// Names and sizes of the objects at `target`.
    pub async fn list(&self, target: &Target) -> Result<Vec<(String, u64)>> {
        let source = self.source(target, None).await?;
        let parts = source.open_part_stream().await?;
        Ok(parts
            .iter()
            .map(|p| (p.name().to_owned(), p.size()))
            .collect())
    }

    /// Download the objects at `target` below `output`, keeping their key paths.
    pub async fn download(
        &self,
        target: &Target,
        object_name: Option<&str>,
        output: &Path,
    ) -> Result<Vec<PathBuf>> {
        let source = self.source(target, object_name).await?;
        let mut written = Vec::new();
        for part in source.open_part_stream().await? {
            let path = output.join(local_path(part.name())?);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let mut stream = part.open_stream().await?;
            let mut file = tokio::fs::File::create(&path)
                .await
                .with_context(|| format!("failed to create {}", path.display()))?;
            let bytes = tokio::io::copy(&mut stream, &mut file)
                .await
                .with_context(|| format!("failed to download {}", part.name()))?;
            file.flush().await?;
            info!(key = part.name(), path = %path.display(), bytes, "downloaded object");
            written.push(path);
        }
        Ok(written)
    }

    async fn source(
        &self,
        target: &Target,
        object_name: Option<&str>,
    ) -> Result<ObsDataSource> {
        let mut address = self.address(target);
        if let Some(name) = object_name {
            address.set_property(obs::OBJECT_NAME, name);
        }
        let factory =
            ObsDataSourceFactory::new(Arc::clone(&self.clients), Arc::clone(&self.secrets));
        Ok(factory.create(&address).await?)
    }

    /// Close every cached client.
    pub async fn shutdown(&self) {
        self.clients.shutdown().await;
    }
}

/// Translate a store query given as JSON.
pub fn sql(store: Store, query: &str) -> Result<SqlQueryStatement> {
    let query: QuerySpec = serde_json::from_str(query).context("query is not valid JSON")?;
    Ok(StoreStatements::new(store).create_query(&query)?)
}

/// Relative local path for an object key. Keys escaping the output directory
/// are rejected.
fn local_path(key: &str) -> Result<PathBuf> {
    let path = Path::new(key);
    let mut local = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => local.push(part),
            Component::CurDir => {}
            _ => bail!("object key {key:?} is not a safe relative path"),
        }
    }
    if local.as_os_str().is_empty() {
        bail!("object key {key:?} has no file name");
    }
    Ok(local)
}
