//! Source and sink construction from data addresses.

use std::sync::Arc;

use edc_hw_auth::Credentials;
use edc_hw_core::utils::now_epoch_millis;
use edc_hw_core::{DataAddress, TemporaryCredential};
use edc_hw_obs_client::{ObsClient, ObsClientCache};
use edc_hw_secrets::SecretStore;
use tracing::{debug, warn};

use crate::error::{StreamResult, TransferError};
use crate::sink::ObsDataSink;
use crate::source::ObsDataSource;
use crate::validator::{ObsDataAddressValidator, ValidationResult};

/// Client chosen for a data address.
struct ResolvedClient {
    client: Arc<dyn ObsClient>,
    /// Signed with a stored temporary credential rather than the connector's.
    temporary: bool,
}

/// Client for `address`: the stored temporary credential named by `keyName`
/// when there is one, otherwise the cached client with connector credentials.
async fn resolve_client(
    clients: &ObsClientCache,
    secrets: &dyn SecretStore,
    address: &DataAddress,
    endpoint: &str,
) -> StreamResult<ResolvedClient> {
    let stored = match address.key_name() {
        Some(key_name) => secrets
            .resolve(key_name)
            .await
            .map_err(|e| TransferError::General(format!("failed to resolve {key_name}: {e}")))?,
        None => None,
    };

    let Some(json) = stored else {
        let client = clients
            .get_or_create(endpoint)
            .map_err(|e| TransferError::General(format!("failed to create OBS client: {e}")))?;
        return Ok(ResolvedClient {
            client,
            temporary: false,
        });
    };

    let credential = TemporaryCredential::from_json(&json)
        .map_err(|e| TransferError::General(format!("stored credential is unreadable: {e}")))?;
    if credential.is_expired_at(now_epoch_millis()) {
        return Err(TransferError::NotAuthorized(format!(
            "temporary credential for {endpoint} has expired"
        )));
    }
    debug!(endpoint, "using stored temporary credential");
    let client = clients
        .with_credentials(endpoint, &Credentials::from(&credential))
        .map_err(|e| TransferError::General(format!("failed to create OBS client: {e}")))?;
    Ok(ResolvedClient {
        client,
        temporary: true,
    })
}

fn require_valid(validation: &ValidationResult) -> StreamResult<()> {
    if validation.is_valid() {
        Ok(())
    } else {
        Err(TransferError::General(format!(
            "invalid OBS data address: {validation}"
        )))
    }
}

/// Builds [`ObsDataSink`]s for destination addresses.
#[derive(Debug, Clone)]
pub struct ObsDataSinkFactory {
    clients: Arc<ObsClientCache>,
    secrets: Arc<dyn SecretStore>,
    chunk_size: usize,
}

impl ObsDataSinkFactory {
    /// Create a factory producing sinks that upload in `chunk_size` byte parts.
    #[must_use]
    pub fn new(
        clients: Arc<ObsClientCache>,
        secrets: Arc<dyn SecretStore>,
        chunk_size: usize,
    ) -> Self {
        Self {
            clients,
            secrets,
            chunk_size,
        }
    }

    /// Validate a destination address.
    #[must_use]
    pub fn validate(&self, destination: &DataAddress) -> ValidationResult {
        ObsDataAddressValidator.validate(destination)
    }

    /// Sink for a valid destination address.
    ///
    /// A sink signing with a stored temporary credential aborts failed uploads
    /// with the connector's cached client, since the credential only grants
    /// `PutObject`.
    pub async fn create(&self, destination: &DataAddress) -> StreamResult<ObsDataSink> {
        require_valid(&self.validate(destination))?;
        let (Some(bucket), Some(endpoint)) = (destination.bucket_name(), destination.endpoint())
        else {
            return Err(TransferError::General("invalid OBS data address".to_owned()));
        };
        let resolved =
            resolve_client(&self.clients, self.secrets.as_ref(), destination, endpoint).await?;
        let sink = ObsDataSink::new(
            resolved.client,
            bucket,
            destination.key_prefix(),
            self.chunk_size,
        );
        if !resolved.temporary {
            return Ok(sink);
        }
        match self.clients.get_or_create(endpoint) {
            Ok(connector) => Ok(sink.with_abort_client(connector)),
            Err(e) => {
                warn!(endpoint, error = %e, "no connector client for aborting uploads");
                Ok(sink)
            }
        }
    }
}

/// Builds [`ObsDataSource`]s for source addresses.
#[derive(Debug, Clone)]
pub struct ObsDataSourceFactory {
    clients: Arc<ObsClientCache>,
    secrets: Arc<dyn SecretStore>,
}

impl ObsDataSourceFactory {
    /// Create a factory.
    #[must_use]
    pub fn new(clients: Arc<ObsClientCache>, secrets: Arc<dyn SecretStore>) -> Self {
        Self { clients, secrets }
    }

    /// Validate a source address.
    #[must_use]
    pub fn validate(&self, source: &DataAddress) -> ValidationResult {
        ObsDataAddressValidator.validate(source)
    }

    /// Source for a valid source address.
    pub async fn create(&self, source: &DataAddress) -> StreamResult<ObsDataSource> {
        require_valid(&self.validate(source))?;
        let (Some(bucket), Some(endpoint)) = (source.bucket_name(), source.endpoint()) else {
            return Err(TransferError::General("invalid OBS data address".to_owned()));
        };
        let resolved =
            resolve_client(&self.clients, self.secrets.as_ref(), source, endpoint).await?;
        let data_source = ObsDataSource::new(resolved.client, bucket, source.key_prefix());
        Ok(match source.object_name() {
            Some(object_name) => data_source.with_object_name(object_name),
            None => data_source,
        })
    }
}
