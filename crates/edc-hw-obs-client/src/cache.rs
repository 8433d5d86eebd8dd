//! Per-endpoint client cache.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use edc_hw_auth::Credentials;
use edc_hw_core::HuaweiCloudConfig;
use edc_hw_obs_model::ObsResult;
use tracing::{debug, warn};

use crate::client::ObsClient;
use crate::rest::HttpObsClient;

/// Builds clients for an endpoint.
///
/// `credentials` is `None` when the connector's own credentials should be used.
pub trait ObsClientFactory: Send + Sync {
    /// Create a client for `endpoint`.
    fn create(
        &self,
        endpoint: &str,
        credentials: Option<&Credentials>,
    ) -> ObsResult<Arc<dyn ObsClient>>;
}

impl<F> ObsClientFactory for F
where
    F: Fn(&str, Option<&Credentials>) -> ObsResult<Arc<dyn ObsClient>> + Send + Sync,
{
    fn create(
        &self,
        endpoint: &str,
        credentials: Option<&Credentials>,
    ) -> ObsResult<Arc<dyn ObsClient>> {
        self(endpoint, credentials)
    }
}

/// Factory producing [`HttpObsClient`]s.
#[derive(Debug, Clone)]
pub struct HttpObsClientFactory {
    config: HuaweiCloudConfig,
}

impl HttpObsClientFactory {
    /// Create a factory using `config` for default credentials and timeouts.
    #[must_use]
    pub fn new(config: HuaweiCloudConfig) -> Self {
        Self { config }
    }
}

impl ObsClientFactory for HttpObsClientFactory {
    fn create(
        &self,
        endpoint: &str,
        credentials: Option<&Credentials>,
    ) -> ObsResult<Arc<dyn ObsClient>> {
        let credentials = credentials
            .cloned()
            .unwrap_or_else(|| Credentials::from_config(&self.config));
        Ok(Arc::new(HttpObsClient::new(endpoint, credentials, &self.config)?))
    }
}

/// Clients keyed by endpoint, built on first use.
///
/// At most one client per endpoint is kept, including under concurrent
/// `get_or_create` calls for the same endpoint.
pub struct ObsClientCache {
    clients: DashMap<String, Arc<dyn ObsClient>>,
    factory: Arc<dyn ObsClientFactory>,
}

impl fmt::Debug for ObsClientCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObsClientCache")
            .field("endpoints", &self.clients.len())
            .finish_non_exhaustive()
    }
}

impl ObsClientCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new(factory: Arc<dyn ObsClientFactory>) -> Self {
        Self {
            clients: DashMap::new(),
            factory,
        }
    }

    /// Cache of HTTP clients using the connector's configured credentials.
    #[must_use]
    pub fn http(config: HuaweiCloudConfig) -> Self {
        Self::new(Arc::new(HttpObsClientFactory::new(config)))
    }

    /// The cached client for `endpoint`, creating it if absent.
    pub fn get_or_create(&self, endpoint: &str) -> ObsResult<Arc<dyn ObsClient>> {
        if let Some(client) = self.clients.get(endpoint) {
            return Ok(Arc::clone(client.value()));
        }

        let entry = self.clients.entry(endpoint.to_owned());
        // Holding the shard lock makes creation single-flight per endpoint.
        let client = match entry {
            Entry::Occupied(occupied) => Arc::clone(occupied.get()),
            Entry::Vacant(vacant) => {
                debug!(endpoint, "creating OBS client");
                let client = self.factory.create(endpoint, None)?;
                Arc::clone(vacant.insert(client).value())
            }
        };
        Ok(client)
    }

    /// An uncached client for `endpoint` signing with `credentials`.
    pub fn with_credentials(
        &self,
        endpoint: &str,
        credentials: &Credentials,
    ) -> ObsResult<Arc<dyn ObsClient>> {
        self.factory.create(endpoint, Some(credentials))
    }

    /// Number of cached clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no client is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Close every cached client and empty the cache.
    ///
    /// Close failures are logged; the remaining clients are still closed.
    pub async fn shutdown(&self) {
        let clients: Vec<(String, Arc<dyn ObsClient>)> = self
            .clients
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();
        self.clients.clear();

        for (endpoint, client) in clients {
            if let Err(e) = client.close().await {
                warn!(endpoint = %endpoint, error = %e, "failed to close OBS client");
            }
        }
    }
}
