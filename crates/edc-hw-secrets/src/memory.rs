//! In-memory secret store.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{SecretStoreError, SecretStoreResult};
use crate::store::SecretStore;

/// Secrets held in a concurrent map for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: DashMap<String, String>,
}

impl InMemorySecretStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored secrets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Stored keys, unordered.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.secrets.iter().map(|e| e.key().clone()).collect()
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn resolve(&self, key: &str) -> SecretStoreResult<Option<String>> {
        Ok(self.secrets.get(key).map(|v| v.value().clone()))
    }

    async fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        if key.is_empty() {
            return Err(SecretStoreError::EmptyKey);
        }
        self.secrets.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &str) -> SecretStoreResult<bool> {
        Ok(self.secrets.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use edc_hw_core::TemporaryCredential;

    use super::*;

    #[tokio::test]
    async fn test_should_store_resolve_and_delete() {
        let store = InMemorySecretStore::new();
        assert_eq!(store.resolve("k").await.expect("resolve"), None);

        store.store("k", "v1").await.expect("store");
        store.store("k", "v2").await.expect("store");
        assert_eq!(store.resolve("k").await.expect("resolve").as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);

        assert!(store.delete("k").await.expect("delete"));
        assert!(!store.delete("k").await.expect("delete"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_empty_key() {
        let store = InMemorySecretStore::new();
        assert!(matches!(
            store.store("", "v").await,
            Err(SecretStoreError::EmptyKey)
        ));
    }

    #[tokio::test]
    async fn test_should_round_trip_credential_through_store() {
        let credential = TemporaryCredential {
            access_key: "ak".into(),
            secret_key: "sk".into(),
            security_token: "token".into(),
            expires_at_epoch_millis: 1_704_164_645_000,
        };
        let store = InMemorySecretStore::new();
        store
            .store("ref", &credential.to_json().expect("json"))
            .await
            .expect("store");

        let stored = store.resolve("ref").await.expect("resolve").expect("present");
        assert_eq!(TemporaryCredential::from_json(&stored).expect("parse"), credential);
    }
}
