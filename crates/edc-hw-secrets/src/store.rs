//! The [`SecretStore`] trait.

use std::fmt;

use async_trait::async_trait;

use crate::error::SecretStoreResult;

/// Key-value store for sensitive strings.
#[async_trait]
pub trait SecretStore: Send + Sync + fmt::Debug {
    /// The value stored under `key`, if any.
    async fn resolve(&self, key: &str) -> SecretStoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn store(&self, key: &str, value: &str) -> SecretStoreResult<()>;

    /// Remove `key`. Returns whether it was present.
    async fn delete(&self, key: &str) -> SecretStoreResult<bool>;
}
