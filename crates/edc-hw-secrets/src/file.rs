//! File-backed secret store.
//!
//! Secrets are kept as one JSON object. Every change rewrites the whole file
//! through a sibling temporary file and a rename, so readers never observe a
//! partially written document.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{SecretStoreError, SecretStoreResult};
use crate::store::SecretStore;

/// Secrets persisted in a JSON file.
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
    secrets: Mutex<BTreeMap<String, String>>,
}

impl FileSecretStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> SecretStoreResult<Self> {
        let path = path.into();
        let secrets = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| {
                SecretStoreError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(SecretStoreError::Io { path, source }),
        };
        debug!(path = %path.display(), secrets = secrets.len(), "opened secret file");
        Ok(Self {
            path,
            secrets: Mutex::new(secrets),
        })
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, secrets: &BTreeMap<String, String>) -> SecretStoreResult<()> {
        let io_err = |source| SecretStoreError::Io {
            path: self.path.clone(),
            source,
        };
        let json = serde_json::to_vec_pretty(secrets).map_err(|source| SecretStoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&tmp, json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn resolve(&self, key: &str) -> SecretStoreResult<Option<String>> {
        Ok(self.secrets.lock().await.get(key).cloned())
    }

    async fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        if key.is_empty() {
            return Err(SecretStoreError::EmptyKey);
        }
        let mut secrets = self.secrets.lock().await;
        let previous = secrets.insert(key.to_owned(), value.to_owned());
        if let Err(e) = self.persist(&secrets).await {
            match previous {
                Some(previous) => secrets.insert(key.to_owned(), previous),
                None => secrets.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> SecretStoreResult<bool> {
        let mut secrets = self.secrets.lock().await;
        let Some(previous) = secrets.remove(key) else {
            return Ok(false);
        };
        if let Err(e) = self.persist(&secrets).await {
            secrets.insert(key.to_owned(), previous);
            return Err(e);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_should_persist_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("secrets.json");

        let store = FileSecretStore::open(&path).await.expect("open");
        store.store("a", "1").await.expect("store");
        store.store("b", "2").await.expect("store");
        assert!(store.delete("a").await.expect("delete"));
        drop(store);

        let reopened = FileSecretStore::open(&path).await.expect("reopen");
        assert_eq!(reopened.resolve("a").await.expect("resolve"), None);
        assert_eq!(reopened.resolve("b").await.expect("resolve").as_deref(), Some("2"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_should_start_empty_when_file_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSecretStore::open(dir.path().join("nested/secrets.json"))
            .await
            .expect("open");
        assert_eq!(store.resolve("x").await.expect("resolve"), None);
        store.store("x", "y").await.expect("store creates parent dirs");
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_should_reject_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("secrets.json");
        tokio::fs::write(&path, b"[1, 2]").await.expect("write");
        assert!(matches!(
            FileSecretStore::open(&path).await,
            Err(SecretStoreError::Corrupt { .. })
        ));
    }
}
