//! Secret store errors.

use std::path::PathBuf;

/// Errors returned by secret stores.
#[derive(Debug, thiserror::Error)]
pub enum SecretStoreError {
    /// The backing file could not be read or written.
    #[error("secret file {path}: {source}")]
    Io {
        /// Backing file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not a JSON object of strings.
    #[error("secret file {path} is corrupt: {source}")]
    Corrupt {
        /// Backing file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Secret keys must be non-empty.
    #[error("secret key must not be empty")]
    EmptyKey,
}

/// Convenience result type for secret stores.
pub type SecretStoreResult<T> = Result<T, SecretStoreError>;
