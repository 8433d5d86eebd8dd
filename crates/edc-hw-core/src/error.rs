//! Error types for the core crate.

/// Core error type shared by the data model and configuration helpers.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The bucket name violates the OBS naming rules.
    #[error("invalid bucket name '{name}': {reason}")]
    InvalidBucketName {
        /// The rejected bucket name.
        name: String,
        /// Human-readable reason for the rejection.
        reason: String,
    },

    /// A credential or descriptor could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
