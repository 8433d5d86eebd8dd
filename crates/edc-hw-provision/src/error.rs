//! Provisioning errors.

use edc_hw_core::CoreError;
use edc_hw_iam::IamError;
use edc_hw_obs_model::ObsError;
use edc_hw_secrets::SecretStoreError;

/// Errors returned by provisioning and deprovisioning.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// The descriptor or address is unusable. Raised before any remote call.
    #[error("invalid resource: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// An OBS step failed after retries.
    #[error("{operation} failed for bucket {bucket}: {source}")]
    Obs {
        /// Step that failed.
        operation: &'static str,
        /// Bucket being (de)provisioned.
        bucket: String,
        /// Last error returned by OBS.
        #[source]
        source: ObsError,
    },

    /// OBS accepted a batch delete but kept some of the objects.
    #[error("{count} objects could not be deleted from bucket {bucket}, first {key}: {code} {message}")]
    ObjectsRemaining {
        /// Bucket being deprovisioned.
        bucket: String,
        /// Number of keys reported as failed.
        count: usize,
        /// First failed key.
        key: String,
        /// Error code of the first failure.
        code: String,
        /// Error message of the first failure.
        message: String,
    },

    /// Credential issuance failed after retries.
    #[error("failed to issue temporary credential: {0}")]
    Iam(#[from] IamError),

    /// The secret store failed.
    #[error("secret store error: {0}")]
    Secret(#[from] SecretStoreError),

    /// The credential could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] CoreError),
}

impl ProvisionError {
    pub(crate) fn obs(operation: &'static str, bucket: &str, source: ObsError) -> Self {
        Self::Obs {
            operation,
            bucket: bucket.to_owned(),
            source,
        }
    }
}

/// Convenience result type for provisioning.
pub type ProvisionResult<T> = Result<T, ProvisionError>;
