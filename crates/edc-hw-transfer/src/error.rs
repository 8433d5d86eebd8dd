//! Transfer errors.

use edc_hw_obs_model::{ErrorReason, ObsError};

/// Failure of a source or sink operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// Nothing to read at the address.
    #[error("not found: {0}")]
    NotFound(String),

    /// The credentials were rejected or have expired.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// Any other failure.
    #[error("{0}")]
    General(String),
}

impl TransferError {
    /// Classify an OBS error, prefixing its message with `context`.
    pub(crate) fn from_obs(context: &str, error: &ObsError) -> Self {
        let message = format!("{context}: {error}");
        match error.reason() {
            ErrorReason::NotFound => Self::NotFound(message),
            ErrorReason::AccessDenied => Self::NotAuthorized(message),
            ErrorReason::AlreadyExists | ErrorReason::Other => Self::General(message),
        }
    }
}

/// Convenience result type for transfers.
pub type StreamResult<T> = Result<T, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_classify_obs_errors() {
        assert!(matches!(
            TransferError::from_obs("list", &ObsError::service(404, "NoSuchBucket", "gone")),
            TransferError::NotFound(m) if m.starts_with("list: ")
        ));
        assert!(matches!(
            TransferError::from_obs("get", &ObsError::service(403, "AccessDenied", "no")),
            TransferError::NotAuthorized(_)
        ));
        assert!(matches!(
            TransferError::from_obs("get", &ObsError::Transport("reset".into())),
            TransferError::General(_)
        ));
    }
}
