//! IAM error type.

/// Errors returned by the identity client and the credential broker.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IamError {
    /// IAM rejected the request.
    #[error("IAM request failed with status {status}: {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// `error_code` from the response body, if any.
        code: Option<String>,
        /// Error message from the response body.
        message: String,
    },

    /// The request never produced a response.
    #[error("IAM transport error: {0}")]
    Transport(String),

    /// The response could not be understood.
    #[error("invalid IAM response: {0}")]
    InvalidResponse(String),

    /// The requested token lifetime is outside what IAM accepts.
    #[error("token duration {duration}s is outside {min}..={max}s")]
    InvalidDuration {
        /// Requested duration in seconds.
        duration: u32,
        /// Minimum accepted duration.
        min: u32,
        /// Maximum accepted duration.
        max: u32,
    },
}

impl IamError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Service { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidResponse(_) | Self::InvalidDuration { .. } => false,
        }
    }
}

/// Convenience result type for IAM operations.
pub type IamResult<T> = Result<T, IamError>;
