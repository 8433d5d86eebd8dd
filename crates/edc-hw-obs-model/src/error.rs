//! OBS error codes and error type.

use std::fmt;

/// Well-known OBS error codes.
///
/// OBS reports the S3 error vocabulary in its `<Error><Code>` element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ObsErrorCode {
    /// AccessDenied error.
    AccessDenied,
    /// BucketAlreadyExists error.
    BucketAlreadyExists,
    /// BucketAlreadyOwnedByYou error.
    BucketAlreadyOwnedByYou,
    /// BucketNotEmpty error.
    BucketNotEmpty,
    /// InternalError error.
    InternalError,
    /// InvalidAccessKeyId error.
    InvalidAccessKeyId,
    /// InvalidBucketName error.
    InvalidBucketName,
    /// InvalidPart error.
    InvalidPart,
    /// NoSuchBucket error.
    NoSuchBucket,
    /// NoSuchKey error.
    NoSuchKey,
    /// NoSuchUpload error.
    NoSuchUpload,
    /// RequestTimeout error.
    RequestTimeout,
    /// ServiceUnavailable error.
    ServiceUnavailable,
    /// SignatureDoesNotMatch error.
    SignatureDoesNotMatch,
    /// SlowDown error.
    SlowDown,
    /// Any other code.
    Other(String),
}

impl ObsErrorCode {
    /// Parse an error code string.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "AccessDenied" => Self::AccessDenied,
            "BucketAlreadyExists" => Self::BucketAlreadyExists,
            "BucketAlreadyOwnedByYou" => Self::BucketAlreadyOwnedByYou,
            "BucketNotEmpty" => Self::BucketNotEmpty,
            "InternalError" => Self::InternalError,
            "InvalidAccessKeyId" => Self::InvalidAccessKeyId,
            "InvalidBucketName" => Self::InvalidBucketName,
            "InvalidPart" => Self::InvalidPart,
            "NoSuchBucket" => Self::NoSuchBucket,
            "NoSuchKey" => Self::NoSuchKey,
            "NoSuchUpload" => Self::NoSuchUpload,
            "RequestTimeout" => Self::RequestTimeout,
            "ServiceUnavailable" => Self::ServiceUnavailable,
            "SignatureDoesNotMatch" => Self::SignatureDoesNotMatch,
            "SlowDown" => Self::SlowDown,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns the error code as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::AccessDenied => "AccessDenied",
            Self::BucketAlreadyExists => "BucketAlreadyExists",
            Self::BucketAlreadyOwnedByYou => "BucketAlreadyOwnedByYou",
            Self::BucketNotEmpty => "BucketNotEmpty",
            Self::InternalError => "InternalError",
            Self::InvalidAccessKeyId => "InvalidAccessKeyId",
            Self::InvalidBucketName => "InvalidBucketName",
            Self::InvalidPart => "InvalidPart",
            Self::NoSuchBucket => "NoSuchBucket",
            Self::NoSuchKey => "NoSuchKey",
            Self::NoSuchUpload => "NoSuchUpload",
            Self::RequestTimeout => "RequestTimeout",
            Self::ServiceUnavailable => "ServiceUnavailable",
            Self::SignatureDoesNotMatch => "SignatureDoesNotMatch",
            Self::SlowDown => "SlowDown",
            Self::Other(s) => s,
        }
    }

    /// Default code for a bodiless error response with the given status.
    #[must_use]
    pub fn from_status(status: http::StatusCode) -> Self {
        match status {
            http::StatusCode::FORBIDDEN => Self::AccessDenied,
            http::StatusCode::NOT_FOUND => Self::NoSuchKey,
            http::StatusCode::SERVICE_UNAVAILABLE => Self::ServiceUnavailable,
            http::StatusCode::INTERNAL_SERVER_ERROR => Self::InternalError,
            other => Self::Other(other.as_str().to_owned()),
        }
    }
}

impl fmt::Display for ObsErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification used by callers mapping OBS failures onto their own errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorReason {
    /// The bucket, object or upload does not exist.
    NotFound,
    /// The bucket already exists.
    AlreadyExists,
    /// The credentials were rejected.
    AccessDenied,
    /// Anything else.
    Other,
}

/// Errors returned by OBS client operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ObsError {
    /// OBS answered with an error response.
    #[error("{code}: {message} (status {status})")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Error code from the response body.
        code: ObsErrorCode,
        /// Error message from the response body.
        message: String,
        /// Request id reported by OBS, if any.
        request_id: Option<String>,
    },

    /// The request never produced a response (connect, timeout, body stream).
    #[error("transport error: {0}")]
    Transport(String),

    /// A response was received but could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ObsError {
    /// Build a service error.
    #[must_use]
    pub fn service(status: u16, code: &str, message: impl Into<String>) -> Self {
        Self::Service {
            status,
            code: ObsErrorCode::from_code(code),
            message: message.into(),
            request_id: None,
        }
    }

    /// The service error code, if this is a service error.
    #[must_use]
    pub fn code(&self) -> Option<&ObsErrorCode> {
        match self {
            Self::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Transport failures, throttling, 5xx responses and the
    /// `SlowDown`/`ServiceUnavailable`/`InternalError`/`RequestTimeout` codes
    /// are retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Service { status, code, .. } => {
                *status >= 500
                    || *status == 429
                    || matches!(
                        code,
                        ObsErrorCode::SlowDown
                            | ObsErrorCode::ServiceUnavailable
                            | ObsErrorCode::InternalError
                            | ObsErrorCode::RequestTimeout
                    )
            }
            Self::InvalidResponse(_) | Self::InvalidRequest(_) => false,
        }
    }

    /// Coarse reason classification.
    #[must_use]
    pub fn reason(&self) -> ErrorReason {
        match self {
            Self::Service { status, code, .. } => match code {
                ObsErrorCode::NoSuchBucket | ObsErrorCode::NoSuchKey | ObsErrorCode::NoSuchUpload => {
                    ErrorReason::NotFound
                }
                ObsErrorCode::BucketAlreadyExists | ObsErrorCode::BucketAlreadyOwnedByYou => {
                    ErrorReason::AlreadyExists
                }
                ObsErrorCode::AccessDenied
                | ObsErrorCode::InvalidAccessKeyId
                | ObsErrorCode::SignatureDoesNotMatch => ErrorReason::AccessDenied,
                _ if *status == 404 => ErrorReason::NotFound,
                _ if *status == 401 || *status == 403 => ErrorReason::AccessDenied,
                _ => ErrorReason::Other,
            },
            _ => ErrorReason::Other,
        }
    }
}

/// Convenience result type for OBS operations.
pub type ObsResult<T> = Result<T, ObsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_round_trip_known_codes() {
        for code in ["NoSuchBucket", "SlowDown", "BucketAlreadyOwnedByYou", "AccessDenied"] {
            assert_eq!(ObsErrorCode::from_code(code).as_str(), code);
        }
        assert_eq!(
            ObsErrorCode::from_code("Weird"),
            ObsErrorCode::Other("Weird".into())
        );
    }

    #[test]
    fn test_should_classify_retryable_errors() {
        assert!(ObsError::Transport("reset".into()).is_retryable());
        assert!(ObsError::service(503, "ServiceUnavailable", "busy").is_retryable());
        assert!(ObsError::service(500, "Anything", "boom").is_retryable());
        assert!(ObsError::service(429, "TooManyRequests", "slow").is_retryable());
        assert!(ObsError::service(400, "SlowDown", "slow").is_retryable());
        assert!(!ObsError::service(403, "AccessDenied", "no").is_retryable());
        assert!(!ObsError::service(404, "NoSuchBucket", "gone").is_retryable());
        assert!(!ObsError::InvalidResponse("bad xml".into()).is_retryable());
    }

    #[test]
    fn test_should_classify_reasons() {
        assert_eq!(
            ObsError::service(404, "NoSuchKey", "").reason(),
            ErrorReason::NotFound
        );
        assert_eq!(
            ObsError::service(409, "BucketAlreadyExists", "").reason(),
            ErrorReason::AlreadyExists
        );
        assert_eq!(
            ObsError::service(403, "Custom", "").reason(),
            ErrorReason::AccessDenied
        );
        assert_eq!(ObsError::Transport("x".into()).reason(), ErrorReason::Other);
    }

    #[test]
    fn test_should_include_message_in_display() {
        let err = ObsError::service(500, "any", "any");
        assert_eq!(err.to_string(), "any: any (status 500)");
    }
}
