//! Signing errors.

/// Errors raised while signing an outgoing request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A header required for signing is missing.
    #[error("missing required header: {0}")]
    MissingHeader(String),

    /// A header value is not visible ASCII and cannot be signed.
    #[error("header {0} is not a valid ASCII value")]
    InvalidHeaderValue(String),

    /// The computed authorization value could not be converted into a header.
    #[error("invalid authorization header: {0}")]
    InvalidAuthorization(#[from] http::header::InvalidHeaderValue),
}
