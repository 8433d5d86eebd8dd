//! Request signing for Huawei Cloud REST APIs.
//!
//! Two schemes share one canonical-request builder:
//!
//! - [`sigv4`]: AWS Signature Version 4, accepted by the S3-compatible OBS API.
//! - [`sdk_hmac`]: `SDK-HMAC-SHA256`, the AK/SK scheme used by IAM and other
//!   Huawei Cloud API gateway services.

pub mod canonical;
pub mod credentials;
pub mod error;
pub mod sdk_hmac;
pub mod sigv4;

pub use credentials::Credentials;
pub use error::AuthError;
pub use sdk_hmac::SdkHmacSigner;
pub use sigv4::SigV4Signer;
