//! XML codec for the S3-compatible OBS API.
//!
//! # Key components
//!
//! - [`ObsSerialize`] and [`to_xml`] for request bodies (`CompleteMultipartUpload`,
//!   `Delete`, `CreateBucketConfiguration`)
//! - [`ObsDeserialize`] and [`from_xml`] for response bodies (`ListBucketResult`,
//!   `InitiateMultipartUploadResult`, `DeleteResult`, `Error`)
//! - [`parse_error_body`] for error responses, including the `200 OK` responses
//!   whose body is an `<Error>` document

pub mod deserialize;
pub mod error;
pub mod serialize;

pub use deserialize::{ErrorBody, ObsDeserialize, from_xml, parse_error_body};
pub use error::XmlError;
pub use serialize::{
    CompleteMultipartUpload, CreateBucketConfiguration, DeleteObjects, ObsSerialize, S3_NAMESPACE,
    to_xml,
};
