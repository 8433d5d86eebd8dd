//! OBS client facade.
//!
//! [`ObsClient`] is the seam every other crate talks to. Two implementations
//! ship here:
//!
//! - [`HttpObsClient`]: the S3-compatible REST API over `reqwest`, path-style
//!   addressing, SigV4 signed.
//! - [`MemoryObsClient`]: an in-process bucket store with a call log and fault
//!   injection, used by tests and dry runs.
//!
//! [`ObsClientCache`] keeps one client per endpoint for the connector's own
//! credentials.

pub mod cache;
pub mod client;
pub mod rest;
pub mod memory;

pub use cache::{HttpObsClientFactory, ObsClientCache, ObsClientFactory};
pub use client::{ByteStream, ObjectBody, ObsClient, UploadPartRequest};
pub use edc_hw_obs_model::{ObsError, ObsResult};
pub use rest::HttpObsClient;
pub use memory::{MemoryObsClient, ObsCall, ObsOperation, RestrictedObsClient};
