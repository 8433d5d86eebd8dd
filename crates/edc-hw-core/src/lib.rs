//! Core types, configuration and helpers for the Huawei Cloud connector extensions.
//!
//! This crate provides the building blocks shared by the OBS, IAM, provisioning
//! and transfer crates: the data address property model, bucket resource
//! descriptors, temporary credentials, environment-driven configuration and
//! identifier generation.

pub mod address;
pub mod config;
mod error;
pub mod types;
pub mod utils;
pub mod validation;

pub use address::DataAddress;
pub use config::HuaweiCloudConfig;
pub use error::{CoreError, CoreResult};
pub use types::{BucketResourceDescriptor, ProvisionedBucket, TemporaryCredential};
