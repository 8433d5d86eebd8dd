//! OBS bucket provisioning.
//!
//! [`ObsProvisioner`] creates a bucket plus a `PutObject`-only temporary
//! credential for a transfer, and tears both down again. Every remote step runs
//! under a [`RetryPolicy`]. [`ObsConsumerResourceGenerator`] turns a requested
//! destination address into the [`BucketResourceDescriptor`] it provisions.
//!
//! [`BucketResourceDescriptor`]: edc_hw_core::BucketResourceDescriptor

mod error;
mod generator;
mod provisioner;
mod retry;

pub use error::{ProvisionError, ProvisionResult};
pub use generator::ObsConsumerResourceGenerator;
pub use provisioner::{DeprovisionedBucket, ObsProvisioner, ResourceProvisioner};
pub use retry::{BackoffKind, RetryPolicy};
