//! Huawei IAM integration.
//!
//! [`CredentialBroker`] mints temporary credentials that may only upload into
//! one bucket. It talks to IAM through the [`IdentityClient`] seam:
//! [`HttpIamClient`] calls the `OS-CREDENTIAL/securitytokens` API,
//! [`StaticIdentityClient`] answers from memory.

mod broker;
mod client;
mod error;
pub mod policy;
mod static_client;

pub use broker::{CredentialBroker, MAX_DURATION_SECONDS, MIN_DURATION_SECONDS};
pub use client::{HttpIamClient, IdentityClient, SecurityTokenRequest};
pub use error::{IamError, IamResult};
pub use policy::{Policy, Statement};
pub use static_client::StaticIdentityClient;
