//! Secret storage for issued credentials.
//!
//! Values are opaque strings. The provisioner stores JSON-serialized temporary
//! credentials under a generated key and the transfer factories read them back.

mod error;
mod file;
mod memory;
mod store;

pub use error::{SecretStoreError, SecretStoreResult};
pub use file::FileSecretStore;
pub use memory::InMemorySecretStore;
pub use store::SecretStore;
