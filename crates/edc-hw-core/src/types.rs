//! Provisioning data model.

use std::fmt;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::address::{DataAddress, obs};
use crate::error::CoreResult;

/// Describes a bucket to be provisioned for one transfer process.
///
/// Built once by the consumer resource generator and never mutated.
///
/// # Examples
///
/// ```
/// use edc_hw_core::BucketResourceDescriptor;
///
/// let descriptor = BucketResourceDescriptor::builder()
///     .id("res-1")
///     .transfer_process_id("tp-1")
///     .bucket_name("test")
///     .endpoint("http://endpoint")
///     .build();
/// assert_eq!(descriptor.bucket_name(), "test");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct BucketResourceDescriptor {
    #[builder(setter(into))]
    id: String,
    #[builder(setter(into))]
    transfer_process_id: String,
    #[builder(setter(into))]
    bucket_name: String,
    #[builder(setter(into))]
    endpoint: String,
    #[builder(default, setter(into))]
    key_prefix: String,
}

impl BucketResourceDescriptor {
    /// Resource definition id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Owning transfer process id.
    #[must_use]
    pub fn transfer_process_id(&self) -> &str {
        &self.transfer_process_id
    }

    /// Bucket to create.
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    /// OBS endpoint hosting the bucket.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Object key prefix requested by the consumer; may be empty.
    #[must_use]
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }
}

/// Result of a successful provisioning.
///
/// `data_address` references the credential through `keyName`; it never embeds
/// the credential itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedBucket {
    /// The descriptor this bucket was provisioned from.
    pub descriptor: BucketResourceDescriptor,
    /// Secret-store key of the temporary credential.
    pub secret_key_reference: String,
    /// Address a provider can write into.
    pub data_address: DataAddress,
}

impl ProvisionedBucket {
    /// Build the provisioned resource, deriving its data address from the descriptor.
    #[must_use]
    pub fn new(descriptor: BucketResourceDescriptor, secret_key_reference: String) -> Self {
        let mut data_address = DataAddress::obs(descriptor.bucket_name(), descriptor.endpoint())
            .with_property(obs::KEY_NAME, secret_key_reference.clone());
        if !descriptor.key_prefix().is_empty() {
            data_address.set_property(obs::KEY_PREFIX, descriptor.key_prefix());
        }
        Self {
            descriptor,
            secret_key_reference,
            data_address,
        }
    }

    /// Id of the provisioned resource (the resource definition id).
    #[must_use]
    pub fn id(&self) -> &str {
        self.descriptor.id()
    }

    /// The provisioned bucket name.
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        self.descriptor.bucket_name()
    }

    /// The endpoint hosting the bucket.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.descriptor.endpoint()
    }
}

/// Short-lived access key, secret key and security token issued by IAM.
///
/// Serialized as `{"ak", "sk", "token", "expiration"}`, the format stored in
/// the secret store and read back by transfer sinks.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryCredential {
    /// Temporary access key id.
    #[serde(rename = "ak")]
    pub access_key: String,
    /// Temporary secret access key.
    #[serde(rename = "sk")]
    pub secret_key: String,
    /// Security token that must accompany every signed request.
    #[serde(rename = "token")]
    pub security_token: String,
    /// Expiration as milliseconds since the Unix epoch.
    #[serde(rename = "expiration", default)]
    pub expires_at_epoch_millis: i64,
}

impl TemporaryCredential {
    /// Serialize to the stored JSON form.
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the stored JSON form.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether the credential has expired at `now_millis`.
    ///
    /// A zero expiration means unknown and is never treated as expired.
    #[must_use]
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        self.expires_at_epoch_millis > 0 && self.expires_at_epoch_millis <= now_millis
    }
}

impl fmt::Debug for TemporaryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredential")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("security_token", &"<redacted>")
            .field("expires_at_epoch_millis", &self.expires_at_epoch_millis)
            .finish()
    }
}
