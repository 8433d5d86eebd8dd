//! Data address property model.
//!
//! A [`DataAddress`] is a typed bag of string properties describing where data
//! lives. The OBS transfer and provisioning crates agree on the property names
//! defined in [`obs`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Property name holding the address type.
pub const TYPE: &str = "type";

/// OBS address schema.
pub mod obs {
    /// Address type for Huawei OBS buckets.
    pub const TYPE: &str = "HuaweiObs";
    /// Bucket name property.
    pub const BUCKET_NAME: &str = "bucketName";
    /// OBS endpoint property (e.g. `https://obs.cn-north-4.myhuaweicloud.com`).
    pub const ENDPOINT: &str = "endpoint";
    /// Object key prefix property.
    pub const KEY_PREFIX: &str = "keyPrefix";
    /// Single object key property.
    pub const OBJECT_NAME: &str = "objectName";
    /// Secret-store key under which the access credential is kept.
    pub const KEY_NAME: &str = "keyName";
}

/// An ordered map of string properties with a distinguished `type` property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataAddress {
    properties: BTreeMap<String, String>,
}

impl DataAddress {
    /// Create an address of the given type with no other properties.
    #[must_use]
    pub fn new(address_type: impl Into<String>) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(TYPE.to_owned(), address_type.into());
        Self { properties }
    }

    /// Create an empty OBS address for the given bucket and endpoint.
    #[must_use]
    pub fn obs(bucket_name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new(obs::TYPE)
            .with_property(obs::BUCKET_NAME, bucket_name)
            .with_property(obs::ENDPOINT, endpoint)
    }

    /// Return the address with `key` set to `value`.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Set a property, replacing any previous value.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Look up a property. Empty values are treated as absent.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// The address type, if set.
    #[must_use]
    pub fn address_type(&self) -> Option<&str> {
        self.property(TYPE)
    }

    /// The OBS bucket name, if set.
    #[must_use]
    pub fn bucket_name(&self) -> Option<&str> {
        self.property(obs::BUCKET_NAME)
    }

    /// The OBS endpoint, if set.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.property(obs::ENDPOINT)
    }

    /// The object key prefix, or `""` when unset.
    #[must_use]
    pub fn key_prefix(&self) -> &str {
        self.property(obs::KEY_PREFIX).unwrap_or_default()
    }

    /// The single object key, if set.
    #[must_use]
    pub fn object_name(&self) -> Option<&str> {
        self.property(obs::OBJECT_NAME)
    }

    /// The secret-store key of the access credential, if set.
    #[must_use]
    pub fn key_name(&self) -> Option<&str> {
        self.property(obs::KEY_NAME)
    }

    /// Iterate over all properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
