//! Consumer-side resource generation.

use edc_hw_core::address::obs;
use edc_hw_core::utils::generate_resource_id;
use edc_hw_core::{BucketResourceDescriptor, DataAddress};

use crate::error::{ProvisionError, ProvisionResult};

/// Builds the bucket descriptor for a transfer whose destination is OBS.
#[derive(Debug, Clone)]
pub struct ObsConsumerResourceGenerator {
    default_endpoint: String,
}

impl ObsConsumerResourceGenerator {
    /// Create a generator that falls back to `default_endpoint` when the
    /// destination names none.
    #[must_use]
    pub fn new(default_endpoint: impl Into<String>) -> Self {
        Self {
            default_endpoint: default_endpoint.into(),
        }
    }

    /// Whether the destination is an OBS address.
    #[must_use]
    pub fn can_generate(&self, destination: &DataAddress) -> bool {
        destination.address_type() == Some(obs::TYPE)
    }

    /// Descriptor for provisioning `destination` on behalf of `transfer_process_id`.
    pub fn generate(
        &self,
        transfer_process_id: &str,
        destination: &DataAddress,
    ) -> ProvisionResult<BucketResourceDescriptor> {
        let mut violations = Vec::new();
        if !self.can_generate(destination) {
            violations.push(format!(
                "destination type must be {}, got {}",
                obs::TYPE,
                destination.address_type().unwrap_or("<none>")
            ));
        }
        let bucket_name = destination.bucket_name().unwrap_or_default();
        if bucket_name.is_empty() {
            violations.push(format!("destination is missing {}", obs::BUCKET_NAME));
        }
        if !violations.is_empty() {
            return Err(ProvisionError::Validation(violations));
        }
        let endpoint = destination.endpoint().unwrap_or(&self.default_endpoint);

        Ok(BucketResourceDescriptor::builder()
            .id(generate_resource_id())
            .transfer_process_id(transfer_process_id)
            .bucket_name(bucket_name)
            .endpoint(endpoint)
            .key_prefix(destination.key_prefix())
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_generate_descriptor_from_destination() {
        let generator = ObsConsumerResourceGenerator::new("https://default");
        let destination = DataAddress::obs("test", "http://endpoint")
            .with_property(obs::KEY_PREFIX, "incoming/");

        let descriptor = generator.generate("tp-1", &destination).expect("descriptor");
        assert_eq!(descriptor.bucket_name(), "test");
        assert_eq!(descriptor.endpoint(), "http://endpoint");
        assert_eq!(descriptor.transfer_process_id(), "tp-1");
        assert_eq!(descriptor.key_prefix(), "incoming/");
        assert!(!descriptor.id().is_empty());
    }

    #[test]
    fn test_should_fall_back_to_default_endpoint() {
        let generator = ObsConsumerResourceGenerator::new("https://default");
        let destination = DataAddress::new(obs::TYPE).with_property(obs::BUCKET_NAME, "test");
        let descriptor = generator.generate("tp-1", &destination).expect("descriptor");
        assert_eq!(descriptor.endpoint(), "https://default");
    }

    #[test]
    fn test_should_report_every_destination_violation() {
        let generator = ObsConsumerResourceGenerator::new("https://default");
        let Err(ProvisionError::Validation(violations)) =
            generator.generate("tp-1", &DataAddress::new("AmazonS3"))
        else {
            panic!("expected validation error");
        };
        assert_eq!(
            violations,
            [
                format!("destination type must be {}, got AmazonS3", obs::TYPE),
                format!("destination is missing {}", obs::BUCKET_NAME),
            ]
        );
    }

    #[test]
    fn test_should_reject_foreign_or_incomplete_destination() {
        let generator = ObsConsumerResourceGenerator::new("https://default");
        assert!(!generator.can_generate(&DataAddress::new("AmazonS3")));
        assert!(matches!(
            generator.generate("tp-1", &DataAddress::new("AmazonS3")),
            Err(ProvisionError::Validation(_))
        ));
        assert!(matches!(
            generator.generate("tp-1", &DataAddress::new(obs::TYPE)),
            Err(ProvisionError::Validation(_))
        ));
    }
}
