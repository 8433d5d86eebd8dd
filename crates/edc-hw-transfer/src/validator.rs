//! Data address validation.

use std::fmt;

use edc_hw_core::DataAddress;
use edc_hw_core::address::obs;
use edc_hw_core::validation::validate_bucket_name;

/// Every problem found in an address. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    violations: Vec<String>,
}

impl ValidationResult {
    /// Whether no violation was found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// The violations, in check order.
    #[must_use]
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    fn push(&mut self, violation: String) {
        self.violations.push(violation);
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            f.write_str("valid")
        } else {
            f.write_str(&self.violations.join("; "))
        }
    }
}

/// Checks that an address can be used as an OBS source or destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObsDataAddressValidator;

impl ObsDataAddressValidator {
    /// Validate `address` without touching the network.
    #[must_use]
    pub fn validate(&self, address: &DataAddress) -> ValidationResult {
        let mut result = ValidationResult::default();

        match address.address_type() {
            Some(obs::TYPE) => {}
            Some(other) => result.push(format!("type must be {}, got {other}", obs::TYPE)),
            None => result.push(format!("type must be {}", obs::TYPE)),
        }

        match address.bucket_name() {
            None => result.push(format!("{} is required", obs::BUCKET_NAME)),
            Some(bucket) => {
                if let Err(e) = validate_bucket_name(bucket) {
                    result.push(format!("{} is invalid: {e}", obs::BUCKET_NAME));
                }
            }
        }

        if address.endpoint().is_none() {
            result.push(format!("{} is required", obs::ENDPOINT));
        }

        result
    }
}
