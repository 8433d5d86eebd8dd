//! Identifier generation and time helpers.

use chrono::Utc;
use uuid::Uuid;

/// Build the secret-store key for the credential of a resource definition.
///
/// The format is `resourceDefinition-<id>-secret-<random>`.
///
/// # Examples
///
/// ```
/// use edc_hw_core::utils::secret_key_reference;
///
/// let key = secret_key_reference("res-1");
/// assert!(key.starts_with("resourceDefinition-res-1-secret-"));
/// ```
#[must_use]
pub fn secret_key_reference(resource_definition_id: &str) -> String {
    format!(
        "resourceDefinition-{resource_definition_id}-secret-{}",
        Uuid::new_v4().simple()
    )
}

/// Generate a resource id (hyphenated UUID v4).
#[must_use]
pub fn generate_resource_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a unique request ID (UUID v4 without dashes).
#[must_use]
pub fn generate_request_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Current time as milliseconds since the Unix epoch.
#[must_use]
pub fn now_epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_generate_distinct_secret_references() {
        let a = secret_key_reference("id");
        let b = secret_key_reference("id");
        assert_ne!(a, b);
        assert!(a.starts_with("resourceDefinition-id-secret-"));
        assert_eq!(a.len(), "resourceDefinition-id-secret-".len() + 32);
    }

    #[test]
    fn test_should_generate_hex_request_id() {
        let id = generate_request_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_should_return_current_millis() {
        assert!(now_epoch_millis() > 1_600_000_000_000);
    }
}
