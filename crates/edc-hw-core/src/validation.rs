//! OBS bucket name validation.
//!
//! OBS follows the DNS-compatible naming rules: 3 to 63 characters, lowercase
//! letters, digits, hyphens and periods, starting and ending with a letter or
//! digit, with no adjacent periods or period/hyphen pairs, and not formatted as
//! an IPv4 address.

use std::net::Ipv4Addr;

use crate::error::CoreError;

/// Minimum bucket name length.
pub const MIN_BUCKET_NAME_LEN: usize = 3;
/// Maximum bucket name length.
pub const MAX_BUCKET_NAME_LEN: usize = 63;

/// Validate an OBS bucket name.
///
/// # Examples
///
/// ```
/// use edc_hw_core::validation::validate_bucket_name;
///
/// assert!(validate_bucket_name("my-bucket").is_ok());
/// assert!(validate_bucket_name("My_Bucket").is_err());
/// ```
pub fn validate_bucket_name(name: &str) -> Result<(), CoreError> {
    let invalid = |reason: &str| CoreError::InvalidBucketName {
        name: name.to_owned(),
        reason: reason.to_owned(),
    };

    let len = name.len();
    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&len) {
        return Err(invalid(&format!(
            "Bucket name must be between {MIN_BUCKET_NAME_LEN} and {MAX_BUCKET_NAME_LEN} characters long"
        )));
    }

    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
    {
        return Err(invalid(
            "Bucket name must only contain lowercase letters, numbers, hyphens, and dots",
        ));
    }

    let first = name.as_bytes()[0];
    let last = name.as_bytes()[len - 1];
    if !(first.is_ascii_lowercase() || first.is_ascii_digit())
        || !(last.is_ascii_lowercase() || last.is_ascii_digit())
    {
        return Err(invalid("Bucket name must start and end with a letter or number"));
    }

    if name.contains("..") || name.contains(".-") || name.contains("-.") {
        return Err(invalid(
            "Bucket name must not contain adjacent periods or a period next to a hyphen",
        ));
    }

    if name.parse::<Ipv4Addr>().is_ok() {
        return Err(invalid("Bucket name must not be formatted as an IP address"));
    }

    Ok(())
}
