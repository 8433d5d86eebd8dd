//! Huawei Cloud `SDK-HMAC-SHA256` AK/SK request signing.
//!
//! The canonical request has the SigV4 layout with two differences: the
//! canonical URI always ends in `/`, and the string to sign carries no
//! credential scope:
//!
//! ```text
//! SDK-HMAC-SHA256\n
//! <X-Sdk-Date>\n
//! <hex(sha256(canonical_request))>
//! ```
//!
//! The signature is `hex(HMAC-SHA256(secret_key, string_to_sign))`.

use chrono::{DateTime, Utc};
use http::HeaderMap;
use http::header::{AUTHORIZATION, HOST, HeaderValue};
use tracing::trace;

use crate::canonical::{build_canonical_request, build_signed_headers_string, hash_payload};
use crate::credentials::Credentials;
use crate::error::AuthError;
use crate::sigv4::{header_pairs, hmac_sha256};

/// The signing algorithm name.
pub const ALGORITHM: &str = "SDK-HMAC-SHA256";

/// Header carrying the request timestamp.
pub const X_SDK_DATE: &str = "x-sdk-date";
/// Header carrying the security token of temporary credentials.
pub const X_SECURITY_TOKEN: &str = "x-security-token";

/// Signs Huawei Cloud API gateway requests.
#[derive(Debug, Clone)]
pub struct SdkHmacSigner {
    credentials: Credentials,
}

impl SdkHmacSigner {
    /// Create a signer for the given credentials.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// Sign a request in place.
    ///
    /// `canonical_uri` is the encoded request path (without the trailing slash
    /// the algorithm adds) and `canonical_query` the encoded query string.
    pub fn sign(
        &self,
        method: &str,
        canonical_uri: &str,
        canonical_query: &str,
        headers: &mut HeaderMap,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        if !headers.contains_key(HOST) {
            return Err(AuthError::MissingHeader(HOST.as_str().to_owned()));
        }

        let sdk_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        headers.remove(AUTHORIZATION);
        headers.insert(X_SDK_DATE, HeaderValue::from_str(&sdk_date)?);
        if let Some(token) = &self.credentials.session_token {
            headers.insert(X_SECURITY_TOKEN, HeaderValue::from_str(token)?);
        }

        let uri = if canonical_uri.ends_with('/') {
            canonical_uri.to_owned()
        } else {
            format!("{canonical_uri}/")
        };

        let pairs = header_pairs(headers)?;
        let signed: Vec<&str> = pairs.iter().map(|(name, _)| *name).collect();
        let canonical_request = build_canonical_request(
            method,
            &uri,
            canonical_query,
            &pairs,
            &signed,
            &hash_payload(body),
        );
        trace!(canonical_request = %canonical_request, "built SDK-HMAC canonical request");

        let string_to_sign = build_string_to_sign(&sdk_date, &hash_payload(canonical_request.as_bytes()));
        let signature = hex::encode(hmac_sha256(
            self.credentials.secret_access_key.as_bytes(),
            string_to_sign.as_bytes(),
        ));

        let authorization = format!(
            "{ALGORITHM} Access={}, SignedHeaders={}, Signature={signature}",
            self.credentials.access_key_id,
            build_signed_headers_string(&signed),
        );
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&authorization)?);
        Ok(())
    }
}

/// Build the `SDK-HMAC-SHA256` string to sign.
#[must_use]
pub fn build_string_to_sign(sdk_date: &str, canonical_request_hash: &str) -> String {
    format!("{ALGORITHM}\n{sdk_date}\n{canonical_request_hash}")
}
