//! Canonical request construction shared by SigV4 and SDK-HMAC-SHA256.
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! The URI and query helpers produce the exact strings that are also placed on
//! the wire, so the signed form and the requested form never diverge.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};

/// SHA-256 of the empty payload, hex encoded.
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Characters left unencoded: RFC 3986 unreserved (`A-Z a-z 0-9 - _ . ~`).
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Join the canonical components into the canonical request string.
///
/// `canonical_uri` and `canonical_query` must already be in canonical form
/// (see [`build_canonical_uri`] and [`build_canonical_query_string`]).
///
/// # Examples
///
/// ```
/// use edc_hw_auth::canonical::{EMPTY_PAYLOAD_SHA256, build_canonical_request};
///
/// let canonical = build_canonical_request(
///     "GET",
///     "/test.txt",
///     "",
///     &[("host", "examplebucket.s3.amazonaws.com")],
///     &["host"],
///     EMPTY_PAYLOAD_SHA256,
/// );
/// assert!(canonical.starts_with("GET\n/test.txt\n"));
/// ```
#[must_use]
pub fn build_canonical_request(
    method: &str,
    canonical_uri: &str,
    canonical_query: &str,
    headers: &[(&str, &str)],
    signed_headers: &[&str],
    payload_hash: &str,
) -> String {
    let canonical_headers = build_canonical_headers(headers, signed_headers);
    let signed_headers_str = build_signed_headers_string(signed_headers);

    format!(
        "{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n\n{signed_headers_str}\n{payload_hash}"
    )
}

/// Build the canonical URI by URI-encoding each raw path segment.
///
/// Forward slashes are preserved and an empty path becomes `/`.
///
/// # Examples
///
/// ```
/// use edc_hw_auth::canonical::build_canonical_uri;
///
/// assert_eq!(build_canonical_uri("/bucket/a b.txt"), "/bucket/a%20b.txt");
/// assert_eq!(build_canonical_uri(""), "/");
/// ```
#[must_use]
pub fn build_canonical_uri(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }

    let encoded = path
        .split('/')
        .map(uri_encode)
        .collect::<Vec<_>>()
        .join("/");

    if encoded.starts_with('/') {
        encoded
    } else {
        format!("/{encoded}")
    }
}

/// Build the canonical query string from raw (undecoded) parameter pairs.
///
/// Keys and values are URI-encoded, then sorted by key and value. A parameter
/// with an empty value renders as `key=`.
///
/// # Examples
///
/// ```
/// use edc_hw_auth::canonical::build_canonical_query_string;
///
/// assert_eq!(build_canonical_query_string(&[]), "");
/// assert_eq!(
///     build_canonical_query_string(&[("prefix", "a b"), ("marker", "")]),
///     "marker=&prefix=a%20b"
/// );
/// ```
#[must_use]
pub fn build_canonical_query_string(params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (uri_encode(k), uri_encode(v)))
        .collect();
    encoded.sort_unstable();

    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the canonical headers string from the request headers.
///
/// Only headers listed in `signed_headers` are included. Names are lowercased,
/// values trimmed with inner whitespace runs collapsed, repeated headers joined
/// with commas. The result has no trailing newline.
#[must_use]
pub fn build_canonical_headers(headers: &[(&str, &str)], signed_headers: &[&str]) -> String {
    let mut header_map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let lower_name = name.to_lowercase();
        let trimmed_value = collapse_whitespace(value.trim());
        header_map
            .entry(lower_name)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&trimmed_value);
            })
            .or_insert(trimmed_value);
    }

    let mut sorted_signed: Vec<&str> = signed_headers.to_vec();
    sorted_signed.sort_unstable();
    sorted_signed.dedup();

    sorted_signed
        .iter()
        .filter_map(|name| header_map.get(*name).map(|value| format!("{name}:{value}")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the signed headers string as a sorted, semicolon-separated list.
///
/// # Examples
///
/// ```
/// use edc_hw_auth::canonical::build_signed_headers_string;
///
/// assert_eq!(build_signed_headers_string(&["x-amz-date", "host"]), "host;x-amz-date");
/// ```
#[must_use]
pub fn build_signed_headers_string(signed_headers: &[&str]) -> String {
    let mut sorted: Vec<&str> = signed_headers.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.join(";")
}

/// Hex-encoded SHA-256 of a payload.
///
/// # Examples
///
/// ```
/// use edc_hw_auth::canonical::{EMPTY_PAYLOAD_SHA256, hash_payload};
///
/// assert_eq!(hash_payload(b""), EMPTY_PAYLOAD_SHA256);
/// ```
#[must_use]
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// URI-encode a string using the RFC 3986 unreserved set. Slashes are encoded.
#[must_use]
pub fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, URI_ENCODE_SET).to_string()
}

fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_encode_each_path_segment() {
        assert_eq!(build_canonical_uri("/bucket/dir/file.txt"), "/bucket/dir/file.txt");
        assert_eq!(build_canonical_uri("/bucket/hello world"), "/bucket/hello%20world");
        assert_eq!(build_canonical_uri("/bucket/a+b=c"), "/bucket/a%2Bb%3Dc");
    }

    #[test]
    fn test_should_prefix_relative_path_with_slash() {
        assert_eq!(build_canonical_uri("bucket/key"), "/bucket/key");
    }

    #[test]
    fn test_should_keep_trailing_slash() {
        assert_eq!(build_canonical_uri("/v3.0/OS-CREDENTIAL/"), "/v3.0/OS-CREDENTIAL/");
    }

    #[test]
    fn test_should_sort_and_encode_query_parameters() {
        let query = build_canonical_query_string(&[
            ("uploadId", "abc/123"),
            ("partNumber", "2"),
        ]);
        assert_eq!(query, "partNumber=2&uploadId=abc%2F123");
    }

    #[test]
    fn test_should_render_flag_parameters_with_empty_value() {
        assert_eq!(build_canonical_query_string(&[("uploads", "")]), "uploads=");
        assert_eq!(build_canonical_query_string(&[("delete", "")]), "delete=");
    }

    #[test]
    fn test_should_collapse_whitespace_in_header_values() {
        let headers = [("Host", "  example.com  "), ("X-Custom", "a   b   c")];
        let result = build_canonical_headers(&headers, &["host", "x-custom"]);
        assert_eq!(result, "host:example.com\nx-custom:a b c");
    }

    #[test]
    fn test_should_build_canonical_request_matching_aws_example() {
        let headers = [
            ("host", "examplebucket.s3.amazonaws.com"),
            ("range", "bytes=0-9"),
            ("x-amz-content-sha256", EMPTY_PAYLOAD_SHA256),
            ("x-amz-date", "20130524T000000Z"),
        ];
        let signed_headers = ["host", "range", "x-amz-content-sha256", "x-amz-date"];

        let canonical = build_canonical_request(
            "GET",
            &build_canonical_uri("/test.txt"),
            &build_canonical_query_string(&[]),
            &headers,
            &signed_headers,
            EMPTY_PAYLOAD_SHA256,
        );

        let expected = "GET\n\
                        /test.txt\n\
                        \n\
                        host:examplebucket.s3.amazonaws.com\n\
                        range:bytes=0-9\n\
                        x-amz-content-sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855\n\
                        x-amz-date:20130524T000000Z\n\
                        \n\
                        host;range;x-amz-content-sha256;x-amz-date\n\
                        e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
        assert_eq!(canonical, expected);
        assert_eq!(
            hash_payload(canonical.as_bytes()),
            "7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972"
        );
    }
}
