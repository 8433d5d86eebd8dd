//! The identity seam and its HTTP implementation.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edc_hw_auth::canonical::build_canonical_uri;
use edc_hw_auth::{Credentials, SdkHmacSigner};
use edc_hw_core::{HuaweiCloudConfig, TemporaryCredential};
use http::header::{CONTENT_TYPE, HOST, HeaderValue};
use http::{HeaderMap, Method};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{IamError, IamResult};
use crate::policy::Policy;

const SECURITY_TOKENS_PATH: &str = "/v3.0/OS-CREDENTIAL/securitytokens";

/// Parameters of one security-token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityTokenRequest {
    /// Token lifetime in seconds.
    pub duration_seconds: u32,
    /// Policy narrowing what the token may do.
    pub policy: Policy,
}

impl SecurityTokenRequest {
    /// The JSON body IAM expects.
    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        json!({
            "auth": {
                "identity": {
                    "methods": ["token"],
                    "token": { "duration_seconds": self.duration_seconds },
                    "policy": self.policy,
                }
            }
        })
    }
}

/// Issues temporary credentials.
#[async_trait]
pub trait IdentityClient: Send + Sync + fmt::Debug {
    /// Request a temporary credential.
    async fn create_security_token(
        &self,
        request: &SecurityTokenRequest,
    ) -> IamResult<TemporaryCredential>;
}

#[derive(Debug, Deserialize)]
struct SecurityTokenResponse {
    credential: CredentialBody,
}

#[derive(Debug, Deserialize)]
struct CredentialBody {
    access: String,
    secret: String,
    securitytoken: String,
    expires_at: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_msg: Option<String>,
}

/// Parse a security-token response body.
pub(crate) fn parse_response(body: &[u8]) -> IamResult<TemporaryCredential> {
    let response: SecurityTokenResponse = serde_json::from_slice(body)
        .map_err(|e| IamError::InvalidResponse(format!("malformed security token response: {e}")))?;
    let credential = response.credential;
    let expires_at = DateTime::parse_from_rfc3339(&credential.expires_at)
        .map_err(|e| {
            IamError::InvalidResponse(format!("invalid expires_at {}: {e}", credential.expires_at))
        })?
        .with_timezone(&Utc);

    Ok(TemporaryCredential {
        access_key: credential.access,
        secret_key: credential.secret,
        security_token: credential.securitytoken,
        expires_at_epoch_millis: expires_at.timestamp_millis(),
    })
}

/// IAM client over HTTPS, signed with `SDK-HMAC-SHA256`.
#[derive(Debug, Clone)]
pub struct HttpIamClient {
    endpoint: String,
    host: String,
    http: reqwest::Client,
    signer: SdkHmacSigner,
}

impl HttpIamClient {
    /// Create a client for the configured IAM endpoint and account credentials.
    pub fn new(config: &HuaweiCloudConfig) -> IamResult<Self> {
        let endpoint = config.iam_endpoint.trim_end_matches('/').to_owned();
        let url = reqwest::Url::parse(&endpoint)
            .map_err(|e| IamError::Transport(format!("invalid IAM endpoint {endpoint}: {e}")))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_owned(),
            (None, _) => {
                return Err(IamError::Transport(format!(
                    "IAM endpoint {endpoint} has no host"
                )));
            }
        };
        // Token calls are small and unstreamed, so the timeout bounds the whole call.
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| IamError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint,
            host,
            http,
            signer: SdkHmacSigner::new(Credentials::from_config(config)),
        })
    }
}

#[async_trait]
impl IdentityClient for HttpIamClient {
    async fn create_security_token(
        &self,
        request: &SecurityTokenRequest,
    ) -> IamResult<TemporaryCredential> {
        let body = serde_json::to_vec(&request.to_body())
            .map_err(|e| IamError::InvalidResponse(format!("failed to encode request: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            HOST,
            HeaderValue::from_str(&self.host).map_err(|e| IamError::Transport(e.to_string()))?,
        );
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json;charset=utf8"),
        );
        let canonical_uri = build_canonical_uri(SECURITY_TOKENS_PATH);
        self.signer
            .sign(
                Method::POST.as_str(),
                &canonical_uri,
                "",
                &mut headers,
                &body,
                Utc::now(),
            )
            .map_err(|e| IamError::Transport(e.to_string()))?;

        debug!(
            endpoint = %self.endpoint,
            duration_seconds = request.duration_seconds,
            "requesting temporary security token"
        );
        let response = self
            .http
            .post(format!("{}{canonical_uri}", self.endpoint))
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| IamError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| IamError::Transport(e.to_string()))?;
        if !status.is_success() {
            let error: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
            return Err(IamError::Service {
                status: status.as_u16(),
                code: error.error_code,
                message: error
                    .error_msg
                    .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned()),
            });
        }
        parse_response(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_build_request_body_with_policy() {
        let request = SecurityTokenRequest {
            duration_seconds: 1800,
            policy: Policy::put_object_only("test"),
        };
        let body = request.to_body();
        let identity = &body["auth"]["identity"];
        assert_eq!(identity["methods"], json!(["token"]));
        assert_eq!(identity["token"]["duration_seconds"], 1800);
        assert_eq!(identity["policy"]["Version"], "1.1");
        assert_eq!(
            identity["policy"]["Statement"][0]["Resource"][0],
            "obs:*:*:object:test/*"
        );
    }

    #[test]
    fn test_should_parse_security_token_response() {
        let body = br#"{
            "credential": {
                "access": "accessKeyId",
                "secret": "secretAccessKey",
                "securitytoken": "sessionToken",
                "expires_at": "2024-01-02T03:04:05.000000Z"
            }
        }"#;
        let credential = parse_response(body).expect("parse");
        assert_eq!(credential.access_key, "accessKeyId");
        assert_eq!(credential.secret_key, "secretAccessKey");
        assert_eq!(credential.security_token, "sessionToken");
        assert_eq!(credential.expires_at_epoch_millis, 1_704_164_645_000);
    }

    #[test]
    fn test_should_reject_malformed_response() {
        assert!(matches!(
            parse_response(br#"{"credential":{"access":"a"}}"#),
            Err(IamError::InvalidResponse(_))
        ));
        let bad_time = br#"{"credential":{"access":"a","secret":"s","securitytoken":"t","expires_at":"tomorrow"}}"#;
        assert!(matches!(
            parse_response(bad_time),
            Err(IamError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_should_reject_endpoint_without_host() {
        let config = HuaweiCloudConfig::builder().iam_endpoint("not a url").build();
        assert!(HttpIamClient::new(&config).is_err());
    }
}
