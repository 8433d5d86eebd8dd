//! Least-privilege credential issuance.

use std::sync::Arc;

use edc_hw_core::TemporaryCredential;
use tracing::{debug, info};

use crate::client::{IdentityClient, SecurityTokenRequest};
use crate::error::{IamError, IamResult};
use crate::policy::Policy;

/// Shortest token lifetime IAM issues.
pub const MIN_DURATION_SECONDS: u32 = 900;
/// Longest token lifetime IAM issues.
pub const MAX_DURATION_SECONDS: u32 = 86_400;

/// Mints credentials that may only upload into one bucket.
///
/// The broker never retries; callers wrap it in their own retry policy.
#[derive(Debug, Clone)]
pub struct CredentialBroker {
    client: Arc<dyn IdentityClient>,
    default_duration_seconds: u32,
}

impl CredentialBroker {
    /// Create a broker issuing tokens valid for `default_duration_seconds`.
    #[must_use]
    pub fn new(client: Arc<dyn IdentityClient>, default_duration_seconds: u32) -> Self {
        Self {
            client,
            default_duration_seconds,
        }
    }

    /// Default token lifetime.
    #[must_use]
    pub fn default_duration_seconds(&self) -> u32 {
        self.default_duration_seconds
    }

    /// Issue a `PutObject`-only credential for `bucket_name` with the default lifetime.
    pub async fn issue_default(&self, bucket_name: &str) -> IamResult<TemporaryCredential> {
        self.issue_temporary_credential(bucket_name, self.default_duration_seconds)
            .await
    }

    /// Issue a `PutObject`-only credential for `bucket_name`.
    pub async fn issue_temporary_credential(
        &self,
        bucket_name: &str,
        duration_seconds: u32,
    ) -> IamResult<TemporaryCredential> {
        if !(MIN_DURATION_SECONDS..=MAX_DURATION_SECONDS).contains(&duration_seconds) {
            return Err(IamError::InvalidDuration {
                duration: duration_seconds,
                min: MIN_DURATION_SECONDS,
                max: MAX_DURATION_SECONDS,
            });
        }

        let request = SecurityTokenRequest {
            duration_seconds,
            policy: Policy::put_object_only(bucket_name),
        };
        debug!(bucket = bucket_name, duration_seconds, "issuing temporary credential");
        let credential = self.client.create_security_token(&request).await?;
        info!(
            bucket = bucket_name,
            expires_at = credential.expires_at_epoch_millis,
            "issued temporary credential"
        );
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PUT_OBJECT_ACTION;
    use crate::static_client::StaticIdentityClient;

    fn credential() -> TemporaryCredential {
        TemporaryCredential {
            access_key: "accessKeyId".into(),
            secret_key: "secretAccessKey".into(),
            security_token: "sessionToken".into(),
            expires_at_epoch_millis: 1,
        }
    }

    #[tokio::test]
    async fn test_should_scope_policy_to_single_bucket() {
        let client = Arc::new(StaticIdentityClient::new(credential()));
        let broker = CredentialBroker::new(client.clone(), 1800);

        let issued = broker.issue_default("test").await.expect("credential");
        assert_eq!(issued, credential());

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].duration_seconds, 1800);
        let statements = &requests[0].policy.statement;
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].action, [PUT_OBJECT_ACTION]);
        assert!(statements[0].resource[0].contains("test"));
    }

    #[tokio::test]
    async fn test_should_reject_duration_outside_window() {
        let client = Arc::new(StaticIdentityClient::new(credential()));
        let broker = CredentialBroker::new(client.clone(), 1800);

        for duration in [0, 899, 86_401] {
            let err = broker
                .issue_temporary_credential("test", duration)
                .await
                .expect_err("rejected");
            assert!(matches!(err, IamError::InvalidDuration { .. }));
        }
        assert!(client.requests().is_empty());
        assert!(broker.issue_temporary_credential("test", 900).await.is_ok());
        assert!(broker.issue_temporary_credential("test", 86_400).await.is_ok());
    }

    #[tokio::test]
    async fn test_should_not_retry_failures() {
        let client = Arc::new(StaticIdentityClient::new(credential()));
        client.fail_times(IamError::Transport("down".into()), 1);
        let broker = CredentialBroker::new(client.clone(), 1800);

        assert!(broker.issue_default("test").await.is_err());
        assert_eq!(client.requests().len(), 1);
    }
}
