//! Signing credentials.

use std::fmt;

use edc_hw_core::{HuaweiCloudConfig, TemporaryCredential};

/// Access key pair with an optional security token.
///
/// # Examples
///
/// ```
/// use edc_hw_auth::Credentials;
///
/// let creds = Credentials::new("AKID", "secret").with_session_token("token");
/// assert_eq!(creds.access_key_id, "AKID");
/// assert_eq!(creds.session_token.as_deref(), Some("token"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Security token for temporary credentials.
    pub session_token: Option<String>,
}

impl Credentials {
    /// Create long-lived credentials.
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Attach a security token.
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// The connector's own credentials.
    #[must_use]
    pub fn from_config(config: &HuaweiCloudConfig) -> Self {
        Self {
            access_key_id: config.access_key_id.clone(),
            secret_access_key: config.secret_access_key.clone(),
            session_token: config.security_token.clone(),
        }
    }
}

impl From<&TemporaryCredential> for Credentials {
    fn from(credential: &TemporaryCredential) -> Self {
        Self::new(&credential.access_key, &credential.secret_key)
            .with_session_token(&credential.security_token)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_convert_temporary_credential() {
        let temp = TemporaryCredential {
            access_key: "ak".into(),
            secret_key: "sk".into(),
            security_token: "token".into(),
            expires_at_epoch_millis: 0,
        };
        let creds = Credentials::from(&temp);
        assert_eq!(creds.access_key_id, "ak");
        assert_eq!(creds.secret_access_key, "sk");
        assert_eq!(creds.session_token.as_deref(), Some("token"));
    }

    #[test]
    fn test_should_redact_debug_output() {
        let creds = Credentials::new("ak", "very-secret").with_session_token("tok-123");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("very-secret"));
        assert!(!debug.contains("tok-123"));
    }
}
