//! Huawei Cloud configuration.
//!
//! Provides [`HuaweiCloudConfig`], the settings shared by the OBS client, the
//! IAM credential broker, the provisioner and the transfer sink. Values are
//! loaded from environment variables with defaults for the `cn-north-4` region.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

const MIB: u64 = 1024 * 1024;

/// Connector-wide Huawei Cloud settings.
///
/// # Examples
///
/// ```
/// use edc_hw_core::HuaweiCloudConfig;
///
/// let config = HuaweiCloudConfig::default();
/// assert_eq!(config.token_duration_seconds, 1800);
/// assert_eq!(config.chunk_size_bytes(), 500 * 1024 * 1024);
/// ```
#[derive(Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct HuaweiCloudConfig {
    /// Long-lived access key id of the connector account.
    #[builder(default, setter(into))]
    pub access_key_id: String,

    /// Long-lived secret access key of the connector account.
    #[builder(default, setter(into))]
    pub secret_access_key: String,

    /// Optional security token when the connector itself runs on temporary credentials.
    #[builder(default, setter(strip_option, into))]
    pub security_token: Option<String>,

    /// Region used for signing and bucket location constraints.
    #[builder(default = String::from("cn-north-4"), setter(into))]
    pub region: String,

    /// IAM endpoint issuing temporary security tokens.
    #[builder(default = String::from("https://iam.myhuaweicloud.com"), setter(into))]
    pub iam_endpoint: String,

    /// Default OBS endpoint when an address does not name one.
    #[builder(default = String::from("https://obs.cn-north-4.myhuaweicloud.com"), setter(into))]
    pub obs_endpoint: String,

    /// Maximum attempts (first call included) for each provisioning step.
    #[builder(default = 3)]
    pub retry_max_attempts: u32,

    /// Initial backoff delay in milliseconds.
    #[builder(default = 500)]
    pub retry_min_delay_ms: u64,

    /// Upper bound of the backoff delay in milliseconds.
    #[builder(default = 10_000)]
    pub retry_max_delay_ms: u64,

    /// Use a fixed delay of `retry_min_delay_ms` instead of exponential backoff.
    #[builder(default = false)]
    pub retry_fixed_delay: bool,

    /// Lifetime of issued temporary credentials.
    #[builder(default = 1800)]
    pub token_duration_seconds: u32,

    /// Multipart chunk size in MiB.
    #[builder(default = 500)]
    pub chunk_size_mb: u64,

    /// TCP connect timeout in milliseconds.
    #[builder(default = 10_000)]
    pub connect_timeout_ms: u64,

    /// Request timeout in milliseconds. OBS applies it to each read, so a
    /// body may stream for as long as data keeps arriving; IAM applies it to
    /// the whole call.
    #[builder(default = 300_000)]
    pub request_timeout_ms: u64,

    /// Remove the stored credential when a bucket is deprovisioned.
    #[builder(default = true)]
    pub delete_secret_on_deprovision: bool,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"), setter(into))]
    pub log_level: String,
}

impl Default for HuaweiCloudConfig {
    fn default() -> Self {
        Self {
            access_key_id: String::new(),
            secret_access_key: String::new(),
            security_token: None,
            region: String::from("cn-north-4"),
            iam_endpoint: String::from("https://iam.myhuaweicloud.com"),
            obs_endpoint: String::from("https://obs.cn-north-4.myhuaweicloud.com"),
            retry_max_attempts: 3,
            retry_min_delay_ms: 500,
            retry_max_delay_ms: 10_000,
            retry_fixed_delay: false,
            token_duration_seconds: 1800,
            chunk_size_mb: 500,
            connect_timeout_ms: 10_000,
            request_timeout_ms: 300_000,
            delete_secret_on_deprovision: true,
            log_level: String::from("info"),
        }
    }
}

impl fmt::Debug for HuaweiCloudConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuaweiCloudConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "security_token",
                &self.security_token.as_ref().map(|_| "<redacted>"),
            )
            .field("region", &self.region)
            .field("iam_endpoint", &self.iam_endpoint)
            .field("obs_endpoint", &self.obs_endpoint)
            .field("retry_max_attempts", &self.retry_max_attempts)
            .field("retry_min_delay_ms", &self.retry_min_delay_ms)
            .field("retry_max_delay_ms", &self.retry_max_delay_ms)
            .field("retry_fixed_delay", &self.retry_fixed_delay)
            .field("token_duration_seconds", &self.token_duration_seconds)
            .field("chunk_size_mb", &self.chunk_size_mb)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field(
                "delete_secret_on_deprovision",
                &self.delete_secret_on_deprovision,
            )
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl HuaweiCloudConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `HUAWEICLOUD_ACCESS_KEY_ID` | *(empty)* |
    /// | `HUAWEICLOUD_SECRET_ACCESS_KEY` | *(empty)* |
    /// | `HUAWEICLOUD_SECURITY_TOKEN` | *(unset)* |
    /// | `HUAWEICLOUD_REGION` | `cn-north-4` |
    /// | `HUAWEICLOUD_IAM_ENDPOINT` | `https://iam.myhuaweicloud.com` |
    /// | `HUAWEICLOUD_OBS_ENDPOINT` | `https://obs.cn-north-4.myhuaweicloud.com` |
    /// | `OBS_PROVISION_RETRY_ATTEMPTS` | `3` |
    /// | `OBS_PROVISION_RETRY_MIN_DELAY_MS` | `500` |
    /// | `OBS_PROVISION_RETRY_MAX_DELAY_MS` | `10000` |
    /// | `OBS_PROVISION_RETRY_FIXED` | `false` |
    /// | `OBS_TOKEN_DURATION_SECONDS` | `1800` |
    /// | `OBS_CHUNK_SIZE_MB` | `500` |
    /// | `OBS_CONNECT_TIMEOUT_MS` | `10000` |
    /// | `OBS_REQUEST_TIMEOUT_MS` | `300000` |
    /// | `OBS_DELETE_SECRET_ON_DEPROVISION` | `true` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("HUAWEICLOUD_ACCESS_KEY_ID") {
            config.access_key_id = v;
        }
        if let Ok(v) = std::env::var("HUAWEICLOUD_SECRET_ACCESS_KEY") {
            config.secret_access_key = v;
        }
        if let Ok(v) = std::env::var("HUAWEICLOUD_SECURITY_TOKEN") {
            if !v.is_empty() {
                config.security_token = Some(v);
            }
        }
        if let Ok(v) = std::env::var("HUAWEICLOUD_REGION") {
            config.region = v;
        }
        if let Ok(v) = std::env::var("HUAWEICLOUD_IAM_ENDPOINT") {
            config.iam_endpoint = v;
        }
        if let Ok(v) = std::env::var("HUAWEICLOUD_OBS_ENDPOINT") {
            config.obs_endpoint = v;
        }
        if let Some(n) = parse_env("OBS_PROVISION_RETRY_ATTEMPTS") {
            config.retry_max_attempts = n;
        }
        if let Some(n) = parse_env("OBS_PROVISION_RETRY_MIN_DELAY_MS") {
            config.retry_min_delay_ms = n;
        }
        if let Some(n) = parse_env("OBS_PROVISION_RETRY_MAX_DELAY_MS") {
            config.retry_max_delay_ms = n;
        }
        if let Ok(v) = std::env::var("OBS_PROVISION_RETRY_FIXED") {
            config.retry_fixed_delay = parse_bool(&v);
        }
        if let Some(n) = parse_env("OBS_TOKEN_DURATION_SECONDS") {
            config.token_duration_seconds = n;
        }
        if let Some(n) = parse_env("OBS_CHUNK_SIZE_MB") {
            config.chunk_size_mb = n;
        }
        if let Some(n) = parse_env("OBS_CONNECT_TIMEOUT_MS") {
            config.connect_timeout_ms = n;
        }
        if let Some(n) = parse_env("OBS_REQUEST_TIMEOUT_MS") {
            config.request_timeout_ms = n;
        }
        if let Ok(v) = std::env::var("OBS_DELETE_SECRET_ON_DEPROVISION") {
            config.delete_secret_on_deprovision = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Multipart chunk size in bytes. Never zero.
    #[must_use]
    pub fn chunk_size_bytes(&self) -> usize {
        let bytes = self.chunk_size_mb.max(1).saturating_mul(MIB);
        usize::try_from(bytes).unwrap_or(usize::MAX)
    }

    /// Connect timeout as a [`Duration`].
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
