//! Client configuration.
//!
//! Every knob lives in [`ClientConfig`], built via [`ClientConfigBuilder`].
//! The poll policy is part of the client, not of each call: a conversion is
//! always polled with the attempt budget and interval fixed at construction.

use crate::credentials::{ConvertHubCredentials, SIGNUP_URL};
use crate::error::ConvertHubError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::time::Duration;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.converthub.com/v2";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "CONVERTHUB_API_KEY";

/// Environment variable overriding the API root.
pub const BASE_URL_ENV: &str = "CONVERTHUB_BASE_URL";

/// How long to wait for a job to reach a terminal state.
///
/// The default of 150 attempts at 2 s intervals bounds one polling session
/// at roughly five minutes of wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum number of status requests. Default: 150.
    pub max_attempts: u32,
    /// Delay between two status requests. Default: 2000 ms.
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 150,
            interval: Duration::from_millis(2000),
        }
    }
}

impl PollPolicy {
    /// Upper bound on the time spent sleeping between attempts.
    ///
    /// Saturates at [`Duration::MAX`].
    pub fn budget(&self) -> Duration {
        self.interval
            .checked_mul(self.max_attempts)
            .unwrap_or(Duration::MAX)
    }
}

/// Configuration for a [`crate::client::ConvertHubClient`].
///
/// # Example
/// ```rust
/// use converthub::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .api_key("sk_live_123")
///     .request_timeout_secs(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.poll.max_attempts, 150);
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Bearer credential sent on every API request.
    pub credentials: ConvertHubCredentials,

    /// API root, without trailing slash. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Job polling policy.
    pub poll: PollPolicy,

    /// Per-request HTTP timeout in seconds. Default: 120.
    ///
    /// Applies to each status request and to the file download, not to the
    /// polling session as a whole.
    pub request_timeout_secs: u64,

    /// Observer notified as a job is submitted and polled.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .field("poll", &self.poll)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn PollProgressCallback>"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Build a config from `CONVERTHUB_API_KEY` and, if set,
    /// `CONVERTHUB_BASE_URL`.
    pub fn from_env() -> Result<Self, ConvertHubError> {
        let key = std::env::var(API_KEY_ENV).map_err(|_| {
            ConvertHubError::InvalidConfig(format!(
                "{API_KEY_ENV} is not set. Get an API key from {SIGNUP_URL}"
            ))
        })?;
        let mut builder = Self::builder().api_key(key);
        if let Ok(base) = std::env::var(BASE_URL_ENV) {
            if !base.is_empty() {
                builder = builder.base_url(base);
            }
        }
        builder.build()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Default)]
pub struct ClientConfigBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    poll: PollPolicy,
    request_timeout_secs: Option<u64>,
    progress_callback: Option<ProgressCallback>,
}

impl ClientConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.poll.max_attempts = n;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll.interval = interval;
        self
    }

    pub fn poll_policy(mut self, policy: PollPolicy) -> Self {
        self.poll = policy;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs.max(1));
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, ConvertHubError> {
        let key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConvertHubError::InvalidConfig("API key must not be empty".into()))?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        reqwest::Url::parse(&base_url).map_err(|e| {
            ConvertHubError::InvalidConfig(format!("Invalid base URL '{base_url}': {e}"))
        })?;

        if self.poll.max_attempts == 0 {
            return Err(ConvertHubError::InvalidConfig(
                "max_attempts must be ≥ 1".into(),
            ));
        }

        Ok(ClientConfig {
            credentials: ConvertHubCredentials::new(key),
            base_url,
            poll: self.poll,
            request_timeout_secs: self.request_timeout_secs.unwrap_or(120),
            progress_callback: self.progress_callback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ClientConfig::builder().api_key("k").build().unwrap();
        assert_eq!(c.base_url, DEFAULT_BASE_URL);
        assert_eq!(c.poll.max_attempts, 150);
        assert_eq!(c.poll.interval, Duration::from_millis(2000));
        assert_eq!(c.poll.budget(), Duration::from_secs(300));
        assert_eq!(c.request_timeout_secs, 120);
    }

    #[test]
    fn budget_saturates_on_huge_interval() {
        let policy = PollPolicy {
            max_attempts: 150,
            interval: Duration::from_millis(u64::MAX),
        };
        assert_eq!(policy.budget(), Duration::MAX);
    }

    #[test]
    fn empty_key_rejected() {
        let err = ClientConfig::builder().api_key("  ").build().unwrap_err();
        assert!(matches!(err, ConvertHubError::InvalidConfig(_)));
        assert!(ClientConfig::builder().build().is_err());
    }

    #[test]
    fn bad_base_url_rejected() {
        let err = ClientConfig::builder()
            .api_key("k")
            .base_url("not a url")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Invalid base URL"));
    }

    #[test]
    fn zero_attempts_rejected() {
        assert!(ClientConfig::builder()
            .api_key("k")
            .max_attempts(0)
            .build()
            .is_err());
    }

    #[test]
    fn trailing_slash_trimmed() {
        let c = ClientConfig::builder()
            .api_key("k")
            .base_url("http://localhost:8080/v2/")
            .build()
            .unwrap();
        assert_eq!(c.base_url, "http://localhost:8080/v2");
    }

    #[test]
    fn debug_hides_key() {
        let c = ClientConfig::builder().api_key("sk_secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk_secret"), "got: {dbg}");
    }
}
