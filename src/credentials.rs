//! API-key credential for ConvertHub.
//!
//! ConvertHub authenticates with a bearer token. The key is attached to
//! every API request but never to the pre-signed download URL, and never
//! appears in `Debug` output or logs.

use std::fmt;

/// Where users obtain a key.
pub const SIGNUP_URL: &str = "https://converthub.com/api/signup";

/// Endpoint used to verify a key, relative to the API root.
pub const TEST_ENDPOINT: &str = "account";

/// A ConvertHub API key.
#[derive(Clone, PartialEq, Eq)]
pub struct ConvertHubCredentials {
    api_key: String,
}

impl ConvertHubCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    /// Last four characters, for diagnostics.
    pub fn hint(&self) -> String {
        let tail: String = self
            .api_key
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("…{tail}")
    }
}

impl fmt::Debug for ConvertHubCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertHubCredentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header() {
        let c = ConvertHubCredentials::new("abc123");
        assert_eq!(c.bearer(), "Bearer abc123");
    }

    #[test]
    fn debug_redacts() {
        let c = ConvertHubCredentials::new("abc123");
        assert!(!format!("{c:?}").contains("abc123"));
    }

    #[test]
    fn hint_shows_tail_only() {
        assert_eq!(ConvertHubCredentials::new("sk_live_9876").hint(), "…9876");
        assert_eq!(ConvertHubCredentials::new("ab").hint(), "…ab");
    }
}
