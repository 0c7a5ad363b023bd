//! Client configuration.
//!
//! The library never reads the environment on its own; `from_env` exists for
//! binaries and tests that want to.

use std::time::Duration;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://www.formstack.com/api/v2/";

pub const ENV_ACCESS_TOKEN: &str = "FORMSTACK_ACCESS_TOKEN";
pub const ENV_BASE_URL: &str = "FORMSTACK_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "FORMSTACK_TIMEOUT_SECS";

#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub access_token: String,
    pub base_url: String,
    /// Passed to the transport as-is. `None` keeps the transport default.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Read `FORMSTACK_ACCESS_TOKEN` (required), `FORMSTACK_API_URL` and
    /// `FORMSTACK_TIMEOUT_SECS` (optional).
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let token = lookup(ENV_ACCESS_TOKEN)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Config(format!("{ENV_ACCESS_TOKEN} is not set")))?;
        let mut config = Self::new(token);
        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.is_empty()) {
            config.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ApiError::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds")))?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

// The token stays out of logs and panic messages.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("access_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
