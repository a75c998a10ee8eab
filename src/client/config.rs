//! Client configuration.

use crate::error::{Error, Result};
use std::time::Duration;

/// Environment variable holding the personal access token.
pub const TOKEN_ENV: &str = "FIGMA_TOKEN";

/// Environment variable overriding the API base URL.
pub const API_BASE_ENV: &str = "FIGMA_API_BASE";

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.figma.com";

/// Settings for [`HttpClient`](super::HttpClient).
#[derive(Clone)]
pub struct ClientConfig {
    /// Personal access token sent as `X-Figma-Token`
    pub token: String,

    /// API base URL without trailing slash
    pub api_base: String,

    /// Timeout for API requests (asset downloads have their own)
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a config with the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: None,
        }
    }

    /// Read the token (and optional API base) from the environment.
    ///
    /// Fails with [`Error::MissingToken`] before any network call when the
    /// token is unset or empty.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = lookup(TOKEN_ENV)
            .filter(|token| !token.trim().is_empty())
            .ok_or(Error::MissingToken(TOKEN_ENV))?;

        let mut config = Self::new(token);
        if let Some(base) = lookup(API_BASE_ENV).filter(|base| !base.is_empty()) {
            config = config.with_api_base(base);
        }
        Ok(config)
    }

    /// Set API base URL.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set timeout for API requests.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
