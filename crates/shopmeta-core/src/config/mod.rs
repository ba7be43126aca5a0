//! Client configuration for the remote admin API.
//!
//! Resolution order is left to the caller (the CLI layers profile file,
//! environment and flags); this module only validates and normalizes.

use std::time::Duration;

use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

/// Admin API base URL override.
pub const ENV_API_URL: &str = "SHOPMETA_API_URL";
/// Admin API bearer token override.
pub const ENV_API_TOKEN: &str = "SHOPMETA_API_TOKEN";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Validated connection settings for `HttpEntityApi`.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    api_token: Option<String>,
    timeout: Duration,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Build a config, normalizing the base URL.
    ///
    /// The URL must carry an http(s) scheme; a trailing slash or a trailing
    /// `/admin` segment is stripped since request paths add it.
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url.into())?,
            api_token: normalize_text_option(api_token),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        })
    }

    /// Build from `SHOPMETA_API_URL` / `SHOPMETA_API_TOKEN`.
    ///
    /// Returns `Ok(None)` when no URL is set.
    pub fn from_env() -> Result<Option<Self>> {
        parse_config(|key| std::env::var(key).ok())
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn parse_config(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<ClientConfig>> {
    let Some(base_url) = normalize_text_option(lookup(ENV_API_URL)) else {
        return Ok(None);
    };
    ClientConfig::new(base_url, lookup(ENV_API_TOKEN)).map(Some)
}

fn normalize_base_url(raw: String) -> Result<String> {
    let url = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::Configuration("API base URL must not be empty".to_string()))?;
    if !is_http_url(&url) {
        return Err(Error::Configuration(
            "API base URL must include http:// or https://".to_string(),
        ));
    }
    let url = url.trim_end_matches('/');
    let url = url.strip_suffix("/admin").unwrap_or(url);
    Ok(url.trim_end_matches('/').to_string())
}
