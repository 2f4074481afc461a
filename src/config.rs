use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{HubError, HubResult};

/// Default hub API base URL, matching the local development backend
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Default file holding the persisted token pair and mock identity
pub const DEFAULT_TOKEN_FILE: &str = "hub.secure.json";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the hub client
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Base URL of the hub API, without a trailing slash
    pub base_url: String,
    /// Path of the persistent token store
    pub token_file: PathBuf,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl HubConfig {
    /// Build a configuration from environment variables, falling back to
    /// defaults. Recognized variables: `HUB_API_URL`, `HUB_TOKEN_FILE`,
    /// `HUB_TIMEOUT_SECS`.
    pub fn from_env() -> HubResult<Self> {
        let base_url = match env::var("HUB_API_URL") {
            Ok(url) => url,
            Err(_) => DEFAULT_API_URL.to_string(),
        };
        let base_url = Self::validate_base_url(&base_url)?;

        let token_file = env::var("HUB_TOKEN_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOKEN_FILE));

        let timeout = match env::var("HUB_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| HubError::Config {
                    key: "HUB_TIMEOUT_SECS".to_string(),
                    reason: format!("'{}' is not a valid number of seconds", raw),
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            base_url,
            token_file,
            timeout,
        })
    }

    /// Override the base URL, normalizing the trailing slash
    pub fn with_base_url(mut self, base_url: &str) -> HubResult<Self> {
        self.base_url = Self::validate_base_url(base_url)?;
        Ok(self)
    }

    fn validate_base_url(raw: &str) -> HubResult<String> {
        let trimmed = raw.trim_end_matches('/');
        reqwest::Url::parse(trimmed).map_err(|e| HubError::Config {
            key: "HUB_API_URL".to_string(),
            reason: format!("'{}' is not a valid URL: {}", raw, e),
        })?;
        Ok(trimmed.to_string())
    }
}
