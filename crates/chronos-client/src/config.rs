//! Client configuration.
//!
//! Loaded from TOML, e.g.
//!
//! ```toml
//! url = "http://chronos-1:4400,chronos-2:4400"
//! request_timeout_secs = 5
//! http_basic_auth_user = "ops"
//! http_basic_password = "secret"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Cluster URL; the host part may list several `host:port` entries.
    pub url: String,
    /// Timeout applied to every request, whichever member it targets.
    pub request_timeout_secs: u64,
    pub http_basic_auth_user: Option<String>,
    pub http_basic_password: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            http_basic_auth_user: None,
            http_basic_password: None,
        }
    }
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn from_file(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ClientResult<Self> {
        let config: ClientConfig =
            toml::from_str(content).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn with_basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.http_basic_auth_user = Some(user.into());
        self.http_basic_password = Some(password.into());
        self
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(ClientError::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Basic auth credentials, present only when a user is configured.
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        let user = self.http_basic_auth_user.as_deref().filter(|u| !u.is_empty())?;
        Some((user, self.http_basic_password.as_deref().unwrap_or_default()))
    }
}
