//! Harness configuration
//!
//! Layered in increasing precedence: built-in defaults, an optional TOML
//! file, `SHOPCHECK_*` environment variables, then command-line flags
//! (applied by the binary).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{HarnessError, HarnessResult};

pub const ENV_BASE_URL: &str = "SHOPCHECK_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "SHOPCHECK_TIMEOUT_SECS";
pub const ENV_BEARER_TOKEN: &str = "SHOPCHECK_BEARER_TOKEN";
pub const ENV_API_KEY: &str = "SHOPCHECK_API_KEY";

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// API root, e.g. `http://localhost:3000/v1/api`
    pub base_url: String,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Credentials attached to every request
    pub auth: AuthConfig,

    /// Where the runner writes its JSON results
    pub output_dir: PathBuf,

    /// How long to wait for the backend to answer before the first scenario
    pub startup_timeout_secs: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/v1/api".to_string(),
            timeout_secs: 30,
            auth: AuthConfig::None,
            output_dir: PathBuf::from("test-results"),
            startup_timeout_secs: 30,
        }
    }
}

/// Request authentication
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    #[default]
    None,
    /// `Authorization: Bearer <token>`
    Bearer { token: String },
    /// `X-API-KEY: <key>`
    ApiKey { key: String },
}

impl HarnessConfig {
    pub fn from_toml_str(raw: &str) -> HarnessResult<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Overlay `SHOPCHECK_*` variables from the process environment.
    pub fn apply_env(&mut self) -> HarnessResult<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay variables from an arbitrary lookup. A bearer token wins over
    /// an API key when both are set.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> HarnessResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw
                .trim()
                .parse()
                .map_err(|_| HarnessError::InvalidConfig(format!("{}={} is not a number of seconds", ENV_TIMEOUT_SECS, raw)))?;
        }

        if let Some(key) = lookup(ENV_API_KEY) {
            self.auth = AuthConfig::ApiKey { key };
        }
        if let Some(token) = lookup(ENV_BEARER_TOKEN) {
            self.auth = AuthConfig::Bearer { token };
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(HarnessError::InvalidConfig("base_url is empty".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(HarnessError::InvalidConfig(format!(
                "base_url {} must be an http(s) URL",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(HarnessError::InvalidConfig("timeout_secs must be > 0".into()));
        }
        match &self.auth {
            AuthConfig::Bearer { token } if token.is_empty() => {
                Err(HarnessError::InvalidConfig("bearer token is empty".into()))
            }
            AuthConfig::ApiKey { key } if key.is_empty() => {
                Err(HarnessError::InvalidConfig("api key is empty".into()))
            }
            _ => Ok(()),
        }
    }
}
