//! Client configuration
//!
//! A [`ClientConfig`] can be built in code, loaded from a YAML or JSON file,
//! or read from `LIGHTSPEED_*` environment variables.
//!
//! ```yaml
//! cluster: us1
//! language: us
//! api_key: xxxx
//! api_secret: xxxx
//! retry:
//!   max_retries: 5
//!   base_delay_ms: 1000
//! ```

use crate::auth::Credentials;
use crate::error::{Error, Result};
use crate::types::Cluster;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Environment variable names read by [`ClientConfig::from_env`]
pub mod env {
    pub const CLUSTER: &str = "LIGHTSPEED_CLUSTER";
    pub const LANGUAGE: &str = "LIGHTSPEED_LANGUAGE";
    pub const API_KEY: &str = "LIGHTSPEED_API_KEY";
    pub const API_SECRET: &str = "LIGHTSPEED_API_SECRET";
    pub const BASE_URL: &str = "LIGHTSPEED_BASE_URL";
}

// ============================================================================
// Client Config
// ============================================================================

/// Everything needed to construct an [`EcomClient`](crate::http::EcomClient)
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API cluster (EU1 or US1)
    pub cluster: Cluster,

    /// Shop language segment, e.g. "us" or "nl"
    pub language: String,

    /// API key
    pub api_key: String,

    /// API secret
    pub api_secret: String,

    /// Override for the cluster host (proxies, tests)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetrySettings,

    /// Fail instead of sleeping longer than this when a window is exhausted
    #[serde(default)]
    pub max_throttle_wait_secs: Option<u64>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("lightspeed-ecom/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    /// Create a config with default settings
    pub fn new(
        cluster: Cluster,
        language: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cluster,
            language: language.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            retry: RetrySettings::default(),
            max_throttle_wait_secs: None,
        }
    }

    /// Load a config file; `.json` files are parsed as JSON, anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            _ => serde_yaml::from_str(&contents)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Read the config from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the config through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| lookup(name).ok_or_else(|| Error::missing_field(name));

        let cluster = require(env::CLUSTER)?.parse()?;
        let mut config = Self::new(
            cluster,
            require(env::LANGUAGE)?,
            require(env::API_KEY)?,
            require(env::API_SECRET)?,
        );
        config.base_url = lookup(env::BASE_URL);

        config.validate()?;
        Ok(config)
    }

    /// Check required fields and URL syntax
    pub fn validate(&self) -> Result<()> {
        if self.language.trim_matches('/').trim().is_empty() {
            return Err(Error::missing_field("language"));
        }
        if self.api_key.is_empty() {
            return Err(Error::missing_field("api_key"));
        }
        if self.api_secret.is_empty() {
            return Err(Error::missing_field("api_secret"));
        }
        if let Some(base_url) = &self.base_url {
            Url::parse(base_url).map_err(|e| Error::invalid_value("base_url", e.to_string()))?;
        }
        if self.timeout_secs == 0 {
            return Err(Error::invalid_value("timeout_secs", "must be positive"));
        }
        Ok(())
    }

    /// Base URL including the language segment, always ending in `/`
    pub fn endpoint(&self) -> Result<Url> {
        let host = self
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.cluster.base_url());
        let host = format!("{}/", host.trim_end_matches('/'));
        let language = format!("{}/", self.language.trim_matches('/'));

        Ok(Url::parse(&host)?.join(&language)?)
    }

    /// API credentials
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.api_key, &self.api_secret)
    }

    /// Per-attempt timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Throttle wait limit
    pub fn max_throttle_wait(&self) -> Option<Duration> {
        self.max_throttle_wait_secs.map(Duration::from_secs)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("cluster", &self.cluster)
            .field("language", &self.language)
            .field("api_key", &self.api_key)
            .field("api_secret", &"***")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("retry", &self.retry)
            .field("max_throttle_wait_secs", &self.max_throttle_wait_secs)
            .finish()
    }
}

// ============================================================================
// Retry Settings
// ============================================================================

/// Retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff unit in milliseconds; the n-th retry waits n times this
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}
