//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/eventflow/config.toml` by default. Every section is optional.
//!
//! ```toml
//! credential_path = "/home/me/.local/share/eventflow/credential.json"
//!
//! [api]
//! base_url = "https://calendar.example.com/api/"
//! timeout_secs = 10
//!
//! [calendar]
//! occurrence_limit = 100
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use eventflow_engine::{ControllerConfig, DEFAULT_OCCURRENCE_LIMIT};
use eventflow_remote::{ApiConfig, CredentialStore, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Configuration for the eventflow client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Where the session credential is kept. Defaults to the data directory.
    pub credential_path: Option<PathBuf>,

    pub api: ApiSettings,

    pub calendar: CalendarSettings,
}

/// Event store connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Most occurrences fetched per recurring series.
    pub occurrence_limit: usize,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            occurrence_limit: DEFAULT_OCCURRENCE_LIMIT,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if there is no
    /// file there.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ClientResult<Self> {
        toml::from_str(content).map_err(|e| ClientError::Config(format!("failed to parse config: {}", e)))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eventflow")
    }

    /// The credential file in use: the configured one, or the default.
    pub fn credential_path(&self) -> PathBuf {
        self.credential_path
            .clone()
            .unwrap_or_else(CredentialStore::default_path)
    }

    /// Applies command-line overrides for the API section.
    pub fn with_overrides(mut self, base_url: Option<String>, timeout_secs: Option<u64>) -> Self {
        if let Some(base_url) = base_url {
            self.api.base_url = base_url;
        }
        if let Some(timeout_secs) = timeout_secs {
            self.api.timeout_secs = timeout_secs;
        }
        self
    }

    pub fn api_config(&self) -> ClientResult<ApiConfig> {
        if self.api.timeout_secs == 0 {
            return Err(ClientError::Config(
                "api.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(ApiConfig::parse(&self.api.base_url)?
            .with_timeout(Duration::from_secs(self.api.timeout_secs)))
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig::default().with_occurrence_limit(self.calendar.occurrence_limit)
    }
}
