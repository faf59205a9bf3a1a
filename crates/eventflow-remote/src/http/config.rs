//! HTTP client configuration.

use std::sync::LazyLock;
use std::time::Duration;

use url::Url;

use crate::error::{RemoteError, RemoteResult};

/// Where a development store listens by default.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/";

static DEFAULT_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse(DEFAULT_BASE_URL).expect("Invalid default base URL"));

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Root of the store API. Always ends in `/` so endpoint paths join under it.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_URL.clone(),
            timeout: Duration::from_secs(30),
            user_agent: format!("eventflow/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiConfig {
    /// Parses `base_url` and returns a config pointing at it.
    pub fn parse(base_url: &str) -> RemoteResult<Self> {
        let url = Url::parse(base_url).map_err(|e| {
            RemoteError::configuration(format!("invalid base URL '{}': {}", base_url, e))
        })?;
        Ok(Self::default().with_base_url(url))
    }

    pub fn with_base_url(mut self, mut url: Url) -> Self {
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        self.base_url = url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Resolves an endpoint path such as `events/3/` against the base URL.
    pub fn endpoint(&self, path: &str) -> RemoteResult<Url> {
        self.base_url.join(path).map_err(|e| {
            RemoteError::configuration(format!("invalid endpoint '{}': {}", path, e))
        })
    }
}
