//! Portal configuration.

use std::path::PathBuf;
use std::time::Duration;

use placement_api::DEFAULT_BASE_URL;

use crate::PortalError;

/// Environment variable for the API gateway base URL.
pub const ENV_API_URL: &str = "PLACEMENT_API_URL";
/// Environment variable for the request timeout, in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "PLACEMENT_TIMEOUT_SECS";
/// Environment variable for the session file path.
pub const ENV_SESSION_FILE: &str = "PLACEMENT_SESSION_FILE";

/// Settings for a [`Portal`](crate::Portal).
///
/// Start from `PortalConfig::default()` (or [`from_env`](Self::from_env))
/// and override what you need with the builder-style setters:
///
/// ```rust
/// use std::time::Duration;
/// use placement::PortalConfig;
///
/// let config = PortalConfig::default()
///     .api_url("https://placement.example.edu/api")
///     .timeout(Duration::from_secs(5));
/// assert_eq!(config.timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// Base URL of the API gateway, e.g. `http://127.0.0.1:8000/api`.
    pub api_url: String,

    /// Per-request timeout. Default: 10 seconds.
    pub timeout: Duration,

    /// Where [`FileStorage`](placement_session::FileStorage) keeps the
    /// session. `None` means the host picks the storage.
    pub session_file: Option<PathBuf>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            session_file: None,
        }
    }
}

impl PortalConfig {
    /// Defaults, overridden by `PLACEMENT_API_URL`,
    /// `PLACEMENT_TIMEOUT_SECS`, and `PLACEMENT_SESSION_FILE` when set.
    ///
    /// # Errors
    /// Returns [`PortalError::Config`] if the timeout isn't a positive
    /// whole number of seconds.
    pub fn from_env() -> Result<Self, PortalError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading values from `lookup`.
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PortalError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = var(ENV_API_URL) {
            config.api_url = url.trim().to_string();
        }

        if let Some(raw) = var(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|e| {
                PortalError::Config(format!("{ENV_TIMEOUT_SECS}={raw:?}: {e}"))
            })?;
            if secs == 0 {
                return Err(PortalError::Config(format!(
                    "{ENV_TIMEOUT_SECS} must be at least 1"
                )));
            }
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(path) = var(ENV_SESSION_FILE) {
            config.session_file = Some(PathBuf::from(path));
        }

        tracing::debug!(
            api_url = %config.api_url,
            timeout_secs = config.timeout.as_secs(),
            session_file = ?config.session_file,
            "loaded portal configuration"
        );
        Ok(config)
    }

    /// Sets the API gateway base URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the session file path.
    pub fn session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }
}
