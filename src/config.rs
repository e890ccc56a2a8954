//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.eggteto/config.toml` (user)
//! 3. `/etc/eggteto/config.toml` (system)
//! 4. built-in defaults
//!
//! The API key is loaded separately:
//! 1. `~/.eggteto/secrets.toml` (user, must be 0600)
//! 2. `/etc/eggteto/secrets.toml` (system, must be 0600)
//! 3. `GEMINI_API_KEY`, then `API_KEY` environment variables

use serde::Deserialize;
use tracing::warn;
use std::fs;
use std::path::{Path, PathBuf};

use crate::presentation::MAX_BAR_WIDTH;
use crate::providers::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT};
use crate::{EggtetoError, Result};

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub camera: CameraConfig,
}

/// Classification service settings.
///
/// Sampling temperature is fixed with the prompt and is not configurable.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Model name (default: gemini-2.5-flash).
    #[serde(default = "default_model")]
    pub model: String,
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

/// Terminal rendering settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Use ANSI colors (default: true; ignored when stdout is not a terminal).
    #[serde(default = "default_color")]
    pub color: bool,
    /// Confidence bar width in cells (default: 24).
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: default_color(),
            bar_width: default_bar_width(),
        }
    }
}

fn default_color() -> bool {
    true
}

fn default_bar_width() -> usize {
    crate::presentation::DEFAULT_BAR_WIDTH
}

/// Camera settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CameraConfig {
    /// Explicit device path; when absent a front-facing device is preferred.
    #[serde(default)]
    pub device: Option<String>,
}

/// Secrets configuration (API key).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub gemini: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist. Without one, the first existing
    /// standard file wins, and defaults apply when none exists.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EggtetoError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            EggtetoError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the renderer or client cannot use.
    pub fn validate(&self) -> Result<()> {
        let width = self.display.bar_width;
        if !(1..=MAX_BAR_WIDTH).contains(&width) {
            return Err(EggtetoError::Configuration(format!(
                "display.bar_width must be between 1 and {MAX_BAR_WIDTH}, got {width}"
            )));
        }
        if self.service.timeout_secs == 0 {
            return Err(EggtetoError::Configuration(
                "service.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(EggtetoError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".eggteto").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/eggteto/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Never fails: an unreadable, unparsable or insecure file is logged
    /// and skipped, so the key falls back to the environment and a missing
    /// key surfaces as `ServiceUnavailable` on the first classification.
    pub fn load() -> Self {
        Self::load_from_home(dirs::home_dir().as_deref())
    }

    /// Like [`Secrets::load`], resolving the user file under `home`.
    pub fn load_from_home(home: Option<&Path>) -> Self {
        let candidates = home
            .map(|h| h.join(".eggteto").join("secrets.toml"))
            .into_iter()
            .chain(std::iter::once(PathBuf::from("/etc/eggteto/secrets.toml")));

        for path in candidates {
            if !path.exists() {
                continue;
            }
            return match Self::load_from_file(&path) {
                Ok(secrets) => secrets,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring secrets file");
                    Secrets::default()
                }
            };
        }

        Secrets::default()
    }

    /// Load a secrets file, rejecting it when group or others can read it.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            EggtetoError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            EggtetoError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            EggtetoError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(EggtetoError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// API key from the secrets file, falling back to the environment.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with(|name| std::env::var(name).ok())
    }

    /// Like [`Secrets::api_key`], with an injectable environment lookup.
    pub fn api_key_with(&self, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        self.gemini
            .as_ref()
            .map(|s| s.api_key.clone())
            .or_else(|| API_KEY_ENV_VARS.iter().find_map(|name| env(name)))
            .filter(|key| !key.trim().is_empty())
    }
}
