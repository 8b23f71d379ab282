//! TOML-based configuration for the controller.
//!
//! Reads and writes [`ControllerConfig`] in the platform-appropriate config
//! directory:
//! - Windows:  `%APPDATA%\Slate\controller.toml`
//! - Linux:    `~/.config/slate/controller.toml`
//! - macOS:    `~/Library/Application Support/Slate/controller.toml`
//!
//! The session token lives next to it in `session.toml` (see
//! `token_store`).
//!
//! ```toml
//! [host]
//! base_url = "http://192.168.1.20:8000"
//! ws_path = "/ws"
//! request_timeout_secs = 10
//!
//! [reconnect]
//! initial_delay_ms = 1000
//! multiplier = 2
//! max_delay_ms = 30000
//!
//! [controller]
//! log_level = "info"
//! ```
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "...")]`, so a file that only
//! sets `base_url` is valid and an absent file yields the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use slate_core::protocol::http::WS_PATH;
use slate_core::BackoffPolicy;
use thiserror::Error;
use url::Url;

/// Name of the config file inside [`config_dir`].
pub const CONFIG_FILE_NAME: &str = "controller.toml";
/// Name of the session token file inside [`config_dir`].
pub const TOKEN_FILE_NAME: &str = "session.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// `base_url` is not an http(s) URL.
    #[error("invalid host base URL {url:?}: {reason}")]
    InvalidHostUrl { url: String, reason: String },

    /// A `[reconnect]` value would let the delay shrink or vanish.
    #[error("invalid [reconnect] setting: {0}")]
    InvalidReconnect(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level controller configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ControllerConfig {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub controller: ControllerSection,
}

/// Where the host lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    /// Base URL of the host's API server (`http://ip:port`).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the WebSocket endpoint on the same server.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
    /// Per-request timeout for REST calls and the WebSocket open.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Reconnect backoff curve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconnectConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

/// General controller behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControllerSection {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_ws_path() -> String {
    WS_PATH.to_string()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_initial_delay_ms() -> u64 {
    1000
}
fn default_multiplier() -> u32 {
    2
}
fn default_max_delay_ms() -> u64 {
    30_000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_path: default_ws_path(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            multiplier: default_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for ControllerSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// ── Derived values ────────────────────────────────────────────────────────────

impl ControllerConfig {
    /// Parses `host.base_url`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidHostUrl`] if it is not an absolute http(s) URL.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidHostUrl {
            url: self.host.base_url.clone(),
            reason,
        };
        let url = Url::parse(&self.host.base_url).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme {other:?}"))),
        }
    }

    /// The WebSocket URL: `http` → `ws`, `https` → `wss`, path = `ws_path`.
    ///
    /// # Errors
    ///
    /// Same as [`ControllerConfig::base_url`].
    pub fn ws_url(&self) -> Result<Url, ConfigError> {
        let mut url = self.base_url()?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme).map_err(|()| ConfigError::InvalidHostUrl {
            url: self.host.base_url.clone(),
            reason: format!("cannot switch scheme to {scheme}"),
        })?;
        url.set_path(&self.host.ws_path);
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.host.request_timeout_secs)
    }

    /// Checks the values serde cannot: a zero initial delay or a multiplier
    /// below 1 would turn reconnects into a busy loop.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidReconnect`] naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reconnect.initial_delay_ms == 0 {
            return Err(ConfigError::InvalidReconnect(
                "initial_delay_ms must be at least 1".to_string(),
            ));
        }
        if self.reconnect.multiplier < 1 {
            return Err(ConfigError::InvalidReconnect(
                "multiplier must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The reconnect curve.  Values that skipped [`validate`](Self::validate)
    /// are clamped to a 1 ms initial delay and a multiplier of 1.
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial: Duration::from_millis(self.reconnect.initial_delay_ms.max(1)),
            multiplier: self.reconnect.multiplier.max(1),
            max: Duration::from_millis(self.reconnect.max_delay_ms),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config files.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the default path of the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolves the default path of the session token file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn token_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(TOKEN_FILE_NAME))
}

/// Loads the config from `path`, returning the defaults if the file does
/// not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] if the TOML is malformed, and
/// [`ConfigError::InvalidReconnect`] if the backoff values are unusable.
pub fn load_config(path: &Path) -> Result<ControllerConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let config: ControllerConfig = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ControllerConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &ControllerConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory plus the `Slate` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Slate"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("slate"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Slate")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
