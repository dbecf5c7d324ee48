//! Runtime configuration
//!
//! Layered: crate defaults, then `<config_dir>/bitbond/config.toml` if it
//! exists, then `BITBOND_*` environment variables. The API base URL has no
//! default.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::{
    MESSAGE_POLL_INTERVAL_MS, NOTIFICATION_POLL_INTERVAL_MS, POLL_GUARD_WINDOW_MS, SWIPE_THRESHOLD,
};

pub const ENV_BASE_URL: &str = "BITBOND_API_BASE_URL";
pub const ENV_MESSAGE_POLL_MS: &str = "BITBOND_MESSAGE_POLL_MS";
pub const ENV_NOTIFICATION_POLL_MS: &str = "BITBOND_NOTIFICATION_POLL_MS";
pub const ENV_SESSION_COOKIE: &str = "BITBOND_SESSION_COOKIE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No API base URL configured (set BITBOND_API_BASE_URL or api_base_url in config.toml)")]
    MissingBaseUrl,

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{var} must be a whole number of milliseconds, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("Swipe threshold must be a positive number, got {0}")]
    InvalidThreshold(f32),

    #[error("Poll guard window ({guard:?}) must be shorter than both poll intervals")]
    GuardTooLong { guard: Duration },
}

/// On-disk form; every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    api_base_url: Option<String>,
    message_poll_ms: Option<u64>,
    notification_poll_ms: Option<u64>,
    poll_guard_ms: Option<u64>,
    swipe_threshold: Option<f32>,
    session_cookie: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub message_poll_interval: Duration,
    pub notification_poll_interval: Duration,
    pub poll_guard_window: Duration,
    pub swipe_threshold: f32,
    /// Raw `Cookie` header value to start with an existing session
    pub session_cookie: Option<String>,
}

impl Config {
    /// Defaults with the given base URL
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            message_poll_interval: Duration::from_millis(MESSAGE_POLL_INTERVAL_MS),
            notification_poll_interval: Duration::from_millis(NOTIFICATION_POLL_INTERVAL_MS),
            poll_guard_window: Duration::from_millis(POLL_GUARD_WINDOW_MS),
            swipe_threshold: SWIPE_THRESHOLD,
            session_cookie: None,
        }
    }

    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bitbond").join("config.toml"))
    }

    /// Load from the default path and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        Self::load_from(path.as_deref(), |var| std::env::var(var).ok())
    }

    /// Load from an explicit file (missing file is fine) and an env lookup
    pub fn load_from(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => read_file(path)?,
            None => ConfigFile::default(),
        };

        let api_base_url = env(ENV_BASE_URL)
            .or(file.api_base_url)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingBaseUrl)?;

        let mut config = Config::with_base_url(api_base_url);

        if let Some(ms) = env_millis(&env, ENV_MESSAGE_POLL_MS)?.or(file.message_poll_ms) {
            config.message_poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = env_millis(&env, ENV_NOTIFICATION_POLL_MS)?.or(file.notification_poll_ms)
        {
            config.notification_poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = file.poll_guard_ms {
            config.poll_guard_window = Duration::from_millis(ms);
        }
        if let Some(threshold) = file.swipe_threshold {
            config.swipe_threshold = threshold;
        }
        config.session_cookie = env(ENV_SESSION_COOKIE)
            .or(file.session_cookie)
            .filter(|c| !c.trim().is_empty());

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.message_poll_interval.is_zero() {
            return Err(ConfigError::Zero("message poll interval"));
        }
        if self.notification_poll_interval.is_zero() {
            return Err(ConfigError::Zero("notification poll interval"));
        }
        if !(self.swipe_threshold.is_finite() && self.swipe_threshold > 0.0) {
            return Err(ConfigError::InvalidThreshold(self.swipe_threshold));
        }
        if self.poll_guard_window >= self.message_poll_interval
            || self.poll_guard_window >= self.notification_poll_interval
        {
            return Err(ConfigError::GuardTooLong {
                guard: self.poll_guard_window,
            });
        }
        Ok(())
    }
}

fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ConfigFile::default()),
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    log::debug!("Config: reading {}", path.display());
    toml::from_str(&text).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

fn env_millis(
    env: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u64>, ConfigError> {
    match env(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
    }
}
