//! Configuration management for session-vault.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file (JSON)
//! 3. Default values
//!
//! There is deliberately no process-global configuration: a [`Config`]
//! is constructed at startup and handed to the
//! [`SessionManager`](crate::SessionManager) that owns it.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Session configuration.
    pub session: SessionSection,
    /// Expired-entry collection configuration.
    pub gc: GcSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Session configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Name of the cookie carrying the session id.
    pub cookie_name: String,
    /// Idle time, in seconds, after which a session expires.
    pub ttl_secs: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            cookie_name: "SESSIONID".to_string(),
            ttl_secs: 60 * 15,
        }
    }
}

/// Expired-entry collection section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GcSection {
    /// Seconds between sweeps of the storage engine.
    pub interval_secs: u64,
}

impl Default for GcSection {
    fn default() -> Self {
        Self { interval_secs: 1 }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(name) = std::env::var("SESSION_VAULT_COOKIE_NAME") {
            if !name.is_empty() {
                self.session.cookie_name = name;
            }
        }

        if let Ok(ttl) = std::env::var("SESSION_VAULT_TTL_SECS") {
            if let Ok(ttl) = ttl.parse() {
                self.session.ttl_secs = ttl;
            }
        }

        if let Ok(interval) = std::env::var("SESSION_VAULT_GC_INTERVAL_SECS") {
            if let Ok(interval) = interval.parse() {
                self.gc.interval_secs = interval;
            }
        }

        if let Ok(level) = std::env::var("SESSION_VAULT_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Load configuration with the full priority chain.
    ///
    /// Priority: env vars > config file > defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env();
        config.validate()?;

        Ok(config)
    }

    /// Check the configuration for values the core cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.ttl_secs == 0 {
            return Err(ConfigError::ZeroDuration("session.ttl_secs"));
        }
        if self.gc.interval_secs == 0 {
            return Err(ConfigError::ZeroDuration("gc.interval_secs"));
        }
        Ok(())
    }

    /// Session time-to-live as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.session.ttl_secs)
    }

    /// Sweep cadence as a [`Duration`].
    pub fn gc_interval(&self) -> Duration {
        Duration::from_secs(self.gc.interval_secs)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// A duration field was set to zero.
    ZeroDuration(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::ZeroDuration(field) => write!(f, "{} must be greater than zero", field),
        }
    }
}

impl std::error::Error for ConfigError {}
