//! Application configuration
//!
//! Layering: built-in defaults, then an optional TOML file, then `QUILL_*`
//! environment variables, then `validate()`.
//!
//! ```toml
//! api_base = "https://api.example.com"
//! realtime_url = "wss://api.example.com/ws"
//! host_origin = "https://app.example.com"
//!
//! [throttle]
//! submit_ticket_ms = 2000
//! ```

use crate::bus::DEFAULT_MAX_DISPATCH_DEPTH;
use crate::errors::QuillError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "QUILL_";

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config file {path}: {reason}")]
    Read {
        /// File path
        path: String,
        /// I/O error text
        reason: String,
    },
    /// The config document is not valid TOML for this schema
    #[error("invalid config document: {0}")]
    Parse(String),
    /// A key is not part of the schema
    #[error("unknown config key: {0}")]
    UnknownKey(String),
    /// A value could not be parsed for its key
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// Config key
        key: String,
        /// Offending value
        value: String,
    },
    /// Semantic validation failed
    #[error("config validation failed: {0}")]
    Invalid(String),
}

impl From<ConfigError> for QuillError {
    fn from(err: ConfigError) -> Self {
        QuillError::invalid(err.to_string())
    }
}

/// Minimum intervals between cross-context requests of each kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub submit_ticket_ms: u64,
    pub reload_history_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            submit_ticket_ms: 2_000,
            reload_history_ms: 1_000,
        }
    }
}

/// Top-level client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL prepended to every request path by the transport
    pub api_base: String,
    /// Realtime channel endpoint
    pub realtime_url: String,
    /// Origin the host page runs under; embedded envelopes from any other
    /// origin are dropped
    pub host_origin: String,
    /// Avatar used when the server sends none
    pub placeholder_avatar: String,
    /// Fixed delay before reconnecting the realtime channel
    pub reconnect_delay_ms: u64,
    /// Persisted sessions older than this are discarded on boot
    pub session_max_age_ms: u64,
    /// Posts requested per feed page
    pub feed_page_size: u32,
    /// Bound on nested bus dispatches
    pub max_dispatch_depth: usize,
    pub throttle: ThrottleConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: "/api".to_string(),
            realtime_url: "/ws".to_string(),
            host_origin: "http://localhost:8080".to_string(),
            placeholder_avatar: "/images/avatar-placeholder.png".to_string(),
            reconnect_delay_ms: 3_000,
            session_max_age_ms: 24 * 60 * 60 * 1_000,
            feed_page_size: 10,
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
            throttle: ThrottleConfig::default(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}

impl AppConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        toml::from_str(document).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `QUILL_*` overrides from the process environment.
    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply `QUILL_*` overrides from an explicit variable list.
    ///
    /// `QUILL_API_BASE` maps to `api_base`, `QUILL_THROTTLE_SUBMIT_TICKET_MS`
    /// to `throttle.submit_ticket_ms`. `QUILL_LOG` belongs to the logging
    /// setup and is skipped. Unknown keys are an error.
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let name = name.to_ascii_lowercase();
            if name == "log" {
                continue;
            }
            let name = match name.strip_prefix("throttle_") {
                Some(rest) => format!("throttle.{rest}"),
                None => name,
            };
            self.set_from_string(&name, value.as_ref())?;
        }
        Ok(())
    }

    /// Set one value by its dotted key.
    pub fn set_from_string(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "api_base" => self.api_base = value.to_string(),
            "realtime_url" => self.realtime_url = value.to_string(),
            "host_origin" => self.host_origin = value.to_string(),
            "placeholder_avatar" => self.placeholder_avatar = value.to_string(),
            "reconnect_delay_ms" => self.reconnect_delay_ms = parse_number(key, value)?,
            "session_max_age_ms" => self.session_max_age_ms = parse_number(key, value)?,
            "feed_page_size" => self.feed_page_size = parse_number(key, value)?,
            "max_dispatch_depth" => self.max_dispatch_depth = parse_number(key, value)?,
            "throttle.submit_ticket_ms" => {
                self.throttle.submit_ticket_ms = parse_number(key, value)?
            }
            "throttle.reload_history_ms" => {
                self.throttle.reload_history_ms = parse_number(key, value)?
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base must not be empty".into()));
        }
        if self.realtime_url.trim().is_empty() {
            return Err(ConfigError::Invalid("realtime_url must not be empty".into()));
        }
        if self.placeholder_avatar.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "placeholder_avatar must not be empty".into(),
            ));
        }
        if !(self.host_origin.starts_with("http://") || self.host_origin.starts_with("https://"))
        {
            return Err(ConfigError::Invalid(format!(
                "host_origin must be an http(s) origin, got {}",
                self.host_origin
            )));
        }
        if self.reconnect_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "reconnect_delay_ms must be positive".into(),
            ));
        }
        if self.feed_page_size == 0 {
            return Err(ConfigError::Invalid("feed_page_size must be positive".into()));
        }
        if self.max_dispatch_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_dispatch_depth must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}
