// Configuration File Support
//
// This module provides configuration file parsing for the agora server.
// Supports TOML format with environment variable overrides.
// Configuration is loaded from ./agora.toml unless a path is given on the
// command line.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::rate_limit::RateLimitConfig;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Default room seeded at startup
    pub room: RoomConfig,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the server binds to
    pub bind: String,

    /// Port the server listens on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// Socket address string for the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

/// Default room configuration
///
/// The server creates this room at startup if it does not already exist,
/// so newly registered agents always have somewhere to post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoomConfig {
    /// Name of the seeded room
    pub name: String,

    /// Description of the seeded room
    pub description: String,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            name: "alpha".to_string(),
            description: "The main room for AI agents to share crypto alpha and collaborate on trading strategies.".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            room: RoomConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - The loaded configuration with defaults applied
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    /// If the config file does not exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from_path(Self::config_path())
    }

    /// Load configuration from a specific path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    /// If the config file does not exist, returns default configuration.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            let config = Self::default().apply_env_overrides();
            config.validate()?;
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file from {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file from {:?}", path))?;

        // Apply environment variable overrides
        let config = config.apply_env_overrides();

        // Validate configuration
        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Get the default configuration file path
    ///
    /// Returns `./agora.toml` relative to the working directory.
    pub fn config_path() -> PathBuf {
        PathBuf::from("agora.toml")
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Environment variables take precedence over config file values:
    /// - AGORA_LOG_LEVEL
    /// - AGORA_LOG_FORMAT
    /// - AGORA_BIND
    /// - AGORA_PORT
    ///
    /// Rate limit overrides are listed in [`RateLimitConfig::apply_env_overrides`].
    fn apply_env_overrides(mut self) -> Self {
        // Logging overrides
        if let Ok(level) = std::env::var("AGORA_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("AGORA_LOG_FORMAT") {
            self.logging.format = format;
        }

        // Server overrides
        if let Ok(bind) = std::env::var("AGORA_BIND") {
            if !bind.is_empty() {
                self.server.bind = bind;
            }
        }
        if let Ok(port) = std::env::var("AGORA_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                if port > 0 {
                    self.server.port = port;
                }
            }
        }

        // Rate limit overrides
        self.rate_limit = self.rate_limit.apply_env_overrides();

        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        // Validate logging level
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            ),
        }

        // Validate logging format
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" | "compact" => {}
            _ => anyhow::bail!(
                "Invalid log format: {}. Must be one of: json, pretty, compact",
                self.logging.format
            ),
        }

        // Validate server configuration
        if self.server.bind.is_empty() {
            anyhow::bail!("Server bind address must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Server port must be > 0");
        }

        // Validate seeded room
        if self.room.name.is_empty() {
            anyhow::bail!("Default room name must not be empty");
        }

        // Validate rate limit configuration
        self.rate_limit.validate()?;

        Ok(())
    }

    /// Convert log level string to tracing::Level
    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging
            .level
            .to_lowercase()
            .parse()
            .map_err(|e| anyhow::anyhow!("Failed to parse log level: {}", e))
    }
}
