//! Configuration management for hiel
//!
//! Values come from built-in defaults, an optional TOML file, and `HIEL_*`
//! environment variables, in that order of precedence (environment wins).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::store::DEFAULT_LIST_LIMIT;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
    pub team: TeamConfig,
}

/// Document store backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,

    /// SQLite database path
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::Sqlite,
            path: PathBuf::from("data/hiel.db"),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
    pub enable_cors: bool,
    pub enable_request_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: true,
            enable_request_logging: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// Where the signed-in profile is cached between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/session.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamConfig {
    /// Cap on directory and board listings
    pub list_limit: usize,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self {
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["text", "json"];

impl Config {
    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// File (if given) then environment, validated
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `HIEL_*` variables that are set
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("HIEL_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }

        if let Ok(backend) = std::env::var("HIEL_DATABASE_BACKEND") {
            self.database.backend = match backend.to_lowercase().as_str() {
                "sqlite" => DatabaseBackend::Sqlite,
                "memory" => DatabaseBackend::Memory,
                other => anyhow::bail!("HIEL_DATABASE_BACKEND must be sqlite or memory, got '{other}'"),
            };
        }

        if let Ok(addr) = std::env::var("HIEL_BIND_ADDRESS") {
            self.server.bind_address = addr
                .parse()
                .with_context(|| format!("Invalid HIEL_BIND_ADDRESS: {addr}"))?;
        }

        if let Ok(level) = std::env::var("HIEL_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = std::env::var("HIEL_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Ok(path) = std::env::var("HIEL_SESSION_PATH") {
            self.session.path = PathBuf::from(path);
        }

        if let Ok(limit) = std::env::var("HIEL_MEMBER_LIST_LIMIT") {
            self.team.list_limit = limit
                .parse()
                .with_context(|| format!("Invalid HIEL_MEMBER_LIST_LIMIT: {limit}"))?;
        }

        Ok(())
    }

    /// Apply a command-line log format and revalidate
    pub fn override_log_format(&mut self, format: impl Into<String>) -> Result<()> {
        self.logging.format = format.into();
        self.validate()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.database.backend == DatabaseBackend::Sqlite
            && self.database.path.as_os_str().is_empty()
        {
            anyhow::bail!("database.path must be set for the sqlite backend");
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            );
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            anyhow::bail!("logging.format must be text or json, got '{}'", self.logging.format);
        }

        if self.team.list_limit == 0 {
            anyhow::bail!("team.list_limit must be greater than 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.team.list_limit, 100);
        assert_eq!(config.server.bind_address.port(), 8080);
    }

    #[test]
    fn test_invalid_list_limit() {
        let mut config = Config::default();
        config.team.list_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "yaml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_format_override_revalidated() {
        let mut config = Config::default();
        assert!(config.override_log_format("yaml").is_err());
        assert!(config.override_log_format("json").is_ok());
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_memory_backend_needs_no_path() {
        let mut config = Config::default();
        config.database.backend = DatabaseBackend::Memory;
        config.database.path = PathBuf::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
                [database]
                backend = "memory"
            "#,
        )
        .unwrap();
        assert_eq!(config.database.backend, DatabaseBackend::Memory);
        assert_eq!(config.logging, LoggingConfig::default());
    }
}
