//! Configuration loading and management.

use serde::Deserialize;
use std::net::SocketAddr;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server information.
    #[serde(default)]
    pub server: ServerConfig,
    /// Network listen configuration.
    #[serde(default)]
    pub listen: ListenConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// History configuration.
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Server block.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServerConfig {
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Listen block.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind, e.g. `0.0.0.0:12345`.
    #[serde(default = "default_listen_address")]
    pub address: SocketAddr,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: default_listen_address(),
        }
    }
}

fn default_listen_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], chatter_proto::DEFAULT_PORT))
}

/// Database block.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "chatserver.db".to_string()
}

/// History block.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// In-memory ring capacity and replay limit per room.
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> usize {
    100
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_wire_contract() {
        let config = Config::default();
        assert_eq!(config.listen.address.port(), 12345);
        assert_eq!(config.database.path, "chatserver.db");
        assert_eq!(config.history.limit, 100);
        assert_eq!(config.server.log_format, LogFormat::Pretty);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [listen]
            address = "127.0.0.1:7000"

            [server]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.listen.address.port(), 7000);
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.database.path, "chatserver.db");
        assert_eq!(config.history.limit, 100);
    }
}
