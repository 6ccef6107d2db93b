//! Store configuration.
//!
//! Supports YAML file and environment variable overrides.

use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use tracing::info;

/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "SHOPCORE_CONFIG";
/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for the database URL.
pub const DATABASE_URL_ENV_VAR: &str = "DATABASE_URL";
/// Environment variable for the connection pool size.
pub const DATABASE_MAX_CONNECTIONS_ENV_VAR: &str = "DATABASE_MAX_CONNECTIONS";

/// Store configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URI.
    pub url: String,
    /// Maximum pool connections.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/shopcore".to_string(),
            max_connections: 5,
        }
    }
}

impl StoreConfig {
    /// Load configuration from file and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file
    /// 3. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(DATABASE_URL_ENV_VAR) {
            self.database.url = url;
        }

        if let Ok(max) = std::env::var(DATABASE_MAX_CONNECTIONS_ENV_VAR) {
            if let Ok(n) = max.parse() {
                self.database.max_connections = n;
            }
        }
    }

    /// Open a connection pool against the configured database.
    pub async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        info!(
            max_connections = self.database.max_connections,
            "connecting to postgres"
        );

        PgPoolOptions::new()
            .max_connections(self.database.max_connections)
            .connect(&self.database.url)
            .await
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    FileRead(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}
