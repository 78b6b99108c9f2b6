//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use court_league::db::DatabaseConfig;
use std::net::SocketAddr;

/// Default listen address
pub const DEFAULT_BIND: &str = "127.0.0.1:7878";

/// Where tournament data is kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// PostgreSQL through a connection pool
    Postgres(DatabaseConfig),
    /// Process memory; everything is lost on shutdown
    Memory,
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Storage backend
    pub storage: StorageBackend,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `memory` - Force the in-memory backend (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if `SERVER_BIND` is unparsable, or if no database URL is
    /// available and the in-memory backend was not requested.
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        memory: bool,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => match std::env::var("SERVER_BIND") {
                Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: format!("'{raw}' is not an IP:PORT address"),
                })?,
                Err(_) => DEFAULT_BIND.parse().map_err(|_| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: "built-in default is not an address".to_string(),
                })?,
            },
        };

        let memory = memory || parse_env_or("STORAGE_MEMORY", false);

        let storage = if memory {
            StorageBackend::Memory
        } else {
            let database = match database_url_override {
                Some(url) => DatabaseConfig::with_url(url).overridden_by_env(),
                None => DatabaseConfig::from_env().ok_or_else(|| ConfigError::MissingRequired {
                    var: "DATABASE_URL".to_string(),
                    hint: "Pass --db-url, set DATABASE_URL, or run with --memory".to_string(),
                })?,
            };
            StorageBackend::Postgres(database)
        };

        let config = ServerConfig { bind, storage };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let StorageBackend::Postgres(database) = &self.storage {
            if database.database_url.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    var: "DATABASE_URL".to_string(),
                    reason: "Must not be empty".to_string(),
                });
            }

            if database.max_connections == 0 {
                return Err(ConfigError::Invalid {
                    var: "DB_MAX_CONNECTIONS".to_string(),
                    reason: "Must be greater than 0".to_string(),
                });
            }

            if database.min_connections > database.max_connections {
                return Err(ConfigError::Invalid {
                    var: "DB_MIN_CONNECTIONS".to_string(),
                    reason: format!(
                        "Cannot exceed max connections ({})",
                        database.max_connections
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postgres_config(database: DatabaseConfig) -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            storage: StorageBackend::Postgres(database),
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "DATABASE_URL".to_string(),
            hint: "Use --memory".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("DATABASE_URL"));
        assert!(msg.contains("Use --memory"));
    }

    #[test]
    fn test_memory_backend_needs_no_database() {
        let config = ServerConfig::from_env(Some("127.0.0.1:9000".parse().unwrap()), None, true)
            .unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.bind.port(), 9000);
    }

    #[test]
    fn test_database_url_override_selects_postgres() {
        let config = ServerConfig::from_env(
            Some("127.0.0.1:9000".parse().unwrap()),
            Some("postgres://league@db/league".to_string()),
            false,
        )
        .unwrap();

        match config.storage {
            StorageBackend::Postgres(database) => {
                assert_eq!(database.database_url, "postgres://league@db/league");
            }
            StorageBackend::Memory => panic!("expected postgres backend"),
        }
    }

    #[test]
    fn test_validation_rejects_empty_url() {
        let config = postgres_config(DatabaseConfig::with_url("  "));
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DATABASE_URL"));
    }

    #[test]
    fn test_validation_rejects_inverted_pool_bounds() {
        let mut database = DatabaseConfig::with_url("postgres://localhost/league");
        database.max_connections = 2;
        database.min_connections = 5;

        let err = postgres_config(database).validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DB_MIN_CONNECTIONS"));
    }
}
