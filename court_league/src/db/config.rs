//! Database configuration.

use std::env;

/// PostgreSQL pool settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of pooled connections
    pub max_connections: u32,

    /// Minimum number of pooled connections
    pub min_connections: u32,

    /// Seconds to wait when acquiring a connection
    pub connection_timeout_secs: u64,

    /// Seconds before an idle connection is closed
    pub idle_timeout_secs: u64,

    /// Seconds before any connection is recycled
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Read configuration from the environment
    ///
    /// Returns `None` when `DATABASE_URL` is unset. Other variables fall back to
    /// defaults when missing or unparsable:
    /// - `DB_MAX_CONNECTIONS` (20)
    /// - `DB_MIN_CONNECTIONS` (2)
    /// - `DB_CONNECTION_TIMEOUT_SECS` (10)
    /// - `DB_IDLE_TIMEOUT_SECS` (600)
    /// - `DB_MAX_LIFETIME_SECS` (1800)
    pub fn from_env() -> Option<Self> {
        let database_url = env::var("DATABASE_URL").ok()?;
        Some(Self::with_url(database_url).overridden_by_env())
    }

    /// Defaults for the given URL
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 20,
            min_connections: 2,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }

    /// Apply the `DB_*` pool variables on top of these settings
    pub fn overridden_by_env(self) -> Self {
        Self {
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", self.max_connections),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", self.min_connections),
            connection_timeout_secs: parse_env_or(
                "DB_CONNECTION_TIMEOUT_SECS",
                self.connection_timeout_secs,
            ),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", self.idle_timeout_secs),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", self.max_lifetime_secs),
            ..self
        }
    }

    /// Local development database
    pub fn development() -> Self {
        Self::with_url("postgres://postgres@localhost/court_league")
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_url_defaults() {
        let config = DatabaseConfig::with_url("postgres://localhost/test");
        assert_eq!(config.database_url, "postgres://localhost/test");
        assert_eq!(config.max_connections, 20);
        assert!(config.min_connections <= config.max_connections);
    }

    #[test]
    fn test_default_is_development() {
        assert_eq!(DatabaseConfig::default(), DatabaseConfig::development());
    }

    #[test]
    fn test_parse_env_or_falls_back() {
        assert_eq!(parse_env_or("COURT_LEAGUE_UNSET_TEST_VAR", 7u32), 7);
    }
}
