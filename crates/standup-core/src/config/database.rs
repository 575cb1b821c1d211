//! Persistent store configuration.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Which store implementation backs users, sessions, and tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreProvider {
    /// PostgreSQL via sqlx.
    Postgres,
    /// Process-local store; single instance only, state is lost on restart.
    Memory,
}

impl std::fmt::Display for StoreProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreProvider::Postgres => write!(f, "postgres"),
            StoreProvider::Memory => write!(f, "memory"),
        }
    }
}

/// Database connection pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Store implementation.
    pub provider: StoreProvider,
    /// PostgreSQL connection URL. Required for the `postgres` provider.
    #[serde(default)]
    pub url: Option<String>,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Connection acquire timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Idle connection timeout in seconds.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    /// Deadline for a single store operation in seconds.
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_seconds: u64,
    /// Whether pending migrations are applied at boot.
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.provider == StoreProvider::Postgres {
            match self.url.as_deref().map(str::trim) {
                None | Some("") => return Err(ConfigError::missing("database.url")),
                Some(url) if !url.starts_with("postgres://") && !url.starts_with("postgresql://") => {
                    return Err(ConfigError::invalid(
                        "database.url",
                        "must be a postgres:// URL",
                    ));
                }
                Some(_) => {}
            }
        }
        if self.max_connections == 0 || self.min_connections > self.max_connections {
            return Err(ConfigError::invalid(
                "database.max_connections",
                "must be positive and not below min_connections",
            ));
        }
        if self.statement_timeout_seconds == 0 {
            return Err(ConfigError::invalid(
                "database.statement_timeout_seconds",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Deadline applied to every store call.
    pub fn statement_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.statement_timeout_seconds)
    }
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    2
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    300
}

fn default_statement_timeout() -> u64 {
    5
}

fn default_true() -> bool {
    true
}
