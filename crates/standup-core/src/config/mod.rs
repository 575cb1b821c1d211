//! Application configuration schemas.
//!
//! Configuration is merged from TOML files and `STANDUP__`-prefixed
//! environment variables via the `config` crate, then checked by
//! [`AppConfig::validate`]. A configuration that fails to load or validate
//! is fatal at boot; nothing is re-checked on first use.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;
pub mod mail;
pub mod session;
pub mod token;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::app::{ApplicationConfig, CorsConfig, ServerConfig};
pub use self::auth::{AuthConfig, PasswordConfig};
pub use self::database::{DatabaseConfig, StoreProvider};
pub use self::logging::LoggingConfig;
pub use self::mail::{MailConfig, MailProvider};
pub use self::session::{RefreshPolicy, SessionConfig, SessionRefresh};
pub use self::token::TokenConfig;

/// Configuration failures detected at boot.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The sources could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    /// A required key is absent.
    #[error("missing required configuration key `{key}`")]
    Missing {
        /// Dotted key path.
        key: &'static str,
    },
    /// A key is present but its value is unusable.
    #[error("invalid value for `{key}`: {reason}")]
    Invalid {
        /// Dotted key path.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    /// Create a missing-key error.
    pub fn missing(key: &'static str) -> Self {
        Self::Missing { key }
    }

    /// Create an invalid-value error.
    pub fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Upper bound for every configured lifetime: ten years.
pub const MAX_LIFETIME_SECONDS: u64 = 10 * 365 * 24 * 3600;

/// Converts a validated lifetime to a `Duration`, clamped to
/// [`MAX_LIFETIME_SECONDS`].
pub fn lifetime(seconds: u64) -> Duration {
    i64::try_from(seconds.min(MAX_LIFETIME_SECONDS))
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::zero())
}

/// Rejects a lifetime of zero or above [`MAX_LIFETIME_SECONDS`].
pub(crate) fn check_lifetime(key: &'static str, seconds: u64) -> Result<(), ConfigError> {
    if seconds == 0 {
        return Err(ConfigError::invalid(key, "must be positive"));
    }
    check_ceiling(key, seconds)
}

/// Rejects a duration above [`MAX_LIFETIME_SECONDS`].
pub(crate) fn check_ceiling(key: &'static str, seconds: u64) -> Result<(), ConfigError> {
    if seconds > MAX_LIFETIME_SECONDS {
        return Err(ConfigError::invalid(
            key,
            format!("must not exceed {MAX_LIFETIME_SECONDS} seconds"),
        ));
    }
    Ok(())
}

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application identity and public URL.
    pub app: ApplicationConfig,
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Persistent store settings.
    pub database: DatabaseConfig,
    /// Credential hashing and password policy.
    pub auth: AuthConfig,
    /// Session lifetime settings.
    pub session: SessionConfig,
    /// Verification token lifetimes.
    pub tokens: TokenConfig,
    /// Outbound mail settings.
    pub mail: MailConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files and the environment.
    ///
    /// Merges `config/default.toml`, the environment-specific overlay
    /// `config/{env}.toml`, and environment variables prefixed with
    /// `STANDUP__` (nested keys separated by `__`). The result is validated
    /// before it is returned.
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("STANDUP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let parsed: Self = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Parse and validate configuration from a TOML document.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;

        let parsed: Self = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Check every section for missing or inconsistent values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.app.validate()?;
        self.database.validate()?;
        self.auth.validate()?;
        self.session.validate()?;
        self.tokens.validate()?;
        self.mail.validate()?;
        Ok(())
    }
}
