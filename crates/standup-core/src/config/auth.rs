//! Credential hashing and password policy configuration.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Password hashing parameters and policy.
    pub password: PasswordConfig,
}

/// Argon2id parameters and the password acceptance policy.
///
/// The hashing parameters have no defaults: a deployment must choose them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    /// Argon2 memory cost in KiB.
    pub memory_kib: u32,
    /// Argon2 iteration count.
    pub iterations: u32,
    /// Argon2 degree of parallelism.
    pub parallelism: u32,
    /// Minimum accepted password length in characters.
    pub min_length: usize,
    /// Maximum accepted password length in characters.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Minimum zxcvbn strength score (0-4). Unset disables the entropy check.
    #[serde(default)]
    pub min_strength: Option<u8>,
}

impl AuthConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.password;
        if p.memory_kib == 0 {
            return Err(ConfigError::invalid("auth.password.memory_kib", "must be positive"));
        }
        if p.iterations == 0 {
            return Err(ConfigError::invalid("auth.password.iterations", "must be positive"));
        }
        if p.parallelism == 0 {
            return Err(ConfigError::invalid("auth.password.parallelism", "must be positive"));
        }
        if p.min_length == 0 {
            return Err(ConfigError::invalid("auth.password.min_length", "must be positive"));
        }
        if p.max_length < p.min_length {
            return Err(ConfigError::invalid(
                "auth.password.max_length",
                "must not be below min_length",
            ));
        }
        if let Some(score) = p.min_strength {
            if score > 4 {
                return Err(ConfigError::invalid(
                    "auth.password.min_strength",
                    "must be between 0 and 4",
                ));
            }
        }
        Ok(())
    }
}

fn default_max_length() -> usize {
    128
}
