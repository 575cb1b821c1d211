//! Argon2id password hashing and verification.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use standup_core::config::{ConfigError, PasswordConfig};
use standup_core::error::AppError;

/// Handles password hashing and verification using Argon2id.
///
/// Hashes are PHC strings, so verification always uses the parameters the
/// hash was created with; only new hashes pick up configuration changes.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    /// Configured Argon2id cost parameters.
    params: Params,
    /// Hash of a random password, verified against when an account is unknown.
    dummy_hash: String,
}

impl PasswordHasher {
    /// Creates a hasher from configuration.
    ///
    /// Fails when the parameters are rejected by Argon2, which makes bad
    /// cost settings a boot-time error.
    pub fn new(config: &PasswordConfig) -> Result<Self, ConfigError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| ConfigError::invalid("auth.password", e.to_string()))?;

        let mut hasher = Self {
            params,
            dummy_hash: String::new(),
        };
        let dummy_password = crate::secret::generate_secret()
            .map_err(|e| ConfigError::invalid("auth.password", e.message))?;
        hasher.dummy_hash = hasher
            .hash_password(&dummy_password)
            .map_err(|e| ConfigError::invalid("auth.password", e.message))?;
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hashes a plaintext password using Argon2id with a random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::store_unavailable(format!("Password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verifies a plaintext password against a stored Argon2id hash.
    ///
    /// Returns `Ok(true)` if the password matches, `Ok(false)` if not.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            AppError::store_unavailable(format!("Invalid password hash format: {e}"))
        })?;

        match self.argon2().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::store_unavailable(format!(
                "Password verification failed: {e}"
            ))),
        }
    }

    /// Runs a verification that always fails, costing the same as a real one.
    pub fn verify_dummy(&self, password: &str) -> Result<bool, AppError> {
        self.verify_password(password, &self.dummy_hash)
            .map(|_| false)
    }
}
