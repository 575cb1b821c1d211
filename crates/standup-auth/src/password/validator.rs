//! Password policy enforcement for new passwords.

use standup_core::config::PasswordConfig;
use standup_core::error::AppError;
use zxcvbn::Score;

/// Validates new passwords against the configured policy.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    /// Minimum password length in characters.
    min_length: usize,
    /// Maximum password length in characters.
    max_length: usize,
    /// Minimum zxcvbn score, when the entropy check is enabled.
    min_strength: Option<Score>,
}

impl PasswordValidator {
    /// Creates a new validator from password configuration.
    pub fn new(config: &PasswordConfig) -> Self {
        Self {
            min_length: config.min_length,
            max_length: config.max_length,
            min_strength: config.min_strength.map(score_threshold),
        }
    }

    /// Validates a password against all configured policies.
    ///
    /// Returns `Ok(())` if the password meets all requirements,
    /// or an `InvalidInput` error describing the first violation found.
    pub fn validate(&self, password: &str) -> Result<(), AppError> {
        let length = password.chars().count();
        if length < self.min_length {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        if length > self.max_length {
            return Err(AppError::invalid_input(format!(
                "Password must be at most {} characters long",
                self.max_length
            )));
        }

        if let Some(threshold) = self.min_strength {
            let estimate = zxcvbn::zxcvbn(password, &[]);
            if estimate.score() < threshold {
                return Err(AppError::invalid_input(
                    "Password is too weak. Please use a stronger password with more entropy.",
                ));
            }
        }

        Ok(())
    }

    /// Validates that a new password differs from the old one.
    pub fn validate_not_same(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if old_password == new_password {
            return Err(AppError::invalid_input(
                "New password must be different from the current password",
            ));
        }
        Ok(())
    }
}

fn score_threshold(min: u8) -> Score {
    match min {
        0 => Score::Zero,
        1 => Score::One,
        2 => Score::Two,
        3 => Score::Three,
        _ => Score::Four,
    }
}
