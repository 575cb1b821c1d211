//! Verification token lifetimes.

use serde::{Deserialize, Serialize};

use super::{ConfigError, check_lifetime};

/// Per-purpose verification token TTLs, in seconds. All required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Lifetime of email verification links.
    pub verify_email_ttl_seconds: u64,
    /// Lifetime of password reset links.
    pub reset_password_ttl_seconds: u64,
    /// Lifetime of email change confirmation links.
    pub change_email_ttl_seconds: u64,
    /// Lifetime of account deletion confirmation links.
    pub delete_account_ttl_seconds: u64,
}

impl TokenConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("tokens.verify_email_ttl_seconds", self.verify_email_ttl_seconds),
            ("tokens.reset_password_ttl_seconds", self.reset_password_ttl_seconds),
            ("tokens.change_email_ttl_seconds", self.change_email_ttl_seconds),
            ("tokens.delete_account_ttl_seconds", self.delete_account_ttl_seconds),
        ] {
            check_lifetime(key, value)?;
        }
        Ok(())
    }
}
