//! Password credential entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use standup_core::types::UserId;

/// The password credential attached to a user.
///
/// `password_hash` is a PHC string, so the algorithm and its parameters
/// travel with the hash.
#[derive(Debug, Clone, FromRow)]
pub struct Credential {
    /// Owning user.
    pub user_id: UserId,
    /// PHC-encoded password hash.
    pub password_hash: String,
    /// When the credential was last replaced.
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    /// Algorithm identifier from the PHC string, e.g. `argon2id`.
    pub fn algorithm(&self) -> Option<&str> {
        self.password_hash.strip_prefix('$')?.split('$').next()
    }
}
