//! Verification token entity model.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use standup_core::types::{TokenId, UserId};

use super::purpose::TokenPurpose;

/// A single-use, purpose-bound verification token.
///
/// Only the SHA-256 digest of the token is stored. `payload` carries data
/// bound at issue time: the email being verified for `VerifyEmail`, the
/// pending new address for `ChangeEmail`.
#[derive(Debug, Clone, FromRow)]
pub struct VerificationToken {
    /// Unique token identifier.
    pub id: TokenId,
    /// Hex SHA-256 digest of the token value.
    pub token_hash: String,
    /// What the token authorizes.
    pub purpose: TokenPurpose,
    /// The user the token was issued for.
    pub user_id: UserId,
    /// Purpose-specific payload.
    pub payload: Option<String>,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
    /// When the token stops being redeemable.
    pub expires_at: DateTime<Utc>,
    /// When the token was redeemed.
    pub consumed_at: Option<DateTime<Utc>>,
    /// When the token was superseded or revoked.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl VerificationToken {
    /// Check if the token has been consumed or revoked.
    pub fn is_spent(&self) -> bool {
        self.consumed_at.is_some() || self.revoked_at.is_some()
    }

    /// Check if the token is expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Data required to issue a token.
#[derive(Debug, Clone)]
pub struct NewToken {
    /// Token identifier.
    pub id: TokenId,
    /// Hex SHA-256 digest of the token value.
    pub token_hash: String,
    /// What the token authorizes.
    pub purpose: TokenPurpose,
    /// The user the token is issued for.
    pub user_id: UserId,
    /// Purpose-specific payload.
    pub payload: Option<String>,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
}
