//! Single-use, purpose-bound verification tokens.
//!
//! Tokens are 256-bit random values encoded base64url; only their SHA-256
//! digest reaches the store. Issuing a token supersedes any outstanding token
//! of the same purpose for the same user.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use standup_core::config::{TokenConfig, lifetime};
use standup_core::error::AppError;
use standup_core::result::AppResult;
use standup_core::types::{TokenId, UserId};
use standup_database::store::{ConsumeOutcome, TokenStore};
use standup_entity::token::{NewToken, TokenPurpose, VerificationToken};

use crate::secret::{generate_secret, hash_secret};

/// A freshly issued token. `value` is the only copy of the raw secret.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Raw token value to embed in the outbound link.
    pub value: String,
    /// The persisted record.
    pub token: VerificationToken,
}

/// What a successful redemption yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redemption {
    /// The user the token was issued for.
    pub user_id: UserId,
    /// The payload bound at issue time.
    pub payload: Option<String>,
}

/// Issues and redeems verification tokens.
#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn TokenStore>,
    config: TokenConfig,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("config", &self.config)
            .finish()
    }
}

impl TokenService {
    /// Creates a token service over the given store.
    pub fn new(store: Arc<dyn TokenStore>, config: TokenConfig) -> Self {
        Self { store, config }
    }

    /// Configured lifetime for tokens of `purpose`.
    pub fn ttl_for(&self, purpose: TokenPurpose) -> Duration {
        let seconds = match purpose {
            TokenPurpose::VerifyEmail => self.config.verify_email_ttl_seconds,
            TokenPurpose::ResetPassword => self.config.reset_password_ttl_seconds,
            TokenPurpose::ChangeEmail => self.config.change_email_ttl_seconds,
            TokenPurpose::DeleteAccount => self.config.delete_account_ttl_seconds,
        };
        lifetime(seconds)
    }

    /// Issues a token with the configured lifetime for its purpose.
    pub async fn issue_for(
        &self,
        purpose: TokenPurpose,
        user_id: UserId,
        payload: Option<String>,
    ) -> AppResult<IssuedToken> {
        self.issue(purpose, user_id, payload, self.ttl_for(purpose))
            .await
    }

    /// Issues a token with an explicit lifetime.
    ///
    /// Prior outstanding tokens of the same purpose for `user_id` are revoked
    /// in the same store operation.
    pub async fn issue(
        &self,
        purpose: TokenPurpose,
        user_id: UserId,
        payload: Option<String>,
        ttl: Duration,
    ) -> AppResult<IssuedToken> {
        let now = Utc::now();
        let value = generate_secret()?;

        let token = self
            .store
            .issue_token(
                NewToken {
                    id: TokenId::new(),
                    token_hash: hash_secret(&value),
                    purpose,
                    user_id,
                    payload,
                    expires_at: now + ttl,
                },
                now,
            )
            .await?;

        info!(
            user_id = %user_id,
            token_id = %token.id,
            purpose = %purpose,
            expires_at = %token.expires_at,
            "Verification token issued"
        );

        Ok(IssuedToken { value, token })
    }

    /// Redeems a token for `purpose`.
    ///
    /// Fails with `TokenInvalid` when the token is unknown, already consumed,
    /// revoked, or was issued for another purpose, and with `TokenExpired`
    /// when it is outstanding but past its expiry.
    pub async fn redeem(&self, value: &str, purpose: TokenPurpose) -> AppResult<Redemption> {
        self.redeem_at(value, purpose, Utc::now()).await
    }

    /// Redeems a token as of `now`.
    pub async fn redeem_at(
        &self,
        value: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<Redemption> {
        let value = value.trim();
        if value.is_empty() {
            return Err(AppError::token_invalid());
        }

        match self
            .store
            .consume_token(&hash_secret(value), purpose, now)
            .await?
        {
            ConsumeOutcome::Consumed(token) => {
                info!(
                    user_id = %token.user_id,
                    token_id = %token.id,
                    purpose = %purpose,
                    "Verification token redeemed"
                );
                Ok(Redemption {
                    user_id: token.user_id,
                    payload: token.payload,
                })
            }
            ConsumeOutcome::Expired => {
                debug!(purpose = %purpose, "Expired verification token presented");
                Err(AppError::token_expired())
            }
            ConsumeOutcome::Invalid => {
                debug!(purpose = %purpose, "Invalid verification token presented");
                Err(AppError::token_invalid())
            }
        }
    }

    /// Revokes every outstanding token of a user.
    pub async fn revoke_all_for_user(&self, user_id: UserId) -> AppResult<u64> {
        let revoked = self
            .store
            .revoke_user_tokens(user_id, None, Utc::now())
            .await?;
        if revoked > 0 {
            info!(user_id = %user_id, revoked, "Verification tokens revoked");
        }
        Ok(revoked)
    }

    /// Number of unexpired outstanding tokens of `purpose` for a user.
    pub async fn active_count(&self, user_id: UserId, purpose: TokenPurpose) -> AppResult<u64> {
        self.store
            .count_active_tokens(user_id, purpose, Utc::now())
            .await
    }

    /// Deletes tokens that expired or were spent before `before`.
    pub async fn purge_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        self.store.purge_tokens(before).await
    }
}
