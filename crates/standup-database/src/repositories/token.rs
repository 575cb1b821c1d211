//! Verification token repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use standup_core::result::AppResult;
use standup_core::types::UserId;
use standup_entity::token::{NewToken, TokenPurpose, VerificationToken};

use super::{PgStore, db_error};
use crate::store::{ConsumeOutcome, TokenStore};

#[async_trait]
impl TokenStore for PgStore {
    async fn issue_token(&self, new: NewToken, now: DateTime<Utc>) -> AppResult<VerificationToken> {
        const OP: &str = "issue token";
        self.bounded(OP, async {
            let mut tx = self.pool.begin().await.map_err(db_error(OP))?;

            // Serialize concurrent issues for the same user so the
            // outstanding-token index never sees two inserts.
            sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(new.user_id)
                .execute(&mut *tx)
                .await
                .map_err(db_error(OP))?;

            sqlx::query(
                "UPDATE verification_tokens SET revoked_at = $3 \
                 WHERE user_id = $1 AND purpose = $2 AND consumed_at IS NULL AND revoked_at IS NULL",
            )
            .bind(new.user_id)
            .bind(new.purpose)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_error(OP))?;

            let token = sqlx::query_as::<_, VerificationToken>(
                "INSERT INTO verification_tokens \
                 (id, token_hash, purpose, user_id, payload, created_at, expires_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
            )
            .bind(new.id)
            .bind(&new.token_hash)
            .bind(new.purpose)
            .bind(new.user_id)
            .bind(&new.payload)
            .bind(now)
            .bind(new.expires_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error(OP))?;

            tx.commit().await.map_err(db_error(OP))?;
            Ok(token)
        })
        .await
    }

    async fn consume_token(
        &self,
        token_hash: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<ConsumeOutcome> {
        const OP: &str = "consume token";
        self.bounded(OP, async {
            let consumed = sqlx::query_as::<_, VerificationToken>(
                "UPDATE verification_tokens SET consumed_at = $3 \
                 WHERE token_hash = $1 AND purpose = $2 \
                   AND consumed_at IS NULL AND revoked_at IS NULL AND expires_at > $3 \
                 RETURNING *",
            )
            .bind(token_hash)
            .bind(purpose)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error(OP))?;

            if let Some(token) = consumed {
                return Ok(ConsumeOutcome::Consumed(token));
            }

            let existing = sqlx::query_as::<_, VerificationToken>(
                "SELECT * FROM verification_tokens WHERE token_hash = $1",
            )
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error(OP))?;

            Ok(match existing {
                Some(token)
                    if token.purpose == purpose && !token.is_spent() && token.is_expired_at(now) =>
                {
                    ConsumeOutcome::Expired
                }
                _ => ConsumeOutcome::Invalid,
            })
        })
        .await
    }

    async fn revoke_user_tokens(
        &self,
        user_id: UserId,
        purpose: Option<TokenPurpose>,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        const OP: &str = "revoke tokens";
        self.bounded(OP, async {
            let result = sqlx::query(
                "UPDATE verification_tokens SET revoked_at = $3 \
                 WHERE user_id = $1 AND ($2::token_purpose IS NULL OR purpose = $2) \
                   AND consumed_at IS NULL AND revoked_at IS NULL",
            )
            .bind(user_id)
            .bind(purpose)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_error(OP))?;
            Ok(result.rows_affected())
        })
        .await
    }

    async fn count_active_tokens(
        &self,
        user_id: UserId,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        const OP: &str = "count tokens";
        self.bounded(OP, async {
            let count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM verification_tokens \
                 WHERE user_id = $1 AND purpose = $2 \
                   AND consumed_at IS NULL AND revoked_at IS NULL AND expires_at > $3",
            )
            .bind(user_id)
            .bind(purpose)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error(OP))?;
            Ok(count as u64)
        })
        .await
    }

    async fn purge_tokens(&self, before: DateTime<Utc>) -> AppResult<u64> {
        const OP: &str = "purge tokens";
        self.bounded(OP, async {
            let result = sqlx::query(
                "DELETE FROM verification_tokens \
                 WHERE expires_at <= $1 OR consumed_at <= $1 OR revoked_at <= $1",
            )
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(db_error(OP))?;
            Ok(result.rows_affected())
        })
        .await
    }
}
