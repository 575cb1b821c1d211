//! User and credential repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use standup_core::error::AppError;
use standup_core::result::AppResult;
use standup_core::types::{SessionId, UserId};
use standup_entity::credential::Credential;
use standup_entity::user::{NewUser, ProfileUpdate, User, UserRole};

use super::{PgStore, db_error, is_unique_violation};
use crate::store::UserStore;

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        const OP: &str = "create user";
        self.bounded(OP, async {
            let mut tx = self.pool.begin().await.map_err(db_error(OP))?;

            let user = sqlx::query_as::<_, User>(
                "INSERT INTO users (id, email, name) VALUES ($1, $2, $3) RETURNING *",
            )
            .bind(UserId::new())
            .bind(&new.email)
            .bind(&new.name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::email_already_registered()
                } else {
                    db_error(OP)(e)
                }
            })?;

            sqlx::query("INSERT INTO credentials (user_id, password_hash) VALUES ($1, $2)")
                .bind(user.id)
                .bind(&new.password_hash)
                .execute(&mut *tx)
                .await
                .map_err(db_error(OP))?;

            tx.commit().await.map_err(db_error(OP))?;
            Ok(user)
        })
        .await
    }

    async fn find_user_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        const OP: &str = "find user";
        self.bounded(OP, async {
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error(OP))
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        const OP: &str = "find user by email";
        self.bounded(OP, async {
            sqlx::query_as::<_, User>(
                "SELECT * FROM users WHERE email = $1 AND deleted_at IS NULL",
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error(OP))
        })
        .await
    }

    async fn find_credential(&self, user_id: UserId) -> AppResult<Option<Credential>> {
        const OP: &str = "find credential";
        self.bounded(OP, async {
            sqlx::query_as::<_, Credential>("SELECT * FROM credentials WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error(OP))
        })
        .await
    }

    async fn replace_credential(
        &self,
        user_id: UserId,
        password_hash: &str,
        keep_session: Option<SessionId>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<u64>> {
        const OP: &str = "replace credential";
        self.bounded(OP, async {
            let mut tx = self.pool.begin().await.map_err(db_error(OP))?;

            // Row lock serializes against a concurrent soft delete.
            let live: Option<UserId> = sqlx::query_scalar(
                "SELECT id FROM users WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
            )
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error(OP))?;
            if live.is_none() {
                return Ok(None);
            }

            sqlx::query(
                "UPDATE credentials SET password_hash = $2, updated_at = $3 WHERE user_id = $1",
            )
            .bind(user_id)
            .bind(password_hash)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_error(OP))?;

            let revoked = sqlx::query(
                "UPDATE sessions SET revoked_at = $3 \
                 WHERE user_id = $1 AND revoked_at IS NULL AND ($2::uuid IS NULL OR id <> $2)",
            )
            .bind(user_id)
            .bind(keep_session)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_error(OP))?
            .rows_affected();

            tx.commit().await.map_err(db_error(OP))?;
            Ok(Some(revoked))
        })
        .await
    }

    async fn mark_email_verified(&self, user_id: UserId, email: &str) -> AppResult<bool> {
        const OP: &str = "mark email verified";
        self.bounded(OP, async {
            let result = sqlx::query(
                "UPDATE users SET email_verified = TRUE, updated_at = NOW() \
                 WHERE id = $1 AND email = $2 AND deleted_at IS NULL",
            )
            .bind(user_id)
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(db_error(OP))?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    async fn update_email(&self, user_id: UserId, email: &str) -> AppResult<Option<User>> {
        const OP: &str = "update email";
        self.bounded(OP, async {
            sqlx::query_as::<_, User>(
                "UPDATE users SET email = $2, email_verified = TRUE, updated_at = NOW() \
                 WHERE id = $1 AND deleted_at IS NULL RETURNING *",
            )
            .bind(user_id)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::email_already_registered()
                } else {
                    db_error(OP)(e)
                }
            })
        })
        .await
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> AppResult<Option<User>> {
        let Some(name) = &update.name else {
            return self.find_user_by_id(user_id).await;
        };

        const OP: &str = "update profile";
        self.bounded(OP, async {
            sqlx::query_as::<_, User>(
                "UPDATE users SET name = $2, updated_at = NOW() \
                 WHERE id = $1 AND deleted_at IS NULL RETURNING *",
            )
            .bind(user_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error(OP))
        })
        .await
    }

    async fn set_role(&self, user_id: UserId, role: UserRole) -> AppResult<Option<User>> {
        const OP: &str = "set user role";
        self.bounded(OP, async {
            sqlx::query_as::<_, User>(
                "UPDATE users SET role = $2, updated_at = NOW() \
                 WHERE id = $1 AND deleted_at IS NULL RETURNING *",
            )
            .bind(user_id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error(OP))
        })
        .await
    }

    async fn soft_delete_user(&self, user_id: UserId, now: DateTime<Utc>) -> AppResult<bool> {
        const OP: &str = "delete user";
        self.bounded(OP, async {
            let mut tx = self.pool.begin().await.map_err(db_error(OP))?;

            let deleted = sqlx::query(
                "UPDATE users SET deleted_at = $2, updated_at = $2 \
                 WHERE id = $1 AND deleted_at IS NULL",
            )
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_error(OP))?
            .rows_affected();
            if deleted == 0 {
                return Ok(false);
            }

            sqlx::query(
                "UPDATE sessions SET revoked_at = $2 WHERE user_id = $1 AND revoked_at IS NULL",
            )
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_error(OP))?;

            sqlx::query(
                "UPDATE verification_tokens SET revoked_at = $2 \
                 WHERE user_id = $1 AND consumed_at IS NULL AND revoked_at IS NULL",
            )
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_error(OP))?;

            tx.commit().await.map_err(db_error(OP))?;
            Ok(true)
        })
        .await
    }
}
