//! Session repository.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use standup_core::config::SessionRefresh;
use standup_core::result::AppResult;
use standup_core::types::{SessionId, UserId};
use standup_entity::session::{NewSession, Session, TouchedSession};

use super::{PgStore, db_error};
use crate::store::SessionStore;

#[async_trait]
impl SessionStore for PgStore {
    async fn insert_session(&self, new: NewSession, now: DateTime<Utc>) -> AppResult<Session> {
        const OP: &str = "create session";
        self.bounded(OP, async {
            sqlx::query_as::<_, Session>(
                "INSERT INTO sessions \
                 (id, user_id, handle_hash, ip_address, user_agent, created_at, expires_at, last_seen_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $6) RETURNING *",
            )
            .bind(new.id)
            .bind(new.user_id)
            .bind(&new.handle_hash)
            .bind(&new.metadata.ip_address)
            .bind(&new.metadata.user_agent)
            .bind(now)
            .bind(new.expires_at)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error(OP))
        })
        .await
    }

    async fn touch_session(
        &self,
        handle_hash: &str,
        now: DateTime<Utc>,
        ttl: Duration,
        refresh: SessionRefresh,
    ) -> AppResult<Option<TouchedSession>> {
        let window_seconds = match refresh {
            SessionRefresh::Sliding { window } => Some(window.num_seconds() as f64),
            SessionRefresh::Fixed => None,
        };

        const OP: &str = "validate session";
        self.bounded(OP, async {
            sqlx::query_as::<_, TouchedSession>(
                "WITH prev AS ( \
                   SELECT id, expires_at FROM sessions WHERE handle_hash = $1 FOR UPDATE \
                 ) \
                 UPDATE sessions s SET \
                   last_seen_at = $2, \
                   expires_at = CASE \
                     WHEN $3::float8 IS NOT NULL AND s.expires_at - $2 < make_interval(secs => $3::float8) \
                     THEN $2 + make_interval(secs => $4::float8) \
                     ELSE s.expires_at END \
                 FROM users u, prev \
                 WHERE s.id = prev.id \
                   AND u.id = s.user_id \
                   AND u.deleted_at IS NULL \
                   AND s.revoked_at IS NULL \
                   AND s.expires_at > $2 \
                 RETURNING s.*, u.role, s.expires_at <> prev.expires_at AS refreshed",
            )
            .bind(handle_hash)
            .bind(now)
            .bind(window_seconds)
            .bind(ttl.num_seconds() as f64)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error(OP))
        })
        .await
    }

    async fn find_session_by_hash(&self, handle_hash: &str) -> AppResult<Option<Session>> {
        const OP: &str = "find session";
        self.bounded(OP, async {
            sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE handle_hash = $1")
                .bind(handle_hash)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error(OP))
        })
        .await
    }

    async fn revoke_session_by_hash(
        &self,
        handle_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        const OP: &str = "revoke session";
        self.bounded(OP, async {
            let result = sqlx::query(
                "UPDATE sessions SET revoked_at = $2 WHERE handle_hash = $1 AND revoked_at IS NULL",
            )
            .bind(handle_hash)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_error(OP))?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    async fn revoke_session(&self, id: SessionId, now: DateTime<Utc>) -> AppResult<bool> {
        const OP: &str = "revoke session";
        self.bounded(OP, async {
            let result = sqlx::query(
                "UPDATE sessions SET revoked_at = $2 WHERE id = $1 AND revoked_at IS NULL",
            )
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_error(OP))?;
            Ok(result.rows_affected() > 0)
        })
        .await
    }

    async fn revoke_user_sessions(
        &self,
        user_id: UserId,
        except: Option<SessionId>,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        const OP: &str = "revoke user sessions";
        self.bounded(OP, async {
            let result = sqlx::query(
                "UPDATE sessions SET revoked_at = $3 \
                 WHERE user_id = $1 AND revoked_at IS NULL AND ($2::uuid IS NULL OR id <> $2)",
            )
            .bind(user_id)
            .bind(except)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(db_error(OP))?;
            Ok(result.rows_affected())
        })
        .await
    }

    async fn purge_sessions(&self, before: DateTime<Utc>) -> AppResult<u64> {
        const OP: &str = "purge sessions";
        self.bounded(OP, async {
            let result =
                sqlx::query("DELETE FROM sessions WHERE expires_at <= $1 OR revoked_at <= $1")
                    .bind(before)
                    .execute(&self.pool)
                    .await
                    .map_err(db_error(OP))?;
            Ok(result.rows_affected())
        })
        .await
    }
}
