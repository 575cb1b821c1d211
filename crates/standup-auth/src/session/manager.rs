//! Session lifecycle manager.
//!
//! A session moves `Active -> Active` on each validation within its lifetime,
//! `Active -> Expired` when its expiry passes, and `Active -> Revoked` on
//! sign-out, credential change, deletion, or administrative revocation. Both
//! end states are terminal.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use standup_core::config::{SessionConfig, SessionRefresh};
use standup_core::error::AppError;
use standup_core::result::AppResult;
use standup_core::types::{SessionId, UserId};
use standup_database::store::SessionStore;
use standup_entity::session::{NewSession, Session, SessionMetadata};
use standup_entity::user::UserRole;

use crate::secret::{generate_secret, hash_secret};

/// A newly created session. `handle` is the only copy of the raw secret.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Opaque handle to hand to the client.
    pub handle: String,
    /// The persisted session.
    pub session: Session,
}

/// The identity a valid handle resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSession {
    /// Session identifier.
    pub session_id: SessionId,
    /// Owning user.
    pub user_id: UserId,
    /// The owner's current role.
    pub role: UserRole,
    /// Expiry after this validation.
    pub expires_at: DateTime<Utc>,
    /// Whether this validation moved the expiry.
    pub refreshed: bool,
}

/// Creates, validates, refreshes, and revokes sessions.
#[derive(Clone)]
pub struct SessionManager {
    /// Session persistence.
    store: Arc<dyn SessionStore>,
    /// Session lifetime.
    ttl: Duration,
    /// Refresh behaviour.
    refresh: SessionRefresh,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("ttl", &self.ttl)
            .field("refresh", &self.refresh)
            .finish()
    }
}

impl SessionManager {
    /// Creates a session manager from validated configuration.
    pub fn new(store: Arc<dyn SessionStore>, config: &SessionConfig) -> Self {
        Self {
            store,
            ttl: config.ttl(),
            refresh: config.refresh(),
        }
    }

    /// Session lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Creates a session for a user that has just authenticated.
    pub async fn create(&self, user_id: UserId, metadata: SessionMetadata) -> AppResult<IssuedSession> {
        self.create_at(user_id, metadata, Utc::now()).await
    }

    /// Creates a session as of `now`.
    pub async fn create_at(
        &self,
        user_id: UserId,
        metadata: SessionMetadata,
        now: DateTime<Utc>,
    ) -> AppResult<IssuedSession> {
        let handle = generate_secret()?;
        let session = self
            .store
            .insert_session(
                NewSession {
                    id: SessionId::new(),
                    user_id,
                    handle_hash: hash_secret(&handle),
                    metadata,
                    expires_at: now + self.ttl,
                },
                now,
            )
            .await?;

        info!(
            user_id = %user_id,
            session_id = %session.id,
            expires_at = %session.expires_at,
            "Session created"
        );

        Ok(IssuedSession { handle, session })
    }

    /// Resolves a handle to its identity, refreshing expiry under the
    /// sliding policy.
    pub async fn validate(&self, handle: &str) -> AppResult<ValidatedSession> {
        self.validate_at(handle, Utc::now()).await
    }

    /// Validates a handle as of `now`.
    ///
    /// Fails with `SessionExpired` when the session exists, was never
    /// revoked, and is past its expiry; with `SessionInvalid` for anything
    /// else that does not resolve to an active session of a live user.
    pub async fn validate_at(&self, handle: &str, now: DateTime<Utc>) -> AppResult<ValidatedSession> {
        if handle.is_empty() {
            return Err(AppError::session_invalid());
        }
        let handle_hash = hash_secret(handle);

        if let Some(touched) = self
            .store
            .touch_session(&handle_hash, now, self.ttl, self.refresh)
            .await?
        {
            if touched.refreshed {
                debug!(
                    session_id = %touched.session.id,
                    expires_at = %touched.session.expires_at,
                    "Session refreshed"
                );
            }
            return Ok(ValidatedSession {
                session_id: touched.session.id,
                user_id: touched.session.user_id,
                role: touched.role,
                expires_at: touched.session.expires_at,
                refreshed: touched.refreshed,
            });
        }

        match self.store.find_session_by_hash(&handle_hash).await? {
            Some(session) if session.revoked_at.is_none() && session.expires_at <= now => {
                Err(AppError::session_expired())
            }
            _ => Err(AppError::session_invalid()),
        }
    }

    /// Revokes the session behind a handle. Returns whether it was active.
    pub async fn revoke(&self, handle: &str) -> AppResult<bool> {
        let revoked = self
            .store
            .revoke_session_by_hash(&hash_secret(handle), Utc::now())
            .await?;
        if revoked {
            info!("Session revoked");
        }
        Ok(revoked)
    }

    /// Revokes a session by ID.
    pub async fn revoke_by_id(&self, session_id: SessionId) -> AppResult<bool> {
        let revoked = self.store.revoke_session(session_id, Utc::now()).await?;
        if revoked {
            info!(session_id = %session_id, "Session revoked");
        }
        Ok(revoked)
    }

    /// Revokes every session of a user. Returns the number revoked.
    pub async fn revoke_all_for_user(&self, user_id: UserId) -> AppResult<u64> {
        let revoked = self
            .store
            .revoke_user_sessions(user_id, None, Utc::now())
            .await?;
        info!(user_id = %user_id, revoked, "All user sessions revoked");
        Ok(revoked)
    }

    /// Deletes sessions that expired or were revoked before `before`.
    pub async fn purge_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        self.store.purge_sessions(before).await
    }
}
