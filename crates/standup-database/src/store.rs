//! Store traits consumed by the auth layer.
//!
//! Each method is one store primitive. Methods documented as atomic must
//! complete as a single transaction or conditional statement so concurrent
//! callers never observe a half-applied state.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use standup_core::config::{DatabaseConfig, SessionRefresh, StoreProvider};
use standup_core::result::AppResult;
use standup_core::types::{SessionId, UserId};
use standup_entity::credential::Credential;
use standup_entity::session::{NewSession, Session, TouchedSession};
use standup_entity::token::{NewToken, TokenPurpose, VerificationToken};
use standup_entity::user::{NewUser, ProfileUpdate, User, UserRole};

use crate::connection::DatabasePool;
use crate::memory::MemoryStore;
use crate::migration::run_migrations;
use crate::repositories::PgStore;

/// Users and their password credentials.
///
/// Lookups never return soft-deleted users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user and its credential atomically.
    ///
    /// Fails with `EmailAlreadyRegistered` when a live user owns the email.
    async fn create_user(&self, user: NewUser) -> AppResult<User>;

    /// Find a live user by ID.
    async fn find_user_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// Find a live user by normalized email.
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Load the credential of a user.
    async fn find_credential(&self, user_id: UserId) -> AppResult<Option<Credential>>;

    /// Swap the credential and revoke every session of the user except
    /// `keep_session`, atomically.
    ///
    /// Returns the number of revoked sessions, or `None` when the user does
    /// not exist.
    async fn replace_credential(
        &self,
        user_id: UserId,
        password_hash: &str,
        keep_session: Option<SessionId>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<u64>>;

    /// Mark the email verified, provided it still equals `email`.
    async fn mark_email_verified(&self, user_id: UserId, email: &str) -> AppResult<bool>;

    /// Replace the email and mark it verified.
    ///
    /// Fails with `EmailAlreadyRegistered` when another live user owns it.
    async fn update_email(&self, user_id: UserId, email: &str) -> AppResult<Option<User>>;

    /// Apply a profile update.
    async fn update_profile(&self, user_id: UserId, update: &ProfileUpdate)
    -> AppResult<Option<User>>;

    /// Change the role of a user.
    async fn set_role(&self, user_id: UserId, role: UserRole) -> AppResult<Option<User>>;

    /// Soft-delete the user and revoke all of its sessions and outstanding
    /// tokens, atomically.
    async fn soft_delete_user(&self, user_id: UserId, now: DateTime<Utc>) -> AppResult<bool>;
}

/// Sessions keyed by the digest of their handle.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new session.
    async fn insert_session(&self, session: NewSession, now: DateTime<Utc>) -> AppResult<Session>;

    /// Validate and refresh a session in one conditional update.
    ///
    /// Matches only an unrevoked, unexpired session whose owner is live.
    /// Records `now` as last seen and, under the sliding policy, moves expiry
    /// to `now + ttl` when less than the window remains.
    async fn touch_session(
        &self,
        handle_hash: &str,
        now: DateTime<Utc>,
        ttl: Duration,
        refresh: SessionRefresh,
    ) -> AppResult<Option<TouchedSession>>;

    /// Find a session by handle digest regardless of state.
    async fn find_session_by_hash(&self, handle_hash: &str) -> AppResult<Option<Session>>;

    /// Revoke the session with the given handle digest.
    async fn revoke_session_by_hash(&self, handle_hash: &str, now: DateTime<Utc>)
    -> AppResult<bool>;

    /// Revoke a session by ID.
    async fn revoke_session(&self, id: SessionId, now: DateTime<Utc>) -> AppResult<bool>;

    /// Revoke every active session of a user except `except`.
    async fn revoke_user_sessions(
        &self,
        user_id: UserId,
        except: Option<SessionId>,
        now: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Delete sessions that expired or were revoked before `before`.
    async fn purge_sessions(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

/// Result of a conditional token consume.
#[derive(Debug, Clone)]
pub enum ConsumeOutcome {
    /// The token was outstanding and is now consumed.
    Consumed(VerificationToken),
    /// The token is outstanding for this purpose but past its expiry.
    Expired,
    /// Unknown, already consumed, revoked, or issued for another purpose.
    Invalid,
}

/// Single-use verification tokens keyed by the digest of their value.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Revoke outstanding tokens of the same purpose and user, then insert
    /// the new one, atomically.
    async fn issue_token(&self, token: NewToken, now: DateTime<Utc>) -> AppResult<VerificationToken>;

    /// Check and consume a token in one conditional update.
    async fn consume_token(
        &self,
        token_hash: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<ConsumeOutcome>;

    /// Revoke outstanding tokens of a user, optionally only one purpose.
    async fn revoke_user_tokens(
        &self,
        user_id: UserId,
        purpose: Option<TokenPurpose>,
        now: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Count unexpired outstanding tokens of a purpose for a user.
    async fn count_active_tokens(
        &self,
        user_id: UserId,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// Delete tokens that expired, were consumed, or were revoked before `before`.
    async fn purge_tokens(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

/// The store handles shared by every service.
#[derive(Clone)]
pub struct Stores {
    /// User and credential store.
    pub users: Arc<dyn UserStore>,
    /// Session store.
    pub sessions: Arc<dyn SessionStore>,
    /// Verification token store.
    pub tokens: Arc<dyn TokenStore>,
    /// PostgreSQL pool when the store is database-backed.
    pub pool: Option<DatabasePool>,
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores")
            .field("postgres", &self.pool.is_some())
            .finish()
    }
}

impl Stores {
    /// Build the configured store, connecting and migrating PostgreSQL when
    /// selected.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        match config.provider {
            StoreProvider::Memory => {
                info!("Using in-memory store; state is lost on restart");
                Ok(Self::memory(MemoryStore::new()))
            }
            StoreProvider::Postgres => {
                let pool = DatabasePool::connect(config).await?;
                if config.run_migrations {
                    run_migrations(pool.pool()).await?;
                }
                let store = Arc::new(PgStore::new(pool.pool().clone(), config.statement_timeout()));
                Ok(Self {
                    users: store.clone(),
                    sessions: store.clone(),
                    tokens: store,
                    pool: Some(pool),
                })
            }
        }
    }

    /// Wrap an in-memory store.
    pub fn memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            sessions: store.clone(),
            tokens: store,
            pool: None,
        }
    }

    /// Check store connectivity. Always healthy for the in-memory store.
    pub async fn health_check(&self) -> AppResult<bool> {
        match &self.pool {
            Some(pool) => pool.health_check().await,
            None => Ok(true),
        }
    }
}
