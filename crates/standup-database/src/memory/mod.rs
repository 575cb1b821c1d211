//! In-process store.
//!
//! All state sits behind one mutex, so every trait method is a single
//! critical section and the multi-row operations are atomic exactly as the
//! PostgreSQL transactions are. Suitable for development and tests; state is
//! lost on restart and is not shared between processes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use standup_core::config::SessionRefresh;
use standup_core::error::AppError;
use standup_core::result::AppResult;
use standup_core::types::{SessionId, UserId};
use standup_entity::credential::Credential;
use standup_entity::session::{NewSession, Session, TouchedSession};
use standup_entity::token::{NewToken, TokenPurpose, VerificationToken};
use standup_entity::user::{NewUser, ProfileUpdate, User, UserRole};

use crate::store::{ConsumeOutcome, SessionStore, TokenStore, UserStore};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    credentials: HashMap<UserId, Credential>,
    sessions: HashMap<SessionId, Session>,
    tokens: Vec<VerificationToken>,
}

impl State {
    fn live_user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id).filter(|u| !u.is_deleted())
    }

    fn live_user_mut(&mut self, id: UserId) -> Option<&mut User> {
        self.users.get_mut(&id).filter(|u| !u.is_deleted())
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| !u.is_deleted() && u.email == email && Some(u.id) != except)
    }

    fn revoke_sessions(&mut self, user_id: UserId, except: Option<SessionId>, now: DateTime<Utc>) -> u64 {
        let mut revoked = 0;
        for session in self.sessions.values_mut() {
            if session.user_id == user_id && session.revoked_at.is_none() && Some(session.id) != except {
                session.revoked_at = Some(now);
                revoked += 1;
            }
        }
        revoked
    }

    fn revoke_tokens(&mut self, user_id: UserId, purpose: Option<TokenPurpose>, now: DateTime<Utc>) -> u64 {
        let mut revoked = 0;
        for token in self.tokens.iter_mut() {
            if token.user_id == user_id
                && purpose.is_none_or(|p| token.purpose == p)
                && !token.is_spent()
            {
                token.revoked_at = Some(now);
                revoked += 1;
            }
        }
        revoked
    }
}

/// Store holding everything in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users, including soft-deleted ones.
    pub async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    /// Look up a user by ID, including soft-deleted ones.
    pub async fn user_including_deleted(&self, id: UserId) -> Option<User> {
        self.state.lock().await.users.get(&id).cloned()
    }

    /// All sessions of a user in any state.
    pub async fn sessions_of(&self, user_id: UserId) -> Vec<Session> {
        self.state
            .lock()
            .await
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        let mut state = self.state.lock().await;
        if state.email_taken(&new.email, None) {
            return Err(AppError::email_already_registered());
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: new.email,
            name: new.name,
            email_verified: false,
            role: UserRole::default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.credentials.insert(
            user.id,
            Credential {
                user_id: user.id,
                password_hash: new.password_hash,
                updated_at: now,
            },
        );
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.state.lock().await.live_user(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| !u.is_deleted() && u.email == email)
            .cloned())
    }

    async fn find_credential(&self, user_id: UserId) -> AppResult<Option<Credential>> {
        Ok(self.state.lock().await.credentials.get(&user_id).cloned())
    }

    async fn replace_credential(
        &self,
        user_id: UserId,
        password_hash: &str,
        keep_session: Option<SessionId>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<u64>> {
        let mut state = self.state.lock().await;
        if state.live_user(user_id).is_none() {
            return Ok(None);
        }
        state.credentials.insert(
            user_id,
            Credential {
                user_id,
                password_hash: password_hash.to_string(),
                updated_at: now,
            },
        );
        Ok(Some(state.revoke_sessions(user_id, keep_session, now)))
    }

    async fn mark_email_verified(&self, user_id: UserId, email: &str) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.live_user_mut(user_id) {
            Some(user) if user.email == email => {
                user.email_verified = true;
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_email(&self, user_id: UserId, email: &str) -> AppResult<Option<User>> {
        let mut state = self.state.lock().await;
        if state.live_user(user_id).is_none() {
            return Ok(None);
        }
        if state.email_taken(email, Some(user_id)) {
            return Err(AppError::email_already_registered());
        }
        let Some(user) = state.live_user_mut(user_id) else {
            return Ok(None);
        };
        user.email = email.to_string();
        user.email_verified = true;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> AppResult<Option<User>> {
        let mut state = self.state.lock().await;
        let Some(user) = state.live_user_mut(user_id) else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            user.name = name.clone();
            user.updated_at = Utc::now();
        }
        Ok(Some(user.clone()))
    }

    async fn set_role(&self, user_id: UserId, role: UserRole) -> AppResult<Option<User>> {
        let mut state = self.state.lock().await;
        let Some(user) = state.live_user_mut(user_id) else {
            return Ok(None);
        };
        user.role = role;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn soft_delete_user(&self, user_id: UserId, now: DateTime<Utc>) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let Some(user) = state.live_user_mut(user_id) else {
            return Ok(false);
        };
        user.deleted_at = Some(now);
        user.updated_at = now;
        state.revoke_sessions(user_id, None, now);
        state.revoke_tokens(user_id, None, now);
        Ok(true)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, new: NewSession, now: DateTime<Utc>) -> AppResult<Session> {
        let session = Session {
            id: new.id,
            user_id: new.user_id,
            handle_hash: new.handle_hash,
            ip_address: new.metadata.ip_address,
            user_agent: new.metadata.user_agent,
            created_at: now,
            expires_at: new.expires_at,
            last_seen_at: now,
            revoked_at: None,
        };
        self.state
            .lock()
            .await
            .sessions
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn touch_session(
        &self,
        handle_hash: &str,
        now: DateTime<Utc>,
        ttl: Duration,
        refresh: SessionRefresh,
    ) -> AppResult<Option<TouchedSession>> {
        let mut state = self.state.lock().await;

        let Some(session_id) = state
            .sessions
            .values()
            .find(|s| s.handle_hash == handle_hash && s.is_active_at(now))
            .map(|s| s.id)
        else {
            return Ok(None);
        };
        let Some(role) = state
            .sessions
            .get(&session_id)
            .and_then(|s| state.live_user(s.user_id))
            .map(|u| u.role)
        else {
            return Ok(None);
        };
        let Some(session) = state.sessions.get_mut(&session_id) else {
            return Ok(None);
        };

        session.last_seen_at = now;
        let mut refreshed = false;
        if let SessionRefresh::Sliding { window } = refresh {
            if session.expires_at - now < window {
                session.expires_at = now + ttl;
                refreshed = true;
            }
        }

        Ok(Some(TouchedSession {
            session: session.clone(),
            role,
            refreshed,
        }))
    }

    async fn find_session_by_hash(&self, handle_hash: &str) -> AppResult<Option<Session>> {
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .values()
            .find(|s| s.handle_hash == handle_hash)
            .cloned())
    }

    async fn revoke_session_by_hash(
        &self,
        handle_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state
            .sessions
            .values_mut()
            .find(|s| s.handle_hash == handle_hash && s.revoked_at.is_none())
        {
            Some(session) => {
                session.revoked_at = Some(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_session(&self, id: SessionId, now: DateTime<Utc>) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.sessions.get_mut(&id) {
            Some(session) if session.revoked_at.is_none() => {
                session.revoked_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_user_sessions(
        &self,
        user_id: UserId,
        except: Option<SessionId>,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        Ok(self.state.lock().await.revoke_sessions(user_id, except, now))
    }

    async fn purge_sessions(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let initial = state.sessions.len();
        state
            .sessions
            .retain(|_, s| s.expires_at > before && s.revoked_at.is_none_or(|at| at > before));
        Ok((initial - state.sessions.len()) as u64)
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn issue_token(&self, new: NewToken, now: DateTime<Utc>) -> AppResult<VerificationToken> {
        let mut state = self.state.lock().await;
        state.revoke_tokens(new.user_id, Some(new.purpose), now);

        let token = VerificationToken {
            id: new.id,
            token_hash: new.token_hash,
            purpose: new.purpose,
            user_id: new.user_id,
            payload: new.payload,
            created_at: now,
            expires_at: new.expires_at,
            consumed_at: None,
            revoked_at: None,
        };
        state.tokens.push(token.clone());
        Ok(token)
    }

    async fn consume_token(
        &self,
        token_hash: &str,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<ConsumeOutcome> {
        let mut state = self.state.lock().await;
        let Some(token) = state.tokens.iter_mut().find(|t| t.token_hash == token_hash) else {
            return Ok(ConsumeOutcome::Invalid);
        };

        if token.purpose != purpose || token.is_spent() {
            return Ok(ConsumeOutcome::Invalid);
        }
        if token.is_expired_at(now) {
            return Ok(ConsumeOutcome::Expired);
        }
        token.consumed_at = Some(now);
        Ok(ConsumeOutcome::Consumed(token.clone()))
    }

    async fn revoke_user_tokens(
        &self,
        user_id: UserId,
        purpose: Option<TokenPurpose>,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        Ok(self.state.lock().await.revoke_tokens(user_id, purpose, now))
    }

    async fn count_active_tokens(
        &self,
        user_id: UserId,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let state = self.state.lock().await;
        Ok(state
            .tokens
            .iter()
            .filter(|t| {
                t.user_id == user_id && t.purpose == purpose && !t.is_spent() && !t.is_expired_at(now)
            })
            .count() as u64)
    }

    async fn purge_tokens(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let initial = state.tokens.len();
        state.tokens.retain(|t| {
            t.expires_at > before
                && t.consumed_at.is_none_or(|at| at > before)
                && t.revoked_at.is_none_or(|at| at > before)
        });
        Ok((initial - state.tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use standup_core::types::TokenId;
    use standup_entity::session::SessionMetadata;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: None,
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    fn new_token(user_id: UserId, hash: &str, purpose: TokenPurpose, expires_at: DateTime<Utc>) -> NewToken {
        NewToken {
            id: TokenId::new(),
            token_hash: hash.to_string(),
            purpose,
            user_id,
            payload: None,
            expires_at,
        }
    }

    fn new_session(user_id: UserId, hash: &str, expires_at: DateTime<Utc>) -> NewSession {
        NewSession {
            id: SessionId::new(),
            user_id,
            handle_hash: hash.to_string(),
            metadata: SessionMetadata::default(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@example.com")).await.unwrap();
        let err = store.create_user(new_user("a@example.com")).await.unwrap_err();
        assert!(err.is(standup_core::ErrorKind::EmailAlreadyRegistered));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_deleted_user_releases_email() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        assert!(store.soft_delete_user(user.id, Utc::now()).await.unwrap());
        assert!(store.find_user_by_email("a@example.com").await.unwrap().is_none());
        store.create_user(new_user("a@example.com")).await.unwrap();
    }

    #[tokio::test]
    async fn test_issue_supersedes_outstanding_token() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        let now = Utc::now();
        let later = now + Duration::hours(1);

        store
            .issue_token(new_token(user.id, "first", TokenPurpose::VerifyEmail, later), now)
            .await
            .unwrap();
        store
            .issue_token(new_token(user.id, "second", TokenPurpose::VerifyEmail, later), now)
            .await
            .unwrap();

        assert_eq!(
            store.count_active_tokens(user.id, TokenPurpose::VerifyEmail, now).await.unwrap(),
            1
        );
        assert!(matches!(
            store.consume_token("first", TokenPurpose::VerifyEmail, now).await.unwrap(),
            ConsumeOutcome::Invalid
        ));
        assert!(matches!(
            store.consume_token("second", TokenPurpose::VerifyEmail, now).await.unwrap(),
            ConsumeOutcome::Consumed(_)
        ));
    }

    #[tokio::test]
    async fn test_consume_distinguishes_expired_and_wrong_purpose() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        let now = Utc::now();

        store
            .issue_token(new_token(user.id, "reset", TokenPurpose::ResetPassword, now + Duration::minutes(5)), now)
            .await
            .unwrap();

        assert!(matches!(
            store.consume_token("reset", TokenPurpose::VerifyEmail, now).await.unwrap(),
            ConsumeOutcome::Invalid
        ));
        assert!(matches!(
            store
                .consume_token("reset", TokenPurpose::ResetPassword, now + Duration::minutes(6))
                .await
                .unwrap(),
            ConsumeOutcome::Expired
        ));
    }

    #[tokio::test]
    async fn test_touch_extends_only_inside_window() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        let now = Utc::now();
        let ttl = Duration::hours(10);
        let refresh = SessionRefresh::Sliding {
            window: Duration::hours(2),
        };
        let created = store
            .insert_session(new_session(user.id, "h", now + ttl), now)
            .await
            .unwrap();

        let early = store.touch_session("h", now + Duration::hours(1), ttl, refresh).await.unwrap().unwrap();
        assert_eq!(early.session.expires_at, created.expires_at);
        assert!(!early.refreshed);

        let late_at = now + Duration::hours(9);
        let late = store.touch_session("h", late_at, ttl, refresh).await.unwrap().unwrap();
        assert_eq!(late.session.expires_at, late_at + ttl);
        assert!(late.refreshed);
        assert_eq!(late.role, UserRole::Standard);
    }

    #[tokio::test]
    async fn test_touch_rejects_session_of_deleted_user() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        let now = Utc::now();
        store
            .insert_session(new_session(user.id, "h", now + Duration::hours(1)), now)
            .await
            .unwrap();

        store.soft_delete_user(user.id, now).await.unwrap();
        let touched = store
            .touch_session("h", now, Duration::hours(1), SessionRefresh::Fixed)
            .await
            .unwrap();
        assert!(touched.is_none());
    }

    #[tokio::test]
    async fn test_replace_credential_keeps_one_session() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        let now = Utc::now();
        let later = now + Duration::hours(1);
        let kept = store.insert_session(new_session(user.id, "keep", later), now).await.unwrap();
        store.insert_session(new_session(user.id, "drop", later), now).await.unwrap();

        let revoked = store
            .replace_credential(user.id, "$argon2id$new", Some(kept.id), now)
            .await
            .unwrap();
        assert_eq!(revoked, Some(1));

        let sessions = store.sessions_of(user.id).await;
        let active: Vec<_> = sessions.iter().filter(|s| s.revoked_at.is_none()).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_purge_respects_cutoff() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@example.com")).await.unwrap();
        let now = Utc::now();
        store
            .insert_session(new_session(user.id, "old", now - Duration::days(10)), now - Duration::days(11))
            .await
            .unwrap();
        store
            .insert_session(new_session(user.id, "recent", now - Duration::hours(1)), now - Duration::hours(2))
            .await
            .unwrap();

        let purged = store.purge_sessions(now - Duration::days(7)).await.unwrap();
        assert_eq!(purged, 1);
        assert!(store.find_session_by_hash("recent").await.unwrap().is_some());
    }
}
