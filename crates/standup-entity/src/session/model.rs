//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use standup_core::types::{SessionId, UserId};

use crate::user::UserRole;

/// An authenticated session.
///
/// The opaque handle held by the client is never stored; only its SHA-256
/// digest is. Sessions are created on sign-in and end on sign-out, expiry,
/// credential change, or account deletion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session identifier.
    pub id: SessionId,
    /// The user this session belongs to.
    pub user_id: UserId,
    /// Hex SHA-256 digest of the session handle.
    #[serde(skip_serializing)]
    pub handle_hash: String,
    /// Client IP address, when known.
    pub ip_address: Option<String>,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session stops being valid.
    pub expires_at: DateTime<Utc>,
    /// When the session was last presented.
    pub last_seen_at: DateTime<Utc>,
    /// When the session was revoked, if it was.
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Lifecycle state of a session at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Usable.
    Active,
    /// Past its expiry.
    Expired,
    /// Explicitly ended.
    Revoked,
}

impl Session {
    /// Compute the state of this session at `now`.
    ///
    /// Revocation wins over expiry.
    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        if self.revoked_at.is_some() {
            SessionState::Revoked
        } else if self.expires_at <= now {
            SessionState::Expired
        } else {
            SessionState::Active
        }
    }

    /// Check if the session is usable at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.state_at(now) == SessionState::Active
    }
}

/// A session row returned by a successful touch, joined with its owner's
/// current role.
#[derive(Debug, Clone, FromRow)]
pub struct TouchedSession {
    /// The session row after any refresh was applied.
    #[sqlx(flatten)]
    pub session: Session,
    /// The owner's role at validation time.
    pub role: UserRole,
    /// Whether this touch moved the expiry.
    pub refreshed: bool,
}

/// Client details captured at sign-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Client IP address.
    pub ip_address: Option<String>,
    /// User-Agent header value.
    pub user_agent: Option<String>,
}

/// Data required to insert a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// Session identifier.
    pub id: SessionId,
    /// Owning user.
    pub user_id: UserId,
    /// Hex SHA-256 digest of the handle.
    pub handle_hash: String,
    /// Client details.
    pub metadata: SessionMetadata,
    /// Initial expiry.
    pub expires_at: DateTime<Utc>,
}
