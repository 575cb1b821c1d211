//! Per-request context resolution.
//!
//! The builder resolves the session handle carried by a request into an
//! immutable [`RequestContext`]. A handle that is unknown, revoked, or
//! expired degrades the call to anonymous; only a store failure fails it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use standup_auth::SessionManager;
use standup_core::error::{AppError, ErrorKind};
use standup_core::result::AppResult;
use standup_core::types::{SessionId, UserId};
use standup_entity::session::SessionMetadata;
use standup_entity::user::UserRole;

/// Who is calling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// No session, or one that did not validate.
    Anonymous,
    /// A validated session.
    Authenticated {
        /// Owning user.
        user_id: UserId,
        /// The user's role at validation time.
        role: UserRole,
        /// The validated session.
        session_id: SessionId,
    },
}

impl Identity {
    /// Whether a session was resolved.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Immutable per-call context handed to every procedure.
#[derive(Debug, Clone)]
pub struct RequestContext {
    identity: Identity,
    session_handle: Option<String>,
    requested_at: DateTime<Utc>,
    refreshed_until: Option<DateTime<Utc>>,
    metadata: SessionMetadata,
}

impl RequestContext {
    /// An anonymous context.
    pub fn anonymous(metadata: SessionMetadata) -> Self {
        Self {
            identity: Identity::Anonymous,
            session_handle: None,
            requested_at: Utc::now(),
            refreshed_until: None,
            metadata,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_identity(identity: Identity) -> Self {
        Self {
            identity,
            ..Self::anonymous(SessionMetadata::default())
        }
    }

    /// The resolved identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The handle that resolved to the identity, if any.
    pub fn session_handle(&self) -> Option<&str> {
        self.session_handle.as_deref()
    }

    /// When the request was received.
    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    /// New expiry when validation slid the session forward.
    pub fn refreshed_until(&self) -> Option<DateTime<Utc>> {
        self.refreshed_until
    }

    /// Client address and user agent.
    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    /// The signed-in user and session, or `Unauthorized`.
    pub fn caller(&self) -> AppResult<(UserId, SessionId)> {
        match self.identity {
            Identity::Authenticated {
                user_id,
                session_id,
                ..
            } => Ok((user_id, session_id)),
            Identity::Anonymous => Err(AppError::unauthorized("Authentication required")),
        }
    }
}

/// Builds request contexts from session handles.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    sessions: Arc<SessionManager>,
}

impl ContextBuilder {
    /// Creates a builder over the session manager.
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self { sessions }
    }

    /// Resolve an optional handle into a context.
    pub async fn build(
        &self,
        handle: Option<&str>,
        metadata: SessionMetadata,
    ) -> AppResult<RequestContext> {
        let Some(handle) = handle.map(str::trim).filter(|h| !h.is_empty()) else {
            return Ok(RequestContext::anonymous(metadata));
        };

        match self.sessions.validate(handle).await {
            Ok(validated) => Ok(RequestContext {
                identity: Identity::Authenticated {
                    user_id: validated.user_id,
                    role: validated.role,
                    session_id: validated.session_id,
                },
                session_handle: Some(handle.to_string()),
                requested_at: Utc::now(),
                refreshed_until: validated.refreshed.then_some(validated.expires_at),
                metadata,
            }),
            Err(e) if matches!(e.kind, ErrorKind::SessionInvalid | ErrorKind::SessionExpired) => {
                debug!(kind = %e.kind, "Session did not validate; continuing anonymously");
                Ok(RequestContext::anonymous(metadata))
            }
            Err(e) => Err(e),
        }
    }
}
