//! Unified application error types for Standup.
//!
//! Every failure a caller can observe is one of the [`ErrorKind`] variants.
//! Store and transport failures carry their underlying cause as `source` for
//! logging, but only the kind and a generic message cross the RPC boundary.

use std::fmt;
use thiserror::Error;

/// Error categories visible to RPC callers.
///
/// The set is closed: the wire contract promises that `failure.kind` is
/// always one of these names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Input failed shape or schema validation, or the procedure is unknown.
    InvalidInput,
    /// The normalized email already belongs to a live account.
    EmailAlreadyRegistered,
    /// Sign-in failed. Deliberately identical for unknown email and wrong password.
    InvalidCredentials,
    /// Verification token not found, consumed, revoked, or used for the wrong purpose.
    TokenInvalid,
    /// Verification token exists but its expiry has passed.
    TokenExpired,
    /// Session handle unknown, revoked, or owned by a deleted user.
    SessionInvalid,
    /// Session handle exists but its expiry has passed.
    SessionExpired,
    /// The procedure requires an identity and the request has none.
    Unauthorized,
    /// The identity's role is too low for the procedure.
    Forbidden,
    /// The persistent store (or another infrastructure dependency) failed or timed out.
    StoreUnavailable,
    /// The mail transport rejected or failed to deliver a message.
    MailDispatchFailed,
}

impl ErrorKind {
    /// Return the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "InvalidInput",
            Self::EmailAlreadyRegistered => "EmailAlreadyRegistered",
            Self::InvalidCredentials => "InvalidCredentials",
            Self::TokenInvalid => "TokenInvalid",
            Self::TokenExpired => "TokenExpired",
            Self::SessionInvalid => "SessionInvalid",
            Self::SessionExpired => "SessionExpired",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::StoreUnavailable => "StoreUnavailable",
            Self::MailDispatchFailed => "MailDispatchFailed",
        }
    }

    /// Whether this kind describes an infrastructure failure rather than a
    /// caller mistake. Messages of these kinds are never sent to callers.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::StoreUnavailable | Self::MailDispatchFailed)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unified application error used throughout Standup.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    /// Create an email-already-registered error.
    pub fn email_already_registered() -> Self {
        Self::new(
            ErrorKind::EmailAlreadyRegistered,
            "An account with this email already exists",
        )
    }

    /// Create the enumeration-safe sign-in failure.
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::InvalidCredentials, "Invalid email or password")
    }

    /// Create a token-invalid error.
    pub fn token_invalid() -> Self {
        Self::new(ErrorKind::TokenInvalid, "Token is invalid")
    }

    /// Create a token-expired error.
    pub fn token_expired() -> Self {
        Self::new(ErrorKind::TokenExpired, "Token has expired")
    }

    /// Create a session-invalid error.
    pub fn session_invalid() -> Self {
        Self::new(ErrorKind::SessionInvalid, "Session is invalid")
    }

    /// Create a session-expired error.
    pub fn session_expired() -> Self {
        Self::new(ErrorKind::SessionExpired, "Session has expired")
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a store-unavailable error.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StoreUnavailable, message)
    }

    /// Create a store-unavailable error wrapping the driver failure.
    pub fn store(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::with_source(ErrorKind::StoreUnavailable, message, source)
    }

    /// Create a mail-dispatch error.
    pub fn mail_dispatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MailDispatchFailed, message)
    }

    /// Check whether this error is of the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::InvalidInput,
            format!("Malformed JSON: {err}"),
            err,
        )
    }
}
