//! Procedure outputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use standup_core::types::{SessionId, UserId};
use standup_entity::user::{User, UserRole};

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// User ID.
    pub id: UserId,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: Option<String>,
    /// Whether the email is verified.
    pub email_verified: bool,
    /// Role.
    pub role: UserRole,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            email_verified: user.email_verified,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// `auth.signUp` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpResponse {
    /// The new user.
    pub user: UserResponse,
    /// Whether the verification mail went out.
    pub verification_sent: bool,
}

/// `auth.signIn` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    /// The signed-in user.
    pub user: UserResponse,
    /// Session handle for clients that send it as a bearer token.
    pub token: String,
    /// Session expiry.
    pub expires_at: DateTime<Utc>,
}

/// `auth.getSession` output when a session resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Current session.
    pub session_id: SessionId,
    /// Signed-in user.
    pub user: UserResponse,
}

/// Output of procedures that start a mailed confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailResponse {
    /// Whether the mail went out.
    pub mail_sent: bool,
}

/// Output of session revocation procedures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokedResponse {
    /// Number of sessions revoked.
    pub revoked: u64,
}

/// `auth.confirmAccountDeletion` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    /// The deleted user.
    pub user_id: UserId,
}
