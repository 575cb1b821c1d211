//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use standup_core::types::UserId;

use super::role::UserRole;

/// A registered user account.
///
/// `email` is always stored normalized (trimmed, lowercased). A user with
/// `deleted_at` set is invisible to every lookup and cannot authenticate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Normalized email address, unique among live users.
    pub email: String,
    /// Optional display name.
    pub name: Option<String>,
    /// Whether the email address has been confirmed.
    pub email_verified: bool,
    /// Account role.
    pub role: UserRole,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete timestamp.
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Check if the account has been deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Check if this user has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Data required to create a user together with its credential.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Normalized email address.
    pub email: String,
    /// Optional display name.
    pub name: Option<String>,
    /// PHC-encoded password hash.
    pub password_hash: String,
}

/// Mutable profile fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// New display name. `Some(None)` clears it.
    pub name: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            email: "ada@example.com".to_string(),
            name: Some("Ada".to_string()),
            email_verified: false,
            role: UserRole::Standard,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_deleted_flag() {
        let mut u = user();
        assert!(!u.is_deleted());
        u.deleted_at = Some(Utc::now());
        assert!(u.is_deleted());
    }

    #[test]
    fn test_serialization_hides_deleted_at() {
        let json = serde_json::to_value(user()).unwrap();
        assert!(json.get("deleted_at").is_none());
        assert_eq!(json["role"], "standard");
    }
}
