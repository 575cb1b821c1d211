//! Procedure access levels.

use serde::{Deserialize, Serialize};

use standup_core::error::AppError;
use standup_core::result::AppResult;
use standup_entity::user::UserRole;

use crate::context::Identity;

/// The minimum identity class a procedure requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Anyone, including anonymous callers.
    Public,
    /// Any signed-in user.
    Authenticated,
    /// Signed-in users with the admin role.
    Admin,
}

impl Capability {
    /// Check an identity against this capability.
    ///
    /// Anonymous callers get `Unauthorized` for anything but `Public`; a
    /// signed-in user below the admin role gets `Forbidden` for `Admin`.
    pub fn authorize(&self, identity: &Identity) -> AppResult<()> {
        match (self, identity) {
            (Self::Public, _) => Ok(()),
            (_, Identity::Anonymous) => Err(AppError::unauthorized("Authentication required")),
            (Self::Authenticated, Identity::Authenticated { .. }) => Ok(()),
            (Self::Admin, Identity::Authenticated { role, .. }) => {
                if role.has_at_least(&UserRole::Admin) {
                    Ok(())
                } else {
                    Err(AppError::forbidden("Administrator role required"))
                }
            }
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::Admin => write!(f, "admin"),
        }
    }
}
