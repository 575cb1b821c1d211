//! Token purpose enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a verification token authorizes.
///
/// A token redeemed for any purpose other than the one it was issued for is
/// treated as invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "token_purpose", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    /// Confirm ownership of the account email.
    VerifyEmail,
    /// Replace a forgotten password.
    ResetPassword,
    /// Confirm ownership of a new email address.
    ChangeEmail,
    /// Confirm account deletion.
    DeleteAccount,
}

impl TokenPurpose {
    /// All purposes, in declaration order.
    pub const ALL: [TokenPurpose; 4] = [
        Self::VerifyEmail,
        Self::ResetPassword,
        Self::ChangeEmail,
        Self::DeleteAccount,
    ];

    /// Return the purpose as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerifyEmail => "verify_email",
            Self::ResetPassword => "reset_password",
            Self::ChangeEmail => "change_email",
            Self::DeleteAccount => "delete_account",
        }
    }

    /// Path of the public page that redeems tokens of this purpose.
    pub fn link_path(&self) -> &'static str {
        match self {
            Self::VerifyEmail => "/verify-email",
            Self::ResetPassword => "/reset-password",
            Self::ChangeEmail => "/confirm-email-change",
            Self::DeleteAccount => "/confirm-account-deletion",
        }
    }
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_display() {
        for purpose in TokenPurpose::ALL {
            let json = serde_json::to_string(&purpose).unwrap();
            assert_eq!(json, format!("\"{purpose}\""));
        }
    }
}
