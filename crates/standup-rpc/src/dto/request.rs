//! Procedure inputs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use standup_core::types::UserId;
use standup_entity::user::UserRole;

/// `auth.signUp` input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpInput {
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Display name.
    #[validate(length(max = 100))]
    pub name: Option<String>,
}

/// `auth.signIn` input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignInInput {
    /// Email address.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Input naming an email address. Not format-checked: the procedures that
/// take it answer identically for any address.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmailInput {
    /// Email address.
    pub email: String,
}

/// Input carrying a verification token.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TokenInput {
    /// Token from the mailed link.
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

/// `auth.resetPassword` input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordInput {
    /// Token from the reset link.
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    /// New password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub new_password: String,
}

/// `auth.changePassword` input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    /// Current password.
    #[validate(length(min = 1))]
    pub current_password: String,
    /// New password.
    #[validate(length(min = 1))]
    pub new_password: String,
}

/// `auth.changeEmail` input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEmailInput {
    /// New email address.
    #[validate(email(message = "Invalid email address"))]
    pub new_email: String,
}

/// `user.updateProfile` input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    /// New display name; `null` or blank clears it.
    #[validate(length(max = 100))]
    pub name: Option<String>,
}

/// Admin input naming a user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserIdInput {
    /// Target user.
    pub user_id: UserId,
}

/// `admin.setRole` input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetRoleInput {
    /// Target user.
    pub user_id: UserId,
    /// New role.
    pub role: UserRole,
}
