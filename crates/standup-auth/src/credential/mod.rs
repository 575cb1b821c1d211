//! User identity records and password credentials.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use validator::ValidateEmail;

use standup_core::error::AppError;
use standup_core::result::AppResult;
use standup_core::types::{SessionId, UserId};
use standup_database::store::UserStore;
use standup_entity::user::{NewUser, ProfileUpdate, User, UserRole};

use crate::password::{PasswordHasher, PasswordValidator};

/// Maximum accepted display name length in characters.
pub const MAX_NAME_LENGTH: usize = 100;

/// Normalize an email for lookup and uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalize an email and check its format.
pub fn parse_email(email: &str) -> AppResult<String> {
    let normalized = normalize_email(email);
    if !normalized.validate_email() {
        return Err(AppError::invalid_input("Invalid email address"));
    }
    Ok(normalized)
}

/// Trim a display name; blank names become `None`.
pub fn parse_name(name: Option<&str>) -> AppResult<Option<String>> {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::invalid_input(format!(
            "Name must be at most {MAX_NAME_LENGTH} characters long"
        )));
    }
    Ok(Some(name.to_string()))
}

/// Holds user records and their hashed credentials.
///
/// Argon2 work runs on the blocking pool so request tasks are not stalled.
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
    hasher: Arc<PasswordHasher>,
    validator: PasswordValidator,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("validator", &self.validator)
            .finish()
    }
}

impl CredentialStore {
    /// Creates a credential store.
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<PasswordHasher>,
        validator: PasswordValidator,
    ) -> Self {
        Self {
            users,
            hasher,
            validator,
        }
    }

    /// The password policy applied to new passwords.
    pub fn validator(&self) -> &PasswordValidator {
        &self.validator
    }

    async fn hash(&self, password: &str) -> AppResult<String> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| AppError::store_unavailable(format!("Hashing task failed: {e}")))?
    }

    async fn verify(&self, password: &str, hash: Option<String>) -> AppResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        tokio::task::spawn_blocking(move || match hash {
            Some(hash) => hasher.verify_password(&password, &hash),
            None => hasher.verify_dummy(&password),
        })
        .await
        .map_err(|e| AppError::store_unavailable(format!("Verification task failed: {e}")))?
    }

    /// Creates a user and its credential.
    ///
    /// 1. Normalize and check the email
    /// 2. Enforce the password policy
    /// 3. Hash with Argon2id
    /// 4. Insert user and credential in one store operation
    pub async fn create(&self, email: &str, password: &str, name: Option<&str>) -> AppResult<User> {
        let email = parse_email(email)?;
        let name = parse_name(name)?;
        self.validator.validate(password)?;

        let password_hash = self.hash(password).await?;
        let user = self
            .users
            .create_user(NewUser {
                email,
                name,
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// Checks an email and password pair.
    ///
    /// Unknown emails and wrong passwords both yield `InvalidCredentials`,
    /// and both run one Argon2 verification.
    pub async fn verify_password(&self, email: &str, password: &str) -> AppResult<User> {
        let email = normalize_email(email);
        let user = self.users.find_user_by_email(&email).await?;

        let hash = match &user {
            Some(user) => self
                .users
                .find_credential(user.id)
                .await?
                .map(|c| c.password_hash),
            None => None,
        };

        let matched = self.verify(password, hash).await?;
        match user {
            Some(user) if matched => Ok(user),
            _ => {
                warn!("Failed sign-in attempt");
                Err(AppError::invalid_credentials())
            }
        }
    }

    /// Replaces the credential of a user and revokes its sessions, keeping
    /// `keep_session` when given. Returns the number of revoked sessions.
    pub async fn replace_credential(
        &self,
        user_id: UserId,
        new_password: &str,
        keep_session: Option<SessionId>,
    ) -> AppResult<u64> {
        self.validator.validate(new_password)?;
        let password_hash = self.hash(new_password).await?;

        let revoked = self
            .users
            .replace_credential(user_id, &password_hash, keep_session, Utc::now())
            .await?
            .ok_or_else(user_not_found)?;

        info!(user_id = %user_id, revoked_sessions = revoked, "Credential replaced");
        Ok(revoked)
    }

    /// Marks the email of a user verified if it still equals `email`.
    pub async fn mark_email_verified(&self, user_id: UserId, email: &str) -> AppResult<bool> {
        let verified = self.users.mark_email_verified(user_id, email).await?;
        if verified {
            info!(user_id = %user_id, "Email verified");
        }
        Ok(verified)
    }

    /// Changes the email of a user and marks it verified.
    pub async fn update_email(&self, user_id: UserId, new_email: &str) -> AppResult<User> {
        let email = parse_email(new_email)?;
        let user = self
            .users
            .update_email(user_id, &email)
            .await?
            .ok_or_else(user_not_found)?;
        info!(user_id = %user_id, "Email changed");
        Ok(user)
    }

    /// Changes the display name of a user.
    pub async fn update_profile(&self, user_id: UserId, name: Option<&str>) -> AppResult<User> {
        let update = ProfileUpdate {
            name: Some(parse_name(name)?),
        };
        self.users
            .update_profile(user_id, &update)
            .await?
            .ok_or_else(user_not_found)
    }

    /// Changes the role of a user.
    pub async fn set_role(&self, user_id: UserId, role: UserRole) -> AppResult<User> {
        let user = self
            .users
            .set_role(user_id, role)
            .await?
            .ok_or_else(user_not_found)?;
        info!(user_id = %user_id, role = %role, "User role changed");
        Ok(user)
    }

    /// Soft-deletes a user, revoking its sessions and outstanding tokens.
    pub async fn soft_delete(&self, user_id: UserId) -> AppResult<()> {
        if !self.users.soft_delete_user(user_id, Utc::now()).await? {
            return Err(user_not_found());
        }
        info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    /// Finds a live user by ID.
    pub async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>> {
        self.users.find_user_by_id(user_id).await
    }

    /// Finds a live user by email, normalizing it first.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.users.find_user_by_email(&normalize_email(email)).await
    }
}

fn user_not_found() -> AppError {
    AppError::invalid_input("User not found")
}
