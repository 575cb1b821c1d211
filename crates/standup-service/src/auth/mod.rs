//! Authentication flows.
//!
//! The [`Authenticator`] sequences the credential store, session manager,
//! token service, and mail dispatcher. Each flow is one method; none of them
//! holds a lock across steps, so atomicity comes from the store primitives
//! the auth layer calls.

mod account;
mod password;


use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use standup_auth::credential::parse_email;
use standup_auth::{CredentialStore, IssuedSession, SessionManager, TokenService};
use standup_core::error::AppError;
use standup_core::result::AppResult;
use standup_core::types::UserId;
use standup_entity::session::SessionMetadata;
use standup_entity::token::TokenPurpose;
use standup_entity::user::User;

use crate::mail::MailDispatcher;

/// Result of a sign-up.
#[derive(Debug, Clone, Serialize)]
pub struct SignUpOutcome {
    /// The created, unverified user.
    pub user: User,
    /// Whether the verification mail was accepted by the transport.
    pub verification_sent: bool,
}

/// Result of a sign-in.
#[derive(Debug, Clone)]
pub struct SignInOutcome {
    /// The authenticated user.
    pub user: User,
    /// The new session and its handle.
    pub session: IssuedSession,
}

/// Orchestrates sign-up, sign-in, sign-out, and credential-change flows.
#[derive(Debug, Clone)]
pub struct Authenticator {
    /// Users and credentials.
    credentials: Arc<CredentialStore>,
    /// Session lifecycle.
    sessions: Arc<SessionManager>,
    /// Verification tokens.
    tokens: Arc<TokenService>,
    /// Link mail.
    mail: MailDispatcher,
}

impl Authenticator {
    /// Creates a new authenticator.
    pub fn new(
        credentials: Arc<CredentialStore>,
        sessions: Arc<SessionManager>,
        tokens: Arc<TokenService>,
        mail: MailDispatcher,
    ) -> Self {
        Self {
            credentials,
            sessions,
            tokens,
            mail,
        }
    }

    /// The credential store.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// The session manager.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Registers a new user and mails the verification link.
    ///
    /// A mail failure leaves the unverified account in place and is reported
    /// through `verification_sent`.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> AppResult<SignUpOutcome> {
        let user = self.credentials.create(email, password, name).await?;
        let token = self.issue_verification(&user).await?;
        let verification_sent = self
            .mail
            .send_link(TokenPurpose::VerifyEmail, &user.email, &token)
            .await;

        info!(user_id = %user.id, verification_sent, "User signed up");
        Ok(SignUpOutcome {
            user,
            verification_sent,
        })
    }

    /// Re-sends the verification link.
    ///
    /// Always succeeds for malformed, unknown, and already verified
    /// addresses so the response never reveals which accounts exist. The
    /// mail is sent on a background task.
    pub async fn send_verification_email(&self, email: &str) -> AppResult<()> {
        let Ok(email) = parse_email(email) else {
            return Ok(());
        };
        match self.credentials.find_by_email(&email).await? {
            Some(user) if !user.email_verified => {
                let token = self.issue_verification(&user).await?;
                self.mail
                    .spawn_link(TokenPurpose::VerifyEmail, user.email, token);
            }
            _ => debug!("Verification resend skipped"),
        }
        Ok(())
    }

    /// Issues a verify-email token bound to the current address.
    async fn issue_verification(&self, user: &User) -> AppResult<String> {
        let issued = self
            .tokens
            .issue_for(TokenPurpose::VerifyEmail, user.id, Some(user.email.clone()))
            .await?;
        Ok(issued.value)
    }

    /// Redeems a verify-email token.
    ///
    /// The token only verifies the address it was issued for; if the user
    /// has since changed email it is `TokenInvalid`.
    pub async fn verify_email(&self, token: &str) -> AppResult<User> {
        let redemption = self.tokens.redeem(token, TokenPurpose::VerifyEmail).await?;
        let email = redemption.payload.ok_or_else(AppError::token_invalid)?;

        if !self
            .credentials
            .mark_email_verified(redemption.user_id, &email)
            .await?
        {
            return Err(AppError::token_invalid());
        }

        self.credentials
            .find_by_id(redemption.user_id)
            .await?
            .ok_or_else(AppError::token_invalid)
    }

    /// Checks credentials and opens a session.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
        metadata: SessionMetadata,
    ) -> AppResult<SignInOutcome> {
        let user = self.credentials.verify_password(email, password).await?;
        let session = self.sessions.create(user.id, metadata).await?;

        info!(user_id = %user.id, session_id = %session.session.id, "User signed in");
        Ok(SignInOutcome { user, session })
    }

    /// Revokes the presented session only.
    pub async fn sign_out(&self, handle: &str) -> AppResult<()> {
        if !self.sessions.revoke(handle).await? {
            debug!("Sign-out for a session that was not active");
        }
        Ok(())
    }

    /// Revokes every session of a user, including the caller's.
    pub async fn revoke_sessions(&self, user_id: UserId) -> AppResult<u64> {
        self.sessions.revoke_all_for_user(user_id).await
    }

    /// Loads a live user.
    pub async fn user(&self, user_id: UserId) -> AppResult<User> {
        self.credentials
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::invalid_input("User not found"))
    }
}
