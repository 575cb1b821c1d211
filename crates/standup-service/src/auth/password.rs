//! Password reset and change.

use tracing::{debug, info};

use standup_auth::credential::parse_email;
use standup_core::result::AppResult;
use standup_core::types::{SessionId, UserId};
use standup_entity::token::TokenPurpose;

use super::Authenticator;

impl Authenticator {
    /// Starts a password reset.
    ///
    /// Returns `Ok` for malformed and unknown addresses, and when the mail
    /// cannot be delivered, so callers learn nothing about the account. The
    /// mail goes out on a background task so the response time does not
    /// depend on the transport.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        let Ok(email) = parse_email(email) else {
            return Ok(());
        };
        let Some(user) = self.credentials.find_by_email(&email).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let issued = self
            .tokens
            .issue_for(TokenPurpose::ResetPassword, user.id, None)
            .await?;
        self.mail
            .spawn_link(TokenPurpose::ResetPassword, user.email.clone(), issued.value);

        info!(user_id = %user.id, "Password reset requested");
        Ok(())
    }

    /// Redeems a reset token and sets a new password.
    ///
    /// The password is checked before the token is consumed so a rejected
    /// password leaves the link usable. Every session of the user is revoked.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        self.credentials.validator().validate(new_password)?;

        let redemption = self
            .tokens
            .redeem(token, TokenPurpose::ResetPassword)
            .await?;
        let revoked = self
            .credentials
            .replace_credential(redemption.user_id, new_password, None)
            .await?;

        info!(user_id = %redemption.user_id, revoked_sessions = revoked, "Password reset");
        Ok(())
    }

    /// Changes the password of an authenticated user.
    ///
    /// The current password must verify. Every other session is revoked;
    /// `current_session` stays active.
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_session: SessionId,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self.user(user_id).await?;
        self.credentials
            .verify_password(&user.email, current_password)
            .await?;
        self.credentials
            .validator()
            .validate_not_same(current_password, new_password)?;

        let revoked = self
            .credentials
            .replace_credential(user_id, new_password, Some(current_session))
            .await?;

        info!(user_id = %user_id, revoked_sessions = revoked, "Password changed");
        Ok(())
    }
}
