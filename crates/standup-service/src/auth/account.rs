//! Email change, account deletion, and profile updates.

use tracing::{debug, info};

use standup_auth::credential::parse_email;
use standup_core::error::AppError;
use standup_core::result::AppResult;
use standup_core::types::UserId;
use standup_entity::token::TokenPurpose;
use standup_entity::user::User;

use super::Authenticator;

impl Authenticator {
    /// Starts an email change by mailing a confirmation link to the new
    /// address.
    ///
    /// The outcome is the same whether or not the address already belongs
    /// to another account; a collision is reported when the link is
    /// redeemed. Only an address held by another account gets no mail.
    pub async fn change_email(&self, user_id: UserId, new_email: &str) -> AppResult<()> {
        let new_email = parse_email(new_email)?;
        let user = self.user(user_id).await?;

        if user.email == new_email {
            return Err(AppError::invalid_input(
                "New email must be different from the current email",
            ));
        }
        if self.credentials.find_by_email(&new_email).await?.is_some() {
            debug!(user_id = %user_id, "Email change requested for a registered address");
            return Ok(());
        }

        let issued = self
            .tokens
            .issue_for(TokenPurpose::ChangeEmail, user_id, Some(new_email.clone()))
            .await?;
        self.mail
            .spawn_link(TokenPurpose::ChangeEmail, new_email, issued.value);

        info!(user_id = %user_id, "Email change requested");
        Ok(())
    }

    /// Redeems a change-email token and applies the new address, which is
    /// verified by the act of redeeming.
    ///
    /// Fails with `EmailAlreadyRegistered` when the address was taken after
    /// the link was sent.
    pub async fn confirm_email_change(&self, token: &str) -> AppResult<User> {
        let redemption = self.tokens.redeem(token, TokenPurpose::ChangeEmail).await?;
        let new_email = redemption.payload.ok_or_else(AppError::token_invalid)?;

        self.credentials
            .update_email(redemption.user_id, &new_email)
            .await
    }

    /// Starts account deletion by mailing a confirmation link to the current
    /// address. Returns whether the mail was accepted.
    pub async fn delete_account(&self, user_id: UserId) -> AppResult<bool> {
        let user = self.user(user_id).await?;
        let issued = self
            .tokens
            .issue_for(TokenPurpose::DeleteAccount, user_id, None)
            .await?;
        let sent = self
            .mail
            .send_link(TokenPurpose::DeleteAccount, &user.email, &issued.value)
            .await;

        info!(user_id = %user_id, sent, "Account deletion requested");
        Ok(sent)
    }

    /// Redeems a delete-account token and soft-deletes the user.
    pub async fn confirm_account_deletion(&self, token: &str) -> AppResult<UserId> {
        let redemption = self
            .tokens
            .redeem(token, TokenPurpose::DeleteAccount)
            .await?;
        self.credentials.soft_delete(redemption.user_id).await?;
        Ok(redemption.user_id)
    }

    /// Changes the display name of a user.
    pub async fn update_profile(&self, user_id: UserId, name: Option<&str>) -> AppResult<User> {
        self.credentials.update_profile(user_id, name).await
    }
}
