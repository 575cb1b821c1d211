//! Development transport that logs messages instead of sending them.

use async_trait::async_trait;
use tracing::info;

use standup_core::result::AppResult;

use super::{MailMessage, Mailer};

/// Local dev mailer that logs the message instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &MailMessage) -> AppResult<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            html = %message.html,
            "Mail send stub"
        );
        Ok(())
    }
}
