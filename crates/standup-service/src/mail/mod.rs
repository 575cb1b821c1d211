//! Outbound mail: the transport abstraction, its implementations, message
//! templates, and the dispatcher used by the auth flows.

pub mod dispatcher;
pub mod log;
pub mod resend;
pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;

use standup_core::config::{ConfigError, MailConfig, MailProvider};
use standup_core::result::AppResult;

pub use dispatcher::MailDispatcher;
pub use log::LogMailer;
pub use resend::ResendMailer;
pub use templates::Template;

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

/// Mail delivery abstraction.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message, failing with `MailDispatchFailed` when the
    /// transport rejects it or cannot be reached.
    async fn send(&self, message: &MailMessage) -> AppResult<()>;
}

/// Build the configured transport.
pub fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, ConfigError> {
    Ok(match config.provider {
        MailProvider::Resend => Arc::new(ResendMailer::new(config)?),
        MailProvider::Log => Arc::new(LogMailer),
    })
}
