//! Sends token links for the auth flows.
//!
//! Delivery failures are logged and reported as `false`; they never fail the
//! flow that triggered them. Flows whose response must not depend on the
//! recipient hand the send to a background task with [`MailDispatcher::spawn_link`].

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use standup_core::config::ApplicationConfig;
use standup_entity::token::TokenPurpose;

use super::templates;
use super::{MailMessage, Mailer};

/// Renders and delivers token links.
#[derive(Clone)]
pub struct MailDispatcher {
    mailer: Arc<dyn Mailer>,
    app: ApplicationConfig,
    timeout: Duration,
}

impl std::fmt::Debug for MailDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailDispatcher")
            .field("base_url", &self.app.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl MailDispatcher {
    /// Creates a dispatcher over a transport.
    pub fn new(mailer: Arc<dyn Mailer>, app: ApplicationConfig, timeout: Duration) -> Self {
        Self {
            mailer,
            app,
            timeout,
        }
    }

    /// Public URL that redeems `token` for `purpose`.
    pub fn link(&self, purpose: TokenPurpose, token: &str) -> String {
        self.app.link(purpose.link_path(), token)
    }

    /// Mails the link on a background task and returns at once.
    pub fn spawn_link(&self, purpose: TokenPurpose, to: String, token: String) -> JoinHandle<bool> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.send_link(purpose, &to, &token).await })
    }

    /// Mails the link for a token. Returns whether the transport accepted it.
    pub async fn send_link(&self, purpose: TokenPurpose, to: &str, token: &str) -> bool {
        let template = templates::for_purpose(purpose, &self.link(purpose, token));
        let message = MailMessage {
            to: to.to_string(),
            subject: template.subject,
            html: template.html,
        };

        match tokio::time::timeout(self.timeout, self.mailer.send(&message)).await {
            Ok(Ok(())) => {
                info!(purpose = %purpose, "Mail dispatched");
                true
            }
            Ok(Err(e)) => {
                warn!(purpose = %purpose, kind = %e.kind, error = %e, "Mail dispatch failed");
                false
            }
            Err(_) => {
                warn!(
                    purpose = %purpose,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Mail dispatch timed out"
                );
                false
            }
        }
    }
}
