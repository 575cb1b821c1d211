//! Resend HTTP API transport.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use standup_core::config::{ConfigError, MailConfig};
use standup_core::error::{AppError, ErrorKind};
use standup_core::result::AppResult;

use super::{MailMessage, Mailer};

/// Delivers mail through the Resend `POST /emails` endpoint.
#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

impl ResendMailer {
    /// Creates a Resend transport from configuration.
    pub fn new(config: &MailConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| ConfigError::missing("mail.api_key"))?;
        let from = config
            .from
            .clone()
            .ok_or_else(|| ConfigError::missing("mail.from"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("standup/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::invalid("mail", e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            from,
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: &MailMessage) -> AppResult<()> {
        let body = SendEmailRequest {
            from: &self.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::MailDispatchFailed, "Mail transport unreachable", e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::mail_dispatch(format!(
                "Mail transport rejected message: {status} {detail}"
            )));
        }

        debug!(status = %status, "Mail accepted by transport");
        Ok(())
    }
}
