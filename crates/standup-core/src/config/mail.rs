//! Mail transport configuration.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Which transport delivers outbound mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    /// Resend HTTP API.
    Resend,
    /// Write messages to the log instead of sending them.
    Log,
}

/// Outbound mail configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Transport. Required.
    pub provider: MailProvider,
    /// API key for the `resend` provider.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sender address, e.g. `Standup App <standup@example.com>`.
    #[serde(default)]
    pub from: Option<String>,
    /// Resend API endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Deadline for one send in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl MailConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.provider == MailProvider::Resend {
            if self.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
                return Err(ConfigError::missing("mail.api_key"));
            }
            if self.from.as_deref().is_none_or(|f| f.trim().is_empty()) {
                return Err(ConfigError::missing("mail.from"));
            }
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::invalid("mail.timeout_seconds", "must be positive"));
        }
        Ok(())
    }
}

fn default_endpoint() -> String {
    "https://api.resend.com/emails".to_string()
}

fn default_timeout() -> u64 {
    10
}
