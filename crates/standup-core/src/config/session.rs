//! Session lifetime and carrier configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{ConfigError, check_ceiling, check_lifetime, lifetime};

/// How a session's expiry behaves after sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Validation inside the refresh window pushes expiry to now + ttl.
    Sliding,
    /// Expiry is fixed at sign-in.
    Fixed,
}

impl std::fmt::Display for RefreshPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshPolicy::Sliding => write!(f, "sliding"),
            RefreshPolicy::Fixed => write!(f, "fixed"),
        }
    }
}

/// Session management configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Refresh policy. Required.
    pub policy: RefreshPolicy,
    /// Session lifetime in seconds. Required.
    pub ttl_seconds: u64,
    /// Remaining-lifetime threshold below which a sliding session is extended.
    /// Required for `sliding`, rejected for `fixed`.
    #[serde(default)]
    pub refresh_window_seconds: Option<u64>,
    /// Name of the cookie carrying the session handle.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Whether the session cookie is marked `Secure`.
    #[serde(default)]
    pub cookie_secure: bool,
    /// Interval for the expired session/token sweep in seconds. `0` disables it.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// How long expired or revoked rows are kept before the sweep deletes them.
    /// Until then a stale handle still reports `SessionExpired` rather than
    /// `SessionInvalid`.
    #[serde(default = "default_sweep_retention")]
    pub sweep_retention_seconds: u64,
}

/// Validated refresh behaviour handed to the session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRefresh {
    /// Extend to `now + ttl` when less than `window` remains.
    Sliding {
        /// Refresh window.
        window: Duration,
    },
    /// Never extend.
    Fixed,
}

impl SessionConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        check_lifetime("session.ttl_seconds", self.ttl_seconds)?;
        check_ceiling("session.sweep_interval_seconds", self.sweep_interval_seconds)?;
        check_ceiling("session.sweep_retention_seconds", self.sweep_retention_seconds)?;
        match (self.policy, self.refresh_window_seconds) {
            (RefreshPolicy::Sliding, None) => {
                return Err(ConfigError::missing("session.refresh_window_seconds"));
            }
            (RefreshPolicy::Sliding, Some(window)) if window == 0 || window >= self.ttl_seconds => {
                return Err(ConfigError::invalid(
                    "session.refresh_window_seconds",
                    "must be positive and shorter than ttl_seconds",
                ));
            }
            (RefreshPolicy::Fixed, Some(_)) => {
                return Err(ConfigError::invalid(
                    "session.refresh_window_seconds",
                    "only applies to the sliding policy",
                ));
            }
            _ => {}
        }
        if self.cookie_name.trim().is_empty() {
            return Err(ConfigError::invalid("session.cookie_name", "must not be empty"));
        }
        Ok(())
    }

    /// Session lifetime.
    pub fn ttl(&self) -> Duration {
        lifetime(self.ttl_seconds)
    }

    /// Grace period before spent rows are purged.
    pub fn sweep_retention(&self) -> Duration {
        lifetime(self.sweep_retention_seconds)
    }

    /// Refresh behaviour. Only meaningful after [`super::AppConfig::validate`].
    pub fn refresh(&self) -> SessionRefresh {
        match (self.policy, self.refresh_window_seconds) {
            (RefreshPolicy::Sliding, Some(window)) => SessionRefresh::Sliding {
                window: lifetime(window),
            },
            _ => SessionRefresh::Fixed,
        }
    }
}

fn default_cookie_name() -> String {
    "standup_session".to_string()
}

fn default_sweep_interval() -> u64 {
    3600
}

fn default_sweep_retention() -> u64 {
    7 * 24 * 3600
}
